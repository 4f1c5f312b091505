//! Batch conversion driver
//!
//! Converts one animation file, or every matching file under a directory,
//! against a single skeleton. A failing item is logged and recorded in the
//! [`BatchReport`]; the batch always moves on to the next item.

use std::path::{Path, PathBuf};

use anim_common::{ConvertError, Skeleton, assemble};
use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::config::ExportSettings;
use crate::decode::{DecodeError, ObjectDecoder, first_animation, first_binding, first_skeleton};
use crate::formats::ExportFormat;

/// Failure converting a single batch item
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("no animation object found")]
    MissingAnimation,

    #[error("no animation binding object found")]
    MissingBinding,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("conversion failed: {0}")]
    Convert(#[from] ConvertError),

    #[error("failed to create output directory {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("export failed: {0:#}")]
    Export(anyhow::Error),
}

/// How a batch writes its results
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub format: ExportFormat,
    pub settings: ExportSettings,
    /// Mirror input layout under this directory; `None` writes next to each input
    pub output_root: Option<PathBuf>,
}

/// Outcome of a batch, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Written output files
    pub converted: Vec<PathBuf>,
    /// Input files that were skipped, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.converted.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Animation files to convert.
///
/// A file path is returned as-is. A directory is searched recursively for
/// files whose extension matches `extension` (case-insensitive), sorted by
/// file name within each directory.
pub fn discover_animations(path: &Path, extension: &str) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    WalkDir::new(path)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Directory output paths are mirrored from: the input itself, or a file's parent
pub fn input_root(path: &Path) -> PathBuf {
    if path.is_file() {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        path.to_path_buf()
    }
}

/// Output file for `item`: `<output_root>/<item dir relative to input_root>/<stem>.<ext>`.
///
/// Without an output root the file lands next to the input.
pub fn output_path_for(
    item: &Path,
    input_root: &Path,
    output_root: Option<&Path>,
    format: ExportFormat,
) -> PathBuf {
    let item_dir = item.parent().unwrap_or(Path::new(""));
    let dir = match output_root {
        Some(root) => {
            let relative = item_dir.strip_prefix(input_root).unwrap_or(Path::new(""));
            if relative.as_os_str().is_empty() {
                root.to_path_buf()
            } else {
                root.join(relative)
            }
        }
        None => item_dir.to_path_buf(),
    };

    let stem = item
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("animation");
    dir.join(format!("{}.{}", stem, format.extension()))
}

/// Decode `path` and build the first skeleton found in it
pub fn load_skeleton(decoder: &dyn ObjectDecoder, path: &Path) -> Result<Skeleton> {
    let objects = decoder
        .decode(path)
        .with_context(|| format!("Failed to load skeleton: {:?}", path))?;
    let object = first_skeleton(&objects)
        .with_context(|| format!("No skeleton object found in {:?}", path))?;
    let skeleton = object
        .to_skeleton()
        .with_context(|| format!("Invalid skeleton in {:?}", path))?;

    tracing::info!(
        "Loaded skeleton {:?}: {} bones, root '{}'",
        path,
        skeleton.len(),
        skeleton.root().name
    );
    Ok(skeleton)
}

/// Convert one animation file. Returns the written output path.
pub fn process_item(
    skeleton: &Skeleton,
    item: &Path,
    input_root: &Path,
    options: &BatchOptions,
    decoder: &dyn ObjectDecoder,
) -> Result<PathBuf, ItemError> {
    let objs = decoder.decode(item)?;
    let animation = first_animation(&objs).ok_or(ItemError::MissingAnimation)?;
    let binding = first_binding(&objs).ok_or(ItemError::MissingBinding)?;

    let name = item
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("animation");
    tracing::debug!(
        "'{}': {} layout, {} bound tracks",
        name,
        animation.layout(),
        binding.transform_track_to_bone_indices.len()
    );

    let scene = assemble(
        skeleton,
        &binding.to_binding(),
        &animation.sampler(),
        options.format.rotation_mode(),
        name,
    )?;

    let output = output_path_for(
        item,
        input_root,
        options.output_root.as_deref(),
        options.format,
    );
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ItemError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    options
        .format
        .exporter()
        .export(&scene, &output, &options.settings)
        .map_err(ItemError::Export)?;

    Ok(output)
}

/// Convert every item in order. Never stops early on a per-item failure.
pub fn run_batch(
    skeleton: &Skeleton,
    items: &[PathBuf],
    input_root: &Path,
    options: &BatchOptions,
    decoder: &dyn ObjectDecoder,
) -> BatchReport {
    let mut report = BatchReport::default();

    for item in items {
        tracing::info!("Processing: {:?}", item);
        match process_item(skeleton, item, input_root, options, decoder) {
            Ok(output) => {
                tracing::info!("Exported: {:?}", output);
                report.converted.push(output);
            }
            Err(err) => {
                tracing::error!("Failed to convert {:?}: {}", item, err);
                report.failed.push((item.clone(), err.to_string()));
            }
        }
    }

    tracing::info!(
        "Batch complete: {} converted, {} failed ({} total, {} export)",
        report.converted.len(),
        report.failed.len(),
        report.total(),
        options.format
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::JsonObjectDecoder;
    use serde_json::json;
    use std::fs;

    fn identity() -> serde_json::Value {
        json!({ "translation": [0, 0, 0], "rotation": [0, 0, 0, 1] })
    }

    fn at(x: f32) -> serde_json::Value {
        json!({ "translation": [x, 0, 0], "rotation": [0, 0, 0, 1] })
    }

    fn write_skeleton(path: &Path) {
        let dump = json!({ "objects": [{
            "type": "skeleton",
            "bones": [{ "name": "Root" }, { "name": "Child" }],
            "parent_indices": [-1, 0],
            "reference_pose": [identity(), at(1.0)]
        }] });
        fs::write(path, dump.to_string()).unwrap();
    }

    fn write_animation(path: &Path, with_binding: bool) {
        let mut objects = vec![json!({
            "type": "animation",
            "duration": 0.1,
            "samples": { "track_major": [[at(1.0), at(2.0)]] }
        })];
        if with_binding {
            objects.push(json!({
                "type": "animation_binding",
                "transform_track_to_bone_indices": [1]
            }));
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).unwrap();
        }
        fs::write(path, json!({ "objects": objects }).to_string()).unwrap();
    }

    #[test]
    fn test_discover_sorted_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        write_animation(&dir.path().join("b.anmb"), true);
        write_animation(&dir.path().join("a.ANMB"), true);
        write_animation(&dir.path().join("sub/c.anmb"), true);
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let found = discover_animations(dir.path(), "anmb");
        let names: Vec<&str> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.ANMB", "b.anmb", "c.anmb"]);
    }

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walk.bin");
        write_animation(&path, true);
        assert_eq!(
            discover_animations(&path, "anmb"),
            std::slice::from_ref(&path)
        );
        assert_eq!(input_root(&path), dir.path());
    }

    #[test]
    fn test_output_path_mirrors_layout() {
        let input = Path::new("/in");
        let out = Path::new("/out");
        let item = Path::new("/in/chars/hero/walk.anmb");

        assert_eq!(
            output_path_for(item, input, Some(out), ExportFormat::Gltf),
            Path::new("/out/chars/hero/walk.gltf")
        );
        let idle = Path::new("/in/idle.anmb");
        assert_eq!(
            output_path_for(idle, input, Some(out), ExportFormat::Dae),
            Path::new("/out/idle.dae")
        );
        assert_eq!(
            output_path_for(item, input, None, ExportFormat::Dae),
            Path::new("/in/chars/hero/walk.dae")
        );
    }

    #[test]
    fn test_load_skeleton() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rig.json");
        write_skeleton(&path);

        let skeleton = load_skeleton(&JsonObjectDecoder, &path).unwrap();
        assert_eq!(skeleton.len(), 2);
        assert_eq!(skeleton.root().name, "Root");

        let anim = dir.path().join("walk.anmb");
        write_animation(&anim, true);
        let err = load_skeleton(&JsonObjectDecoder, &anim).unwrap_err();
        assert!(err.to_string().contains("No skeleton"));
    }

    #[test]
    fn test_batch_skips_bad_items() {
        let dir = tempfile::tempdir().unwrap();
        let rig = dir.path().join("rig.json");
        write_skeleton(&rig);
        let input = dir.path().join("anims");
        write_animation(&input.join("a_walk.anmb"), true);
        write_animation(&input.join("b_unbound.anmb"), false);
        write_animation(&input.join("deep/c_run.anmb"), true);
        fs::write(input.join("d_broken.anmb"), "{").unwrap();

        let skeleton = load_skeleton(&JsonObjectDecoder, &rig).unwrap();
        let items = discover_animations(&input, "anmb");
        assert_eq!(items.len(), 4);

        let options = BatchOptions {
            output_root: Some(dir.path().join("out")),
            ..BatchOptions::default()
        };
        let report = run_batch(&skeleton, &items, &input, &options, &JsonObjectDecoder);

        assert_eq!(report.total(), 4);
        assert_eq!(report.converted.len(), 2);
        assert!(!report.is_success());
        assert!(dir.path().join("out/a_walk.gltf").exists());
        assert!(dir.path().join("out/deep/c_run.gltf").exists());

        let failed: Vec<String> = report
            .failed
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(failed, ["b_unbound.anmb", "d_broken.anmb"]);
        assert!(report.failed[0].1.contains("binding"));
    }

    #[test]
    fn test_process_item_errors() {
        let dir = tempfile::tempdir().unwrap();
        let rig = dir.path().join("rig.json");
        write_skeleton(&rig);
        let skeleton = load_skeleton(&JsonObjectDecoder, &rig).unwrap();
        let options = BatchOptions::default();
        let decoder = &JsonObjectDecoder;

        // The skeleton file has neither animation nor binding
        let err = process_item(&skeleton, &rig, dir.path(), &options, decoder).unwrap_err();
        assert!(matches!(err, ItemError::MissingAnimation));

        // Binding points at a bone the skeleton doesn't have
        let bad = dir.path().join("bad.anmb");
        let dump = json!({ "objects": [
            { "type": "animation", "samples": { "track_major": [[at(0.0)]] } },
            { "type": "animation_binding", "transform_track_to_bone_indices": [7] }
        ] });
        fs::write(&bad, dump.to_string()).unwrap();
        let err = process_item(&skeleton, &bad, dir.path(), &options, decoder).unwrap_err();
        assert!(matches!(
            err,
            ItemError::Convert(ConvertError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_dae_written_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let rig = dir.path().join("rig.json");
        write_skeleton(&rig);
        let anim = dir.path().join("wave.anmb");
        write_animation(&anim, true);

        let skeleton = load_skeleton(&JsonObjectDecoder, &rig).unwrap();
        let options = BatchOptions {
            format: ExportFormat::Dae,
            ..BatchOptions::default()
        };
        let output =
            process_item(&skeleton, &anim, dir.path(), &options, &JsonObjectDecoder).unwrap();
        assert_eq!(output, dir.path().join("wave.dae"));
        assert!(output.exists());
    }
}
