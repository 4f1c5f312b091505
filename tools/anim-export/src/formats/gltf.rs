//! glTF 2.0 writer (.gltf with an embedded base64 buffer)
//!
//! Bones become nodes carrying their reference TRS. Each channel group becomes
//! translation / rotation / scale channels on the matching node, keyed at
//! `frame / frame_rate` seconds with linear interpolation.

use anim_common::{ChannelGroup, ChannelKind, Scene, SceneBone};
use anyhow::{Context, Result, bail};
use base64::Engine;
use gltf::json;
use hashbrown::HashMap;
use json::accessor::Type;
use json::animation::Property;
use json::validation::Checked::Valid;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use super::SceneExporter;
use crate::config::ExportSettings;

const GENERATOR: &str = concat!("anim-export ", env!("CARGO_PKG_VERSION"));

/// Writes `.gltf` files
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfExporter;

impl SceneExporter for GltfExporter {
    fn export(&self, scene: &Scene, output: &Path, settings: &ExportSettings) -> Result<()> {
        let root = build_gltf(scene, settings)?;

        let file = File::create(output)
            .with_context(|| format!("Failed to create output: {:?}", output))?;
        json::serialize::to_writer_pretty(BufWriter::new(file), &root)
            .with_context(|| format!("Failed to write glTF: {:?}", output))?;

        tracing::debug!(
            "Wrote glTF {:?}: {} nodes, {} accessors",
            output,
            root.nodes.len(),
            root.accessors.len()
        );
        Ok(())
    }
}

/// Build the glTF document for a scene
pub fn build_gltf(scene: &Scene, settings: &ExportSettings) -> Result<json::Root> {
    let mut nodes = Vec::with_capacity(scene.bone_count());
    let mut node_by_bone: HashMap<usize, u32> = HashMap::new();
    let root_nodes: Vec<u32> = scene
        .skeleton
        .root_bones
        .iter()
        .map(|bone| push_bone_node(bone, &mut nodes, &mut node_by_bone))
        .collect();

    let mut buffer = BufferBuilder::default();
    let mut animations = Vec::new();
    if settings.export_animations {
        let animation = build_animation(scene, settings, &node_by_bone, &mut buffer)?;
        animations.push(animation);
    }

    let skins = if settings.compatibility_mode && !root_nodes.is_empty() {
        vec![json::Skin {
            extensions: Default::default(),
            extras: Default::default(),
            inverse_bind_matrices: None,
            joints: (0..nodes.len() as u32).map(json::Index::new).collect(),
            name: Some(scene.model_name.clone()),
            skeleton: Some(json::Index::new(root_nodes[0])),
        }]
    } else {
        Vec::new()
    };

    let buffers = if buffer.data.is_empty() {
        Vec::new()
    } else {
        vec![json::Buffer {
            byte_length: buffer.data.len().into(),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            uri: Some(format!(
                "data:application/octet-stream;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(&buffer.data)
            )),
        }]
    };

    let scenes = vec![json::Scene {
        extensions: Default::default(),
        extras: Default::default(),
        name: Some(scene.name.clone()),
        nodes: root_nodes.into_iter().map(json::Index::new).collect(),
    }];

    Ok(json::Root {
        accessors: buffer.accessors,
        animations,
        asset: json::Asset {
            copyright: None,
            extensions: Default::default(),
            extras: Default::default(),
            generator: Some(GENERATOR.to_string()),
            min_version: None,
            version: "2.0".to_string(),
        },
        buffers,
        buffer_views: buffer.views,
        cameras: Vec::new(),
        extensions: Default::default(),
        extras: Default::default(),
        extensions_required: Vec::new(),
        extensions_used: Vec::new(),
        images: Vec::new(),
        materials: Vec::new(),
        meshes: Vec::new(),
        nodes,
        samplers: Vec::new(),
        scene: Some(json::Index::new(0)),
        scenes,
        skins,
        textures: Vec::new(),
    })
}

/// Push a node for `bone` and its subtree; returns the node index.
///
/// Nodes are recorded by skeleton bone index, since bone names need not be unique.
fn push_bone_node(
    bone: &SceneBone,
    nodes: &mut Vec<json::Node>,
    node_by_bone: &mut HashMap<usize, u32>,
) -> u32 {
    let index = nodes.len() as u32;
    node_by_bone.insert(bone.bone_index, index);
    nodes.push(json::Node {
        camera: None,
        children: None,
        extensions: Default::default(),
        extras: Default::default(),
        matrix: None,
        mesh: None,
        name: Some(bone.name.clone()),
        rotation: Some(json::scene::UnitQuaternion(bone.rotation.to_array())),
        scale: Some(bone.scale.to_array()),
        translation: Some(bone.translation.to_array()),
        skin: None,
        weights: None,
    });

    let children: Vec<json::Index<json::Node>> = bone
        .children
        .iter()
        .map(|child| json::Index::new(push_bone_node(child, nodes, node_by_bone)))
        .collect();
    if !children.is_empty() {
        nodes[index as usize].children = Some(children);
    }

    index
}

fn build_animation(
    scene: &Scene,
    settings: &ExportSettings,
    node_by_bone: &HashMap<usize, u32>,
    buffer: &mut BufferBuilder,
) -> Result<json::Animation> {
    let mut samplers = Vec::new();
    let mut channels = Vec::new();

    for group in &scene.animation.groups {
        let Some(&node) = node_by_bone.get(&group.bone_index) else {
            tracing::warn!(
                "Bone {} ('{}') is not in the hierarchy, dropping its channels",
                group.bone_index,
                group.bone_name
            );
            continue;
        };

        let times: Vec<f32> = group
            .frames()
            .into_iter()
            .map(|f| f as f32 / settings.frame_rate)
            .collect();
        if times.is_empty() {
            continue;
        }
        let input = buffer.push_times(&times);

        let translation = interleave(group, &ChannelKind::POSITION)?;
        let rotation = interleave(group, &ChannelKind::QUAT).with_context(|| {
            format!(
                "glTF export needs quaternion rotation channels (bone '{}')",
                group.bone_name
            )
        })?;
        let scale = interleave(group, &ChannelKind::SCALE)?;

        let tracks = [
            (translation, Type::Vec3, Property::Translation),
            (rotation, Type::Vec4, Property::Rotation),
            (scale, Type::Vec3, Property::Scale),
        ];
        for (values, type_, path) in tracks {
            let output = buffer.push_values(&values, type_);
            let sampler = samplers.len() as u32;
            samplers.push(json::animation::Sampler {
                input,
                interpolation: Valid(json::animation::Interpolation::Linear),
                output,
                extensions: Default::default(),
                extras: Default::default(),
            });
            channels.push(json::animation::Channel {
                sampler: json::Index::new(sampler),
                target: json::animation::Target {
                    node: json::Index::new(node),
                    path: Valid(path),
                    extensions: Default::default(),
                    extras: Default::default(),
                },
                extensions: Default::default(),
                extras: Default::default(),
            });
        }
    }

    Ok(json::Animation {
        channels,
        extensions: Default::default(),
        extras: Default::default(),
        name: Some(scene.animation.name.clone()),
        samplers,
    })
}

/// Interleave the keys of several channels: `[x0, y0, z0, x1, y1, z1, ...]`
fn interleave(group: &ChannelGroup, kinds: &[ChannelKind]) -> Result<Vec<f32>> {
    let mut columns = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let Some(channel) = group.channel(kind) else {
            bail!("bone '{}' has no {} channel", group.bone_name, kind.name());
        };
        columns.push(channel);
    }

    let key_count = columns.iter().map(|c| c.keys.len()).min().unwrap_or(0);
    let mut values = Vec::with_capacity(key_count * kinds.len());
    for key in 0..key_count {
        values.extend(columns.iter().map(|c| c.keys[key].value));
    }
    Ok(values)
}

/// Accumulates binary data, buffer views and accessors for buffer 0
#[derive(Default)]
struct BufferBuilder {
    data: Vec<u8>,
    views: Vec<json::buffer::View>,
    accessors: Vec<json::Accessor>,
}

impl BufferBuilder {
    /// Keyframe times; glTF requires min/max on animation inputs
    fn push_times(&mut self, times: &[f32]) -> json::Index<json::Accessor> {
        let min = times.iter().copied().fold(f32::INFINITY, f32::min);
        let max = times.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        self.push(
            times,
            times.len(),
            Type::Scalar,
            Some((vec![min], vec![max])),
        )
    }

    fn push_values(
        &mut self,
        values: &[f32],
        type_: Type,
    ) -> json::Index<json::Accessor> {
        let components = type_.multiplicity();
        self.push(values, values.len() / components, type_, None)
    }

    fn push(
        &mut self,
        values: &[f32],
        count: usize,
        type_: Type,
        bounds: Option<(Vec<f32>, Vec<f32>)>,
    ) -> json::Index<json::Accessor> {
        let offset = self.data.len();
        for v in values {
            self.data.extend_from_slice(&v.to_le_bytes());
        }
        let length = self.data.len() - offset;

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: length.into(),
            byte_offset: Some(offset.into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: None,
        });

        let (min, max) = match bounds {
            Some((min, max)) => (
                Some(json::Value::Array(min.into_iter().map(json::Value::from).collect())),
                Some(json::Value::Array(max.into_iter().map(json::Value::from).collect())),
            ),
            None => (None, None),
        };

        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(self.views.len() as u32 - 1)),
            byte_offset: Some(0u64.into()),
            count: count.into(),
            component_type: Valid(json::accessor::GenericComponentType(
                json::accessor::ComponentType::F32,
            )),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(type_),
            min,
            max,
            name: None,
            normalized: false,
            sparse: None,
        });

        json::Index::new(self.accessors.len() as u32 - 1)
    }
}
