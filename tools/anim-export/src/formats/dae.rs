//! COLLADA 1.4.1 writer
//!
//! Joint nodes carry `translate`, `rotateZ`, `rotateY`, `rotateX`, `scale`
//! elements. Every keyed channel becomes its own `<animation>` targeting one of
//! those elements by sid.

use anim_common::{Channel, ChannelKind, RotationMode, Scene, SceneBone, euler_channel_values};
use anyhow::{Context, Result, bail};
use hashbrown::{HashMap, HashSet};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use xmltree::{Element, EmitterConfig, XMLNode};

use super::{SceneExporter, sanitize_id};
use crate::config::ExportSettings;

const COLLADA_NS: &str = "http://www.collada.org/2005/11/COLLADASchema";

/// Writes `.dae` files
#[derive(Debug, Clone, Copy, Default)]
pub struct DaeExporter;

impl SceneExporter for DaeExporter {
    fn export(&self, scene: &Scene, output: &Path, settings: &ExportSettings) -> Result<()> {
        let collada = build_collada(scene, settings)?;

        let file = File::create(output)
            .with_context(|| format!("Failed to create output: {:?}", output))?;
        collada
            .write_with_config(
                BufWriter::new(file),
                EmitterConfig::new().perform_indent(true),
            )
            .with_context(|| format!("Failed to write COLLADA: {:?}", output))?;

        tracing::debug!("Wrote COLLADA {:?}: {} joints", output, scene.bone_count());
        Ok(())
    }
}

/// Build the COLLADA document for a scene
pub fn build_collada(scene: &Scene, settings: &ExportSettings) -> Result<Element> {
    if scene.rotation_mode != RotationMode::Euler {
        bail!("COLLADA export needs Euler rotation channels");
    }

    let mut collada = Element::new("COLLADA");
    set_attr(&mut collada, "xmlns", COLLADA_NS);
    set_attr(&mut collada, "version", "1.4.1");

    // Joints first: animation targets reference the ids they are given
    let scene_id = sanitize_id(&scene.name);
    let mut joint_ids = JointIds::reserving(&scene_id);
    let mut visual_scene = Element::new("visual_scene");
    set_attr(&mut visual_scene, "id", scene_id.as_str());
    set_attr(&mut visual_scene, "name", scene.name.as_str());
    for bone in &scene.skeleton.root_bones {
        push_child(&mut visual_scene, build_joint(bone, &mut joint_ids));
    }

    push_child(&mut collada, build_asset());

    if settings.export_animations && !scene.animation.groups.is_empty() {
        let library = build_animations(scene, &joint_ids, settings)?;
        push_child(&mut collada, library);
    }

    let mut library_visual_scenes = Element::new("library_visual_scenes");
    push_child(&mut library_visual_scenes, visual_scene);
    push_child(&mut collada, library_visual_scenes);

    let mut instance = Element::new("instance_visual_scene");
    set_attr(&mut instance, "url", format!("#{}", scene_id));
    let mut scene_elem = Element::new("scene");
    push_child(&mut scene_elem, instance);
    push_child(&mut collada, scene_elem);

    Ok(collada)
}

fn build_asset() -> Element {
    let mut asset = Element::new("asset");

    let mut contributor = Element::new("contributor");
    let tool = concat!("anim-export ", env!("CARGO_PKG_VERSION"));
    push_child(&mut contributor, text_element("authoring_tool", tool));
    push_child(&mut asset, contributor);

    let mut unit = Element::new("unit");
    set_attr(&mut unit, "name", "meter");
    set_attr(&mut unit, "meter", "1");
    push_child(&mut asset, unit);

    push_child(&mut asset, text_element("up_axis", "Y_UP"));
    asset
}

/// XML ids of the exported joints, keyed by skeleton bone index.
///
/// Bone names may repeat or sanitize to the same id, so an id that is
/// already taken gets a `-<bone index>` suffix.
#[derive(Debug, Default)]
struct JointIds {
    by_bone: HashMap<usize, String>,
    taken: HashSet<String>,
}

impl JointIds {
    /// Start with `reserved` (the visual scene id) already taken
    fn reserving(reserved: &str) -> Self {
        let mut ids = Self::default();
        ids.taken.insert(reserved.to_string());
        ids
    }

    fn assign(&mut self, bone: &SceneBone) -> String {
        let mut id = sanitize_id(&bone.name);
        while self.taken.contains(&id) {
            id = format!("{}-{}", id, bone.bone_index);
        }
        self.taken.insert(id.clone());
        self.by_bone.insert(bone.bone_index, id.clone());
        id
    }

    fn get(&self, bone_index: usize) -> Option<&str> {
        self.by_bone.get(&bone_index).map(String::as_str)
    }
}

/// Joint node for `bone` and its subtree.
///
/// Rest rotation uses the same channel labeling as the animated Euler
/// channels so frame 0 of an animation and the rest pose agree.
fn build_joint(bone: &SceneBone, ids: &mut JointIds) -> Element {
    let id = ids.assign(bone);
    let mut node = Element::new("node");
    set_attr(&mut node, "id", id.as_str());
    set_attr(&mut node, "name", bone.name.as_str());
    set_attr(&mut node, "sid", id);
    set_attr(&mut node, "type", "JOINT");

    let t = bone.translation;
    let translate = sid_element("translate", "translate", &join_floats(&[t.x, t.y, t.z]));
    push_child(&mut node, translate);

    // [EulerX, EulerY, EulerZ] channel values
    let [euler_x, euler_y, euler_z] = euler_channel_values(bone.rotation);
    for (sid, axis, angle) in [
        ("rotateZ", "0 0 1", euler_z),
        ("rotateY", "0 1 0", euler_y),
        ("rotateX", "1 0 0", euler_x),
    ] {
        let degrees = format_float(angle.to_degrees());
        let rotate = sid_element("rotate", sid, &format!("{} {}", axis, degrees));
        push_child(&mut node, rotate);
    }

    let s = bone.scale;
    let scale = sid_element("scale", "scale", &join_floats(&[s.x, s.y, s.z]));
    push_child(&mut node, scale);

    for child in &bone.children {
        push_child(&mut node, build_joint(child, ids));
    }
    node
}

fn build_animations(
    scene: &Scene,
    joint_ids: &JointIds,
    settings: &ExportSettings,
) -> Result<Element> {
    let mut clip = Element::new("animation");
    let clip_id = sanitize_id(&scene.animation.name);
    set_attr(&mut clip, "id", clip_id.as_str());
    set_attr(&mut clip, "name", scene.animation.name.as_str());

    for group in &scene.animation.groups {
        let Some(bone_id) = joint_ids.get(group.bone_index) else {
            tracing::warn!(
                "Bone {} ('{}') is not in the hierarchy, dropping its channels",
                group.bone_index,
                group.bone_name
            );
            continue;
        };
        for channel in &group.channels {
            let id = format!("{}-{}-{}", clip_id, bone_id, channel.kind.name());
            let target = channel_target(bone_id, channel.kind)?;
            let animation = build_channel_animation(&id, &target, channel, settings.frame_rate);
            push_child(&mut clip, animation);
        }
    }

    let mut library = Element::new("library_animations");
    push_child(&mut library, clip);
    Ok(library)
}

/// `<bone>/<sid>.<member>` for a channel
fn channel_target(bone_id: &str, kind: ChannelKind) -> Result<String> {
    let member = match kind {
        ChannelKind::PositionX => "translate.X",
        ChannelKind::PositionY => "translate.Y",
        ChannelKind::PositionZ => "translate.Z",
        ChannelKind::ScaleX => "scale.X",
        ChannelKind::ScaleY => "scale.Y",
        ChannelKind::ScaleZ => "scale.Z",
        ChannelKind::EulerX => "rotateX.ANGLE",
        ChannelKind::EulerY => "rotateY.ANGLE",
        ChannelKind::EulerZ => "rotateZ.ANGLE",
        ChannelKind::QuatX | ChannelKind::QuatY | ChannelKind::QuatZ | ChannelKind::QuatW => {
            bail!("COLLADA has no target for {} channels", kind.name())
        }
    };
    Ok(format!("{}/{}", bone_id, member))
}

fn build_channel_animation(id: &str, target: &str, channel: &Channel, frame_rate: f32) -> Element {
    let is_angle = ChannelKind::EULER.contains(&channel.kind);
    let times: Vec<f32> = channel
        .keys
        .iter()
        .map(|k| k.frame as f32 / frame_rate)
        .collect();
    let values: Vec<f32> = channel
        .values()
        .map(|v| if is_angle { v.to_degrees() } else { v })
        .collect();

    let input_id = format!("{}-input", id);
    let output_id = format!("{}-output", id);
    let interpolation_id = format!("{}-interpolation", id);
    let sampler_id = format!("{}-sampler", id);

    let mut animation = Element::new("animation");
    set_attr(&mut animation, "id", id);
    let input_source = build_source_float_array(&input_id, &times, "TIME");
    push_child(&mut animation, input_source);
    let param = if is_angle { "ANGLE" } else { "VALUE" };
    let output_source = build_source_float_array(&output_id, &values, param);
    push_child(&mut animation, output_source);
    let interpolations = vec!["LINEAR".to_string(); times.len()];
    let interpolation_source = build_source_name_array(&interpolation_id, &interpolations);
    push_child(&mut animation, interpolation_source);

    let mut sampler = Element::new("sampler");
    set_attr(&mut sampler, "id", sampler_id.as_str());
    for (semantic, source) in [
        ("INPUT", &input_id),
        ("OUTPUT", &output_id),
        ("INTERPOLATION", &interpolation_id),
    ] {
        let mut input = Element::new("input");
        set_attr(&mut input, "semantic", semantic);
        set_attr(&mut input, "source", format!("#{}", source));
        push_child(&mut sampler, input);
    }
    push_child(&mut animation, sampler);

    let mut channel_elem = Element::new("channel");
    set_attr(&mut channel_elem, "source", format!("#{}", sampler_id));
    set_attr(&mut channel_elem, "target", target);
    push_child(&mut animation, channel_elem);

    animation
}

fn build_source_float_array(id: &str, data: &[f32], param: &str) -> Element {
    let mut source = Element::new("source");
    set_attr(&mut source, "id", id);

    let mut float_array = Element::new("float_array");
    set_attr(&mut float_array, "id", format!("{}-array", id));
    set_attr(&mut float_array, "count", data.len().to_string());
    float_array.children.push(XMLNode::Text(join_floats(data)));
    push_child(&mut source, float_array);

    push_child(&mut source, build_technique(id, data.len(), param, "float"));
    source
}

fn build_source_name_array(id: &str, names: &[String]) -> Element {
    let mut source = Element::new("source");
    set_attr(&mut source, "id", id);

    let mut name_array = Element::new("Name_array");
    set_attr(&mut name_array, "id", format!("{}-array", id));
    set_attr(&mut name_array, "count", names.len().to_string());
    name_array.children.push(XMLNode::Text(names.join(" ")));
    push_child(&mut source, name_array);

    let technique = build_technique(id, names.len(), "INTERPOLATION", "name");
    push_child(&mut source, technique);
    source
}

/// `<technique_common>` with a stride-1 accessor over `<id>-array`
fn build_technique(id: &str, count: usize, param_name: &str, param_type: &str) -> Element {
    let mut accessor = Element::new("accessor");
    set_attr(&mut accessor, "source", format!("#{}-array", id));
    set_attr(&mut accessor, "count", count.to_string());
    set_attr(&mut accessor, "stride", "1");

    let mut param = Element::new("param");
    set_attr(&mut param, "name", param_name);
    set_attr(&mut param, "type", param_type);
    push_child(&mut accessor, param);

    let mut technique = Element::new("technique_common");
    push_child(&mut technique, accessor);
    technique
}

fn set_attr(element: &mut Element, name: &str, value: impl Into<String>) {
    element.attributes.insert(name.to_string(), value.into());
}

fn push_child(parent: &mut Element, child: Element) {
    parent.children.push(XMLNode::Element(child));
}

fn text_element(name: &str, text: &str) -> Element {
    let mut element = Element::new(name);
    element.children.push(XMLNode::Text(text.to_string()));
    element
}

fn sid_element(name: &str, sid: &str, text: &str) -> Element {
    let mut element = text_element(name, text);
    set_attr(&mut element, "sid", sid);
    element
}

fn join_floats(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| format_float(*v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shortest text that parses back to `v`; negative zero is written as `0`
fn format_float(v: f32) -> String {
    if v == 0.0 { "0".to_string() } else { v.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anim_common::{AnimationBinding, FrameTransform, Skeleton, TransformSampler, assemble};
    use glam::{Quat, Vec3};
    use std::f32::consts::FRAC_PI_2;

    fn scene(mode: RotationMode) -> Scene {
        let names = ["Root", "L Arm"].map(String::from);
        let pose = [
            FrameTransform::IDENTITY,
            FrameTransform::from_translation(Vec3::new(1.0, 0.0, 0.0)),
        ];
        let skeleton = Skeleton::build(&names, &pose, &[-1, 0]).unwrap();
        let track = vec![
            FrameTransform::IDENTITY,
            FrameTransform::new(Vec3::ZERO, Quat::from_rotation_z(FRAC_PI_2), Vec3::ONE),
        ];
        let sampler = TransformSampler::track_major(vec![track]);
        let binding = AnimationBinding::new(vec![1]);
        assemble(&skeleton, &binding, &sampler, mode, "Swing").unwrap()
    }

    fn build_default(mode: RotationMode) -> Result<Element> {
        build_collada(&scene(mode), &ExportSettings::default())
    }

    fn children<'a>(element: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> {
        element
            .children
            .iter()
            .filter_map(XMLNode::as_element)
            .filter(move |e| e.name == name)
    }

    fn clip(collada: &Element) -> &Element {
        collada
            .get_child("library_animations")
            .and_then(|l| l.get_child("animation"))
            .unwrap()
    }

    fn target(animation: &Element) -> &str {
        let channel = animation.get_child("channel").unwrap();
        &channel.attributes["target"]
    }

    #[test]
    fn test_joint_hierarchy() {
        let collada = build_default(RotationMode::Euler).unwrap();
        let visual_scene = collada
            .get_child("library_visual_scenes")
            .and_then(|l| l.get_child("visual_scene"))
            .unwrap();

        let root = visual_scene.get_child("node").unwrap();
        assert_eq!(root.attributes["name"], "Root");
        assert_eq!(root.attributes["type"], "JOINT");
        let arm = root.get_child("node").unwrap();
        assert_eq!(arm.attributes["id"], "L_Arm");
        assert_eq!(arm.attributes["name"], "L Arm");
        let translate = arm.get_child("translate").unwrap().get_text().unwrap();
        assert_eq!(translate, "1 0 0");
        assert_eq!(children(arm, "rotate").count(), 3);
    }

    #[test]
    fn test_one_animation_per_channel() {
        let collada = build_default(RotationMode::Euler).unwrap();
        let clip = clip(&collada);
        assert_eq!(clip.attributes["name"], "Swing");

        let targets: Vec<&str> = children(clip, "animation").map(target).collect();
        assert_eq!(targets.len(), 9);
        assert_eq!(targets[0], "L_Arm/translate.X");
        assert!(targets.contains(&"L_Arm/scale.Z"));
        assert!(targets.contains(&"L_Arm/rotateX.ANGLE"));
    }

    #[test]
    fn test_angles_in_degrees() {
        let collada = build_default(RotationMode::Euler).unwrap();

        // A Z rotation lands in the X-labelled channel
        let rotate_x = children(clip(&collada), "animation")
            .find(|a| target(a) == "L_Arm/rotateX.ANGLE")
            .unwrap();
        let output = children(rotate_x, "source").nth(1).unwrap();
        let text = output.get_child("float_array").unwrap().get_text().unwrap();
        let values: Vec<f32> = text.split(' ').map(|v| v.parse().unwrap()).collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], 0.0);
        assert!((values[1] - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_float_text_keeps_small_values() {
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(-0.0), "0");
        assert_eq!(format_float(1.0), "1");
        assert_eq!(format_float(-2.5), "-2.5");
        assert_eq!(format_float(1e-7).parse::<f32>().unwrap(), 1e-7);
        assert_eq!(join_floats(&[0.25, 0.0, 3.0e-5]), "0.25 0 0.00003");
    }

    #[test]
    fn test_colliding_joint_names_get_unique_ids() {
        // "L Hand" and "L_Hand" both sanitize to "L_Hand"
        let names = ["Root", "L Hand", "L_Hand"].map(String::from);
        let pose = [FrameTransform::IDENTITY; 3];
        let skeleton = Skeleton::build(&names, &pose, &[-1, 0, 0]).unwrap();
        let sampler = TransformSampler::track_major(vec![vec![FrameTransform::IDENTITY; 2]; 2]);
        let scene = assemble(
            &skeleton,
            &AnimationBinding::new(vec![1, 2]),
            &sampler,
            RotationMode::Euler,
            "Grip",
        )
        .unwrap();
        let collada = build_collada(&scene, &ExportSettings::default()).unwrap();

        let visual_scene = collada
            .get_child("library_visual_scenes")
            .and_then(|l| l.get_child("visual_scene"))
            .unwrap();
        let root = visual_scene.get_child("node").unwrap();
        let ids: Vec<&str> = children(root, "node")
            .map(|n| n.attributes["id"].as_str())
            .collect();
        assert_eq!(ids, ["L_Hand", "L_Hand-2"]);
        for node in children(root, "node") {
            assert_eq!(node.attributes["sid"], node.attributes["id"]);
        }

        let targets: Vec<&str> = children(clip(&collada), "animation").map(target).collect();
        assert_eq!(targets.len(), 18);
        assert_eq!(targets[0], "L_Hand/translate.X");
        assert_eq!(targets[9], "L_Hand-2/translate.X");

        let animation_ids: HashSet<&str> = children(clip(&collada), "animation")
            .map(|a| a.attributes["id"].as_str())
            .collect();
        assert_eq!(animation_ids.len(), 18);
    }

    #[test]
    fn test_skeleton_only() {
        let settings = ExportSettings {
            export_animations: false,
            ..ExportSettings::default()
        };
        let collada = build_collada(&scene(RotationMode::Euler), &settings).unwrap();
        assert!(collada.get_child("library_animations").is_none());
        assert!(collada.get_child("scene").is_some());
    }

    #[test]
    fn test_quaternion_scene_rejected() {
        assert!(build_default(RotationMode::Quaternion).is_err());
    }

    #[test]
    fn test_write_and_parse_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swing.dae");
        let scene = scene(RotationMode::Euler);
        DaeExporter
            .export(&scene, &path, &ExportSettings::default())
            .unwrap();

        let file = File::open(&path).unwrap();
        let parsed = Element::parse(file).unwrap();
        assert_eq!(parsed.name, "COLLADA");
        assert_eq!(parsed.attributes["version"], "1.4.1");
        assert!(parsed.get_child("library_visual_scenes").is_some());
    }
}
