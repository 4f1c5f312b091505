//! Interchange scene: bone hierarchy plus one keyed animation block
//!
//! A [`Scene`] is produced by [`assemble`] and handed to an exporter, which
//! owns it from then on.

mod assemble;

pub use assemble::assemble;

use glam::{Quat, Vec3};

/// How rotations are keyed in the exported tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationMode {
    /// Three angle channels (radians), for Euler-based formats
    Euler,
    /// Four component channels (x, y, z, w), for quaternion-based formats
    Quaternion,
}

/// Component animated by a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    PositionX,
    PositionY,
    PositionZ,
    ScaleX,
    ScaleY,
    ScaleZ,
    EulerX,
    EulerY,
    EulerZ,
    QuatX,
    QuatY,
    QuatZ,
    QuatW,
}

impl ChannelKind {
    pub const POSITION: [Self; 3] = [Self::PositionX, Self::PositionY, Self::PositionZ];
    pub const SCALE: [Self; 3] = [Self::ScaleX, Self::ScaleY, Self::ScaleZ];
    pub const EULER: [Self; 3] = [Self::EulerX, Self::EulerY, Self::EulerZ];
    pub const QUAT: [Self; 4] = [Self::QuatX, Self::QuatY, Self::QuatZ, Self::QuatW];

    pub fn name(self) -> &'static str {
        match self {
            Self::PositionX => "PositionX",
            Self::PositionY => "PositionY",
            Self::PositionZ => "PositionZ",
            Self::ScaleX => "ScaleX",
            Self::ScaleY => "ScaleY",
            Self::ScaleZ => "ScaleZ",
            Self::EulerX => "RotationEulerX",
            Self::EulerY => "RotationEulerY",
            Self::EulerZ => "RotationEulerZ",
            Self::QuatX => "QuatX",
            Self::QuatY => "QuatY",
            Self::QuatZ => "QuatZ",
            Self::QuatW => "QuatW",
        }
    }
}

/// A single key: value at a zero-based frame index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub frame: u32,
    pub value: f32,
}

/// Keys for one animated component, in frame order
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub kind: ChannelKind,
    pub keys: Vec<Keyframe>,
}

impl Channel {
    pub fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            keys: Vec::new(),
        }
    }

    pub fn insert_keyframe(&mut self, frame: u32, value: f32) {
        self.keys.push(Keyframe { frame, value });
    }

    pub fn value_at(&self, frame: u32) -> Option<f32> {
        self.keys.iter().find(|k| k.frame == frame).map(|k| k.value)
    }

    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.keys.iter().map(|k| k.value)
    }
}

/// All channels animating one bone
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelGroup {
    /// Index of the animated bone in the source skeleton
    pub bone_index: usize,
    pub bone_name: String,
    pub channels: Vec<Channel>,
}

impl ChannelGroup {
    pub fn channel(&self, kind: ChannelKind) -> Option<&Channel> {
        self.channels.iter().find(|c| c.kind == kind)
    }

    /// Frames keyed in this group (taken from the first channel)
    pub fn frames(&self) -> Vec<u32> {
        self.channels
            .first()
            .map(|c| c.keys.iter().map(|k| k.frame).collect())
            .unwrap_or_default()
    }
}

/// Named animation block spanning `start_frame..=end_frame`
#[derive(Debug, Clone, PartialEq)]
pub struct SceneAnimation {
    pub name: String,
    pub start_frame: u32,
    pub end_frame: u32,
    pub groups: Vec<ChannelGroup>,
}

impl SceneAnimation {
    pub fn frame_count(&self) -> u32 {
        self.end_frame - self.start_frame + 1
    }

    pub fn group(&self, bone_name: &str) -> Option<&ChannelGroup> {
        self.groups.iter().find(|g| g.bone_name == bone_name)
    }

    pub fn group_for_bone(&self, bone_index: usize) -> Option<&ChannelGroup> {
        self.groups.iter().find(|g| g.bone_index == bone_index)
    }
}

/// Bone in the exported hierarchy; owns its children
#[derive(Debug, Clone, PartialEq)]
pub struct SceneBone {
    /// Index of this bone in the source skeleton
    pub bone_index: usize,
    pub name: String,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub children: Vec<SceneBone>,
}

impl SceneBone {
    /// Visit this bone and its descendants depth-first, parents first.
    ///
    /// The callback receives the bone and the name of its parent.
    pub fn walk<'a>(
        &'a self,
        parent: Option<&'a str>,
        f: &mut impl FnMut(&'a SceneBone, Option<&'a str>),
    ) {
        f(self, parent);
        for child in &self.children {
            child.walk(Some(self.name.as_str()), f);
        }
    }

    /// Number of bones in this subtree, including this one
    pub fn subtree_len(&self) -> usize {
        let below: usize = self.children.iter().map(SceneBone::subtree_len).sum();
        1 + below
    }

    pub fn find(&self, name: &str) -> Option<&SceneBone> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    pub fn find_index(&self, index: usize) -> Option<&SceneBone> {
        if self.bone_index == index {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_index(index))
    }
}

/// Root bones of the exported skeleton
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneSkeleton {
    pub root_bones: Vec<SceneBone>,
}

/// Skeleton-only model with one animation block. Carries no mesh data.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub name: String,
    pub model_name: String,
    pub skeleton: SceneSkeleton,
    pub animation: SceneAnimation,
    pub rotation_mode: RotationMode,
}

impl Scene {
    pub fn bone_count(&self) -> usize {
        let roots = &self.skeleton.root_bones;
        roots.iter().map(SceneBone::subtree_len).sum()
    }

    pub fn find_bone(&self, name: &str) -> Option<&SceneBone> {
        self.skeleton.root_bones.iter().find_map(|b| b.find(name))
    }

    /// Bone by its index in the source skeleton
    pub fn bone_by_index(&self, index: usize) -> Option<&SceneBone> {
        self.skeleton
            .root_bones
            .iter()
            .find_map(|b| b.find_index(index))
    }
}
