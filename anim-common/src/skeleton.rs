//! Skeleton model: named bones, parent links and a normalized reference pose
//!
//! A skeleton is built once per conversion run and shared read-only by every
//! animation converted against it.

use glam::{Quat, Vec3};

use crate::error::{ConvertError, Result};
use crate::rotation::normalize_rotation;
use crate::transform::FrameTransform;

/// Parent index value marking a root bone
pub const NO_PARENT: i16 = -1;

/// A single bone with its reference pose
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Index of the parent bone, or [`NO_PARENT`]
    pub parent_index: i16,
    pub reference_translation: Vec3,
    /// Unit quaternion (normalized at build time)
    pub reference_rotation: Quat,
    /// Always one: reference poses never carry scale
    pub reference_scale: Vec3,
}

impl Bone {
    /// Parent bone index, `None` for a root
    pub fn parent(&self) -> Option<usize> {
        usize::try_from(self.parent_index).ok()
    }

    pub fn is_root(&self) -> bool {
        self.parent_index == NO_PARENT
    }
}

/// Immutable bone hierarchy
#[derive(Debug, Clone)]
pub struct Skeleton {
    bones: Vec<Bone>,
    /// Children of each bone, in bone order
    children: Vec<Vec<usize>>,
    /// First bone with no parent
    root: usize,
}

impl Skeleton {
    /// Build a skeleton from decoded bone names, reference pose and parent indices.
    ///
    /// All three inputs are aligned by bone index.
    pub fn build(
        names: &[String],
        reference_pose: &[FrameTransform],
        parent_indices: &[i16],
    ) -> Result<Self> {
        let bone_count = names.len();
        if parent_indices.len() != bone_count {
            return Err(ConvertError::MalformedSkeleton(format!(
                "{} bones but {} parent indices",
                bone_count,
                parent_indices.len()
            )));
        }
        if reference_pose.len() != bone_count {
            return Err(ConvertError::MalformedSkeleton(format!(
                "{} bones but {} reference pose entries",
                bone_count,
                reference_pose.len()
            )));
        }

        for (i, &parent) in parent_indices.iter().enumerate() {
            if parent == NO_PARENT {
                continue;
            }
            if parent < NO_PARENT || parent as usize >= bone_count {
                return Err(ConvertError::MalformedSkeleton(format!(
                    "bone {} ('{}') has parent index {} outside 0..{}",
                    i, names[i], parent, bone_count
                )));
            }
        }

        let root = parent_indices
            .iter()
            .position(|&p| p == NO_PARENT)
            .ok_or(ConvertError::NoRootBone)?;

        check_acyclic(names, parent_indices)?;

        let mut bones = Vec::with_capacity(bone_count);
        for ((name, pose), &parent) in names.iter().zip(reference_pose).zip(parent_indices) {
            let rotation = normalize_rotation(pose.rotation).ok_or_else(|| {
                ConvertError::DegenerateRotation {
                    bone: name.clone(),
                    norm: pose.rotation.length(),
                }
            })?;

            bones.push(Bone {
                name: name.clone(),
                parent_index: parent,
                reference_translation: pose.translation,
                reference_rotation: rotation,
                reference_scale: Vec3::ONE,
            });
        }

        let mut children = vec![Vec::new(); bone_count];
        for (i, bone) in bones.iter().enumerate() {
            if let Some(parent) = bone.parent() {
                children[parent].push(i);
            }
        }

        let skeleton = Self {
            bones,
            children,
            root,
        };

        let reachable = skeleton.hierarchy_order().len();
        if reachable < bone_count {
            tracing::warn!(
                "{} bones unreachable from root '{}', extra roots ignored",
                bone_count - reachable,
                skeleton.bones[root].name
            );
        }

        Ok(skeleton)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// Index of the hierarchy root (the first bone without a parent)
    pub fn root_index(&self) -> usize {
        self.root
    }

    pub fn root(&self) -> &Bone {
        &self.bones[self.root]
    }

    pub fn children(&self, index: usize) -> &[usize] {
        self.children.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Find a bone index by name
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// Bone indices reachable from the root, depth-first, parents before children
    pub fn hierarchy_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.bones.len());
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.children[index].iter().rev());
        }
        order
    }
}

/// Walk every parent chain; a chain longer than the bone count must loop.
fn check_acyclic(names: &[String], parent_indices: &[i16]) -> Result<()> {
    let bone_count = parent_indices.len();
    for (start, name) in names.iter().enumerate() {
        let mut current = start;
        let mut steps = 0;
        while parent_indices[current] != NO_PARENT {
            current = parent_indices[current] as usize;
            steps += 1;
            if steps > bone_count {
                return Err(ConvertError::MalformedSkeleton(format!(
                    "parent chain of bone {} ('{}') forms a cycle",
                    start, name
                )));
            }
        }
    }
    Ok(())
}
