//! End-to-end assembly tests: decoded data -> Scene

use anim_common::{
    AnimationBinding, ChannelKind, FrameTransform, RotationMode, Skeleton, TransformSampler,
    assemble,
};
use glam::{Quat, Vec3};

fn root_child_skeleton() -> Skeleton {
    let names = vec!["Root".to_string(), "Child".to_string()];
    let pose = vec![
        FrameTransform::IDENTITY,
        FrameTransform::from_translation(Vec3::X),
    ];
    Skeleton::build(&names, &pose, &[-1, 0]).expect("valid skeleton")
}

fn child_track() -> Vec<FrameTransform> {
    vec![
        FrameTransform::new(Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE),
        FrameTransform::new(Vec3::new(2.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE),
    ]
}

#[test]
fn test_root_child_euler() {
    let skeleton = root_child_skeleton();
    let binding = AnimationBinding::new(vec![1]);
    let sampler = TransformSampler::track_major(vec![child_track()]);

    let scene = assemble(&skeleton, &binding, &sampler, RotationMode::Euler, "Walk")
        .expect("assembly succeeds");

    assert_eq!(scene.animation.frame_count(), 2);
    assert_eq!(scene.animation.groups.len(), 1);

    let group = &scene.animation.groups[0];
    assert_eq!(group.bone_name, "Child");

    let pos_x = group.channel(ChannelKind::PositionX).unwrap();
    assert_eq!(pos_x.value_at(0), Some(1.0));
    assert_eq!(pos_x.value_at(1), Some(2.0));

    for kind in ChannelKind::EULER {
        let channel = group.channel(kind).unwrap();
        assert_eq!(channel.keys.len(), 2);
        assert!(channel.values().all(|v| v == 0.0), "{kind:?} should be 0");
    }

    let child = scene.find_bone("Child").unwrap();
    assert_eq!(child.translation, Vec3::X);
    assert_eq!(scene.bone_count(), 2);
}

#[test]
fn test_root_child_quaternion_from_frame_major_source() {
    let skeleton = root_child_skeleton();
    let binding = AnimationBinding::new(vec![1]);
    // Same data as above, delivered one snapshot per frame
    let frames = child_track().into_iter().map(|t| vec![t]).collect();
    let sampler = TransformSampler::frame_major(frames);

    let scene = assemble(
        &skeleton,
        &binding,
        &sampler,
        RotationMode::Quaternion,
        "Walk",
    )
    .expect("assembly succeeds");

    let group = scene.animation.group("Child").unwrap();
    assert_eq!(group.channels.len(), 10);
    assert!(group.channel(ChannelKind::EulerX).is_none());
    let quat_w = group.channel(ChannelKind::QuatW).unwrap();
    assert_eq!(quat_w.values().collect::<Vec<_>>(), [1.0, 1.0]);
    assert_eq!(group.frames(), [0, 1]);
}

#[test]
fn test_skeleton_is_reusable_across_animations() {
    let skeleton = root_child_skeleton();
    let binding = AnimationBinding::new(vec![1, 0]);

    let short = TransformSampler::track_major(vec![child_track(), child_track()]);
    let ramp = (0..8).map(|f| FrameTransform::from_translation(Vec3::splat(f as f32)));
    let tracks = vec![ramp.collect(), vec![FrameTransform::IDENTITY; 8]];
    let long = TransformSampler::track_major(tracks);

    let a = assemble(&skeleton, &binding, &short, RotationMode::Euler, "a").unwrap();
    let b = assemble(&skeleton, &binding, &long, RotationMode::Euler, "b").unwrap();

    assert_eq!(a.animation.frame_count(), 2);
    assert_eq!(b.animation.frame_count(), 8);
    assert_eq!(a.skeleton, b.skeleton);
}
