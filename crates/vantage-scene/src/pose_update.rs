//! The transform-resolution contract every renderable update goes through.

use vantage_core::Time;
use vantage_transforms::TransformTree;

use crate::renderable::Renderable;

/// Resolves and writes a renderable's pose in the render frame.
///
/// Computes the chain `source_frame@src_time -> fixed_frame ->
/// render_frame@dst_time` through the transform tree. On success the
/// resolved pose is written via [`Renderable::set_render_pose`] and `true`
/// is returned. On failure the renderable's pose is left untouched and
/// `false` is returned; a missing transform never aborts the frame loop.
///
/// Deterministic for identical tree contents and arguments.
pub fn update_pose(
    renderable: &mut dyn Renderable,
    tree: &TransformTree,
    render_frame_id: &str,
    fixed_frame_id: &str,
    source_frame_id: &str,
    dst_time: Time,
    src_time: Time,
) -> bool {
    let source_pose = renderable.user_data().pose;
    match tree.apply(
        &source_pose,
        render_frame_id,
        fixed_frame_id,
        source_frame_id,
        dst_time,
        src_time,
    ) {
        Some(resolved) => {
            renderable.set_render_pose(resolved);
            true
        }
        None => false,
    }
}
