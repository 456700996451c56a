//! The transform tree: a forest of time-varying coordinate frames.

use std::collections::HashMap;

use vantage_core::Time;

use crate::frame::{CoordinateFrame, DEFAULT_MAX_CAPACITY};
use crate::pose::Pose;
use crate::transform::Transform;

/// Parent-chain walks bail out beyond this depth (cycle guard).
const MAX_CHAIN_DEPTH: usize = 512;

/// A forest of [`CoordinateFrame`]s answering timed transform queries.
///
/// Ingestion writes into the tree between frames; during a frame the tree is
/// read-only and every query is deterministic for identical contents.
#[derive(Debug, Default)]
pub struct TransformTree {
    frames: HashMap<String, CoordinateFrame>,
    frame_capacity: usize,
}

impl TransformTree {
    /// Creates an empty tree with the default per-frame history capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_frame_capacity(DEFAULT_MAX_CAPACITY)
    }

    /// Creates an empty tree with a custom per-frame history capacity.
    #[must_use]
    pub fn with_frame_capacity(frame_capacity: usize) -> Self {
        Self {
            frames: HashMap::new(),
            frame_capacity: frame_capacity.max(1),
        }
    }

    /// Records `child`'s transform in `parent` at `time`.
    ///
    /// Unknown frames are created on demand. Re-parenting a frame resets its
    /// history, since stored samples are only meaningful relative to the old
    /// parent.
    pub fn add_transform(
        &mut self,
        parent_id: &str,
        child_id: &str,
        time: Time,
        transform: Transform,
    ) {
        let capacity = self.frame_capacity;
        self.frames
            .entry(parent_id.to_string())
            .or_insert_with(|| CoordinateFrame::with_capacity(parent_id, capacity));

        let child = self
            .frames
            .entry(child_id.to_string())
            .or_insert_with(|| CoordinateFrame::with_capacity(child_id, capacity));

        match child.parent() {
            Some(current) if current != parent_id => {
                log::warn!(
                    "re-parenting frame '{child_id}' from '{current}' to '{parent_id}', \
                     discarding history"
                );
                child.clear_history();
                child.set_parent(Some(parent_id.to_string()));
            }
            Some(_) => {}
            None => child.set_parent(Some(parent_id.to_string())),
        }
        child.add_offset(time, transform);
    }

    /// Returns the frame with the given id.
    #[must_use]
    pub fn frame(&self, id: &str) -> Option<&CoordinateFrame> {
        self.frames.get(id)
    }

    /// Returns true if a frame with the given id exists.
    #[must_use]
    pub fn has_frame(&self, id: &str) -> bool {
        self.frames.contains_key(id)
    }

    /// Returns all frame ids, sorted.
    #[must_use]
    pub fn frame_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.frames.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if the tree has no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Removes all frames.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Composes the transform taking coordinates in `frame_id` to
    /// `ancestor_id`, sampling every link at `time`.
    ///
    /// Fails if `ancestor_id` is not an ancestor-or-self of `frame_id`, any
    /// link's history is empty, or the chain dangles.
    #[must_use]
    pub fn frame_to_ancestor(
        &self,
        frame_id: &str,
        ancestor_id: &str,
        time: Time,
    ) -> Option<Transform> {
        let mut accumulated = Transform::IDENTITY;
        let mut current = frame_id;

        for _ in 0..MAX_CHAIN_DEPTH {
            if current == ancestor_id {
                return Some(accumulated);
            }
            let frame = self.frames.get(current)?;
            let link = frame.find_closest(time)?;
            accumulated = link.compose(&accumulated);
            current = frame.parent()?;
        }
        log::warn!("transform chain from '{frame_id}' to '{ancestor_id}' exceeds max depth");
        None
    }

    /// The "time travel" query: re-expresses `pose` (given in
    /// `source_frame_id` at `src_time`) in `render_frame_id` at `dst_time`,
    /// routing through `fixed_frame_id` as the common ancestor.
    ///
    /// Both the source and render frames must be rooted in the fixed frame;
    /// otherwise the query fails and the caller keeps the previous pose.
    #[must_use]
    pub fn apply(
        &self,
        pose: &Pose,
        render_frame_id: &str,
        fixed_frame_id: &str,
        source_frame_id: &str,
        dst_time: Time,
        src_time: Time,
    ) -> Option<Pose> {
        let source_to_fixed = self.frame_to_ancestor(source_frame_id, fixed_frame_id, src_time)?;
        let render_to_fixed = self.frame_to_ancestor(render_frame_id, fixed_frame_id, dst_time)?;
        let pose_in_fixed = source_to_fixed.apply(pose);
        Some(render_to_fixed.inverse().apply(&pose_in_fixed))
    }
}
