//! A coordinate frame with a time-indexed transform history.

use std::collections::BTreeMap;

use vantage_core::Time;

use crate::transform::Transform;

/// Default cap on stored samples per frame. Oldest samples are evicted first.
pub const DEFAULT_MAX_CAPACITY: usize = 10_000;

/// One node of the transform forest.
///
/// The history holds this frame's offset expressed in its parent frame,
/// keyed by timestamp. Lookups between samples interpolate; lookups outside
/// the recorded range clamp to the nearest boundary sample, so a frame with
/// at least one sample always resolves.
#[derive(Debug, Clone)]
pub struct CoordinateFrame {
    id: String,
    parent: Option<String>,
    history: BTreeMap<Time, Transform>,
    max_capacity: usize,
}

impl CoordinateFrame {
    /// Creates a frame with no parent and an empty history.
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_capacity(id, DEFAULT_MAX_CAPACITY)
    }

    /// Creates a frame with a custom history capacity (minimum 1).
    pub fn with_capacity(id: impl Into<String>, max_capacity: usize) -> Self {
        Self {
            id: id.into(),
            parent: None,
            history: BTreeMap::new(),
            max_capacity: max_capacity.max(1),
        }
    }

    /// Returns the frame identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the parent frame identifier, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Sets the parent frame identifier.
    pub fn set_parent(&mut self, parent: Option<String>) {
        self.parent = parent;
    }

    /// Inserts a transform sample. An existing sample at the same stamp is
    /// replaced. Evicts the oldest samples beyond capacity.
    pub fn add_offset(&mut self, time: Time, transform: Transform) {
        self.history.insert(time, transform);
        while self.history.len() > self.max_capacity {
            self.history.pop_first();
        }
    }

    /// Clears the transform history.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Returns the number of stored samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Returns true if no samples are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Returns the most recent sample.
    #[must_use]
    pub fn latest(&self) -> Option<(Time, &Transform)> {
        self.history.iter().next_back().map(|(t, tf)| (*t, tf))
    }

    /// Resolves the transform at `time`.
    ///
    /// Exact stamps return the stored sample; bracketed times interpolate;
    /// times outside the range clamp to the boundary sample. Fails only when
    /// the history is empty.
    #[must_use]
    pub fn find_closest(&self, time: Time) -> Option<Transform> {
        let before = self.history.range(..=time).next_back();
        let after = self.history.range(time..).next();

        match (before, after) {
            (Some((&t0, tf0)), Some((&t1, tf1))) => {
                if t0 == t1 {
                    Some(*tf0)
                } else {
                    let fraction = Time::interpolation_fraction(t0, t1, time);
                    Some(Transform::interpolate(tf0, tf1, fraction))
                }
            }
            (Some((_, tf)), None) | (None, Some((_, tf))) => Some(*tf),
            (None, None) => None,
        }
    }
}
