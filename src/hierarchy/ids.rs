//! Cluster id assignment.
//!
//! Ids are handed out in pre-order: a node takes its id before any of its
//! children are built. One [`ClusterIds`] is owned by a single top-level
//! build, so two builds never share or skip ids.

use core::fmt;

/// Identifier of a synthetic cluster node within one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterId(usize);

impl ClusterId {
    /// Wrap a raw id.
    pub fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Raw id, as used in representative filenames.
    pub fn get(self) -> usize {
        self.0
    }

    /// Display label. Labels are one-based while file ids are zero-based.
    pub fn display_name(self) -> String {
        format!("cluster {}", self.0 + 1)
    }

    /// Filename stem `<prefix>-<id>`.
    pub fn file_stem(self, prefix: &str) -> String {
        format!("{prefix}-{}", self.0)
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id counter scoped to one build.
#[derive(Debug, Clone, Default)]
pub struct ClusterIds {
    next: usize,
}

impl ClusterIds {
    /// Start at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next id.
    pub fn next_id(&mut self) -> ClusterId {
        let id = ClusterId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> usize {
        self.next
    }
}
