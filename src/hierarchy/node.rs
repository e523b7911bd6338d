//! The cluster tree node.

use core::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ids::ClusterId;

/// A node in a cluster tree.
///
/// Leaves stand for single original items; internal nodes stand for the
/// group of items beneath them and carry a preview of their representative
/// image. Every field except `children` is optional and absent fields are
/// left out of the serialized document.
///
/// The blended representative itself is not stored on the node. Builders
/// keep it alongside the node while an ancestor still needs it (the linkage
/// builder's memo), and `preview` records the handle it was persisted under.
///
/// Dropping a node releases its subtree with an explicit stack, so chains
/// thousands of levels deep are safe to discard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterNode {
    /// Display label: `cluster N` for synthetic nodes, base filename for leaves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Handle of the representative image (internal) or the item itself (leaf).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// Number of original items under this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    /// Projected x coordinate, one entry per tree level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<f32>>,
    /// Projected y coordinate, one entry per tree level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Vec<f32>>,
    /// `[min_x, min_y, range_x, range_y]` in the projection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[f32; 4]>,
    /// Ordered children; order is construction order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ClusterNode>,
}

impl ClusterNode {
    /// Create a synthetic cluster node for `id` previewing `handle`.
    pub fn cluster(id: ClusterId, handle: impl Into<String>) -> Self {
        Self {
            name: Some(id.display_name()),
            preview: Some(handle.into()),
            size: None,
            x: None,
            y: None,
            bounds: None,
            children: Vec::new(),
        }
    }

    /// Create a base leaf for an original item.
    ///
    /// The leaf is named after the identifier's file name and previews the
    /// identifier itself.
    pub fn leaf(identifier: &str) -> Self {
        let name = Path::new(identifier)
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| identifier.to_string());
        Self {
            name: Some(name),
            preview: Some(identifier.to_string()),
            size: Some(1),
            x: None,
            y: None,
            bounds: None,
            children: Vec::new(),
        }
    }

    /// Set the member count.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the projected coordinate trail.
    pub fn with_coordinates(mut self, x: Vec<f32>, y: Vec<f32>) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Check if this is a leaf node.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of leaves in this subtree (a leaf counts itself).
    pub fn leaf_count(&self) -> usize {
        self.iter().filter(|n| n.is_leaf()).count()
    }

    /// Total number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Height of the subtree; a lone leaf has depth 0.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children.iter().map(|c| (c, depth + 1)));
        }
        deepest
    }

    /// Depth-first pre-order traversal.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    /// Leaves in left-to-right order.
    pub fn leaves(&self) -> impl Iterator<Item = &ClusterNode> {
        self.iter().filter(|n| n.is_leaf())
    }
}

impl Drop for ClusterNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Pre-order iterator over a [`ClusterNode`] subtree.
#[derive(Debug, Clone)]
pub struct PreOrder<'a> {
    stack: Vec<&'a ClusterNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a ClusterNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

impl fmt::Display for ClusterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("<unnamed>");
        match self.size {
            Some(size) if !self.is_leaf() => {
                write!(f, "{name} ({size} items, {} children)", self.children.len())
            }
            _ => write!(f, "{name}"),
        }
    }
}
