//! Canonical text form of a cluster tree.
//!
//! The document is pretty-printed JSON, emitted depth-first in pre-order.
//! Each node writes only the fields it has set, in a fixed order
//! (`name`, `preview`, `size`, `x`, `y`, `bounds`), followed by `children`
//! when it has any. Output depends only on the tree, so serializing the same
//! tree twice yields identical bytes.
//!
//! Linkage trees over chained data nest one level per item. Both directions
//! run through `serde_stacker`, which grows the stack on the heap, and
//! parsing lifts serde_json's nesting limit, so documents thousands of
//! levels deep round-trip. Pretty output indents every level, so very deep
//! chains are better written [`compact`](TreeSerializer::compact).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::hierarchy::ClusterNode;

/// Writes [`ClusterNode`] trees as JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeSerializer {
    compact: bool,
}

impl TreeSerializer {
    /// Create a pretty-printing serializer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a single-line document instead.
    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Serialize `root` to text.
    pub fn serialize(&self, root: &ClusterNode) -> Result<String> {
        let mut buf = Vec::new();
        if self.compact {
            let mut json = serde_json::Serializer::new(&mut buf);
            root.serialize(serde_stacker::Serializer::new(&mut json))?;
        } else {
            let mut json = serde_json::Serializer::pretty(&mut buf);
            root.serialize(serde_stacker::Serializer::new(&mut json))?;
        }
        String::from_utf8(buf).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Serialize `root` and write it to `path`, followed by a newline.
    pub fn write_to(&self, root: &ClusterNode, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut text = self.serialize(root)?;
        text.push('\n');
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)?;
        info!(path = %path.display(), nodes = root.node_count(), "wrote cluster tree");
        Ok(())
    }

    /// Parse a document produced by [`serialize`](Self::serialize).
    pub fn parse(&self, text: &str) -> Result<ClusterNode> {
        let mut json = serde_json::Deserializer::from_str(text);
        json.disable_recursion_limit();
        let root = ClusterNode::deserialize(serde_stacker::Deserializer::new(&mut json))?;
        json.end()?;
        Ok(root)
    }
}
