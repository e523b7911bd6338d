//! # clustree
//!
//! Nested cluster trees over image collections, serialized for visualization.
//!
//! A flat set of feature vectors (one per image) becomes a navigable tree in
//! one of two ways:
//!
//! - [`PartitionalTreeBuilder`]: split recursively with a [`Partitioner`]
//!   (k-means by default) until nodes are small or deep enough.
//! - [`LinkageTreeBuilder`]: rebuild the binary tree recorded in a
//!   [`LinkageMatrix`] (SciPy layout, `n - 1` merge rows over `n` items).
//!
//! Every synthetic node previews a representative image produced by a
//! [`RepresentativeRenderer`]; [`TreeSerializer`] writes the finished tree as
//! a JSON document.
//!
//! ```rust
//! use clustree::{LinkageMatrix, LinkageTreeBuilder, InMemoryRenderer, TreeSerializer};
//!
//! let z = LinkageMatrix::from_rows(&[[0.0, 1.0, 0.5, 2.0]]).unwrap();
//! let images = vec![vec![0.0_f32], vec![1.0]];
//! let ids = vec!["a.jpg".to_string(), "b.jpg".to_string()];
//!
//! let mut renderer = InMemoryRenderer::new("hamming-average");
//! let root = LinkageTreeBuilder::new().build(&mut renderer, &z, &images, &ids).unwrap();
//! assert_eq!(root.size, Some(2));
//!
//! let text = TreeSerializer::new().serialize(&root).unwrap();
//! assert!(text.contains("\"cluster 1\""));
//! ```
//!
//! **Default build** includes the clustering algorithms (`cluster`) and
//! `RgbImage` support (`imaging`). The `clustree` binary needs `cli`.

pub mod cluster;
/// Error types used across `clustree`.
pub mod error;
#[cfg(feature = "imaging")]
pub mod features;
pub mod hierarchy;
pub mod render;
pub mod serialize;

#[cfg(test)]
mod tree_tests;

pub use error::{Error, Result};
pub use hierarchy::{
    validate_tree, ClusterId, ClusterIds, ClusterNode, EmptyGroupPolicy, LinkageMatrix,
    LinkageTreeBuilder, MergeRecord, PartitionConfig, PartitionalTreeBuilder, Reference,
    Strategy, ValidationReport,
};
pub use render::{Blend, InMemoryRenderer, Representative, RepresentativeRenderer};
pub use serialize::TreeSerializer;

pub use cluster::{Partitioner, Projector};
#[cfg(feature = "cluster")]
pub use cluster::{HierarchicalClustering, Kmeans, Linkage, Metric, PcaProjector};

#[cfg(feature = "imaging")]
pub use features::FeatureKind;
#[cfg(feature = "imaging")]
pub use render::JpegRenderer;
