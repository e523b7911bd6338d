//! Cluster trees and the builders that produce them.
//!
//! Two strategies produce the same [`ClusterNode`] tree:
//!
//! ```text
//! Strategy                 │ Input                     │ Shape
//! ─────────────────────────┼───────────────────────────┼──────────────────
//! PartitionalTreeBuilder   │ feature rows + partitioner│ up to k children
//! LinkageTreeBuilder       │ linkage matrix (n-1 rows) │ binary merges
//! ```
//!
//! Both draw synthetic cluster ids from a [`ClusterIds`] counter scoped to
//! one `build` call, and both ask a
//! [`RepresentativeRenderer`](crate::render::RepresentativeRenderer) for a
//! preview of every synthetic node.
//!
//! ## Partitional
//!
//! Top-down: render the node, stop when it is small or the depth budget is
//! spent, else split with `k` groups and recurse into each.
//!
//! ## Linkage
//!
//! Bottom-up record, top-down walk: starting at the last merge row, each
//! side is either an original item (`r < n`) or an earlier merge (`r >= n`).
//! Merges are resolved once and their representative is blended pairwise
//! into the parent:
//!
//! ```text
//!         6 (row 2, count 4)
//!        / \
//!       4   5 (rows 0 and 1)
//!      / \ / \
//!     0  1 2  3 (items)
//! ```
//!
//! [`validate_tree`] checks the resulting invariants after the fact.

mod agglomerative;
mod ids;
mod linkage;
mod node;
mod partitional;
mod validate;

pub use agglomerative::LinkageTreeBuilder;
pub use ids::{ClusterId, ClusterIds};
pub use linkage::{LinkageMatrix, MergeRecord, Reference};
pub use node::{ClusterNode, PreOrder};
pub use partitional::{EmptyGroupPolicy, PartitionConfig, PartitionalTreeBuilder};
pub use validate::{
    validate_tree, Severity, Strategy, TreeStats, ValidationIssue, ValidationReport,
};
