//! Tree validation and health checking.
//!
//! Checks the structural invariants a serialized cluster tree relies on:
//! - leaves have `size == 1` and preview their item
//! - every synthetic node previews a rendered representative
//! - synthetic names are unique within one build
//! - partitional node sizes equal their leaf counts
//! - linkage nodes are binary merges
//!
//! # Example
//!
//! ```rust
//! use clustree::hierarchy::{validate_tree, ClusterNode, Strategy};
//!
//! let mut root = ClusterNode::leaf("a.jpg");
//! root.size = Some(2);
//! let report = validate_tree(&root, Strategy::Partitional);
//! assert!(!report.is_healthy());
//! ```

use std::collections::{HashMap, HashSet};

use super::node::ClusterNode;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational, not a problem.
    Info,
    /// Something unusual but not necessarily wrong.
    Warning,
    /// A broken invariant.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Which builder produced the tree; selects the size and arity rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Recursive partitioning: sizes are leaf counts, arity up to `k`.
    Partitional,
    /// Linkage reconstruction: sizes come from merge counts, arity 2.
    Linkage,
}

/// A single validation issue.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Child-index path of the node, e.g. `root/0/2`.
    pub path: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} (at {})", self.severity, self.message, self.path)
    }
}

/// Report from a validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// All issues found.
    pub issues: Vec<ValidationIssue>,
    /// Size statistics of the tree.
    pub stats: TreeStats,
}

impl ValidationReport {
    fn add(&mut self, severity: Severity, message: impl Into<String>, path: &str) {
        self.issues.push(ValidationIssue {
            severity,
            message: message.into(),
            path: path.to_string(),
        });
    }

    /// No errors (warnings allowed).
    pub fn is_healthy(&self) -> bool {
        !self.issues.iter().any(|i| i.severity >= Severity::Error)
    }

    /// No issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues at `min_severity` or above.
    pub fn issues_at_level(&self, min_severity: Severity) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity >= min_severity)
            .collect()
    }

    /// Count issues by severity.
    pub fn counts(&self) -> HashMap<Severity, usize> {
        let mut counts = HashMap::new();
        for issue in &self.issues {
            *counts.entry(issue.severity).or_default() += 1;
        }
        counts
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} nodes ({} leaves), depth {}, avg branching {:.2}",
            self.stats.node_count,
            self.stats.leaf_count,
            self.stats.max_depth,
            self.stats.avg_branching_factor
        )?;
        if self.is_clean() {
            return write!(f, "no issues found");
        }
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

/// Shape statistics of a cluster tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeStats {
    /// Total number of nodes.
    pub node_count: usize,
    /// Number of leaves.
    pub leaf_count: usize,
    /// Longest root-to-leaf path.
    pub max_depth: usize,
    /// Mean children per internal node.
    pub avg_branching_factor: f64,
}

impl TreeStats {
    /// Compute statistics for `root`.
    pub fn of(root: &ClusterNode) -> Self {
        let mut node_count = 0;
        let mut leaf_count = 0;
        let mut internal = 0;
        let mut edges = 0;
        for node in root.iter() {
            node_count += 1;
            if node.is_leaf() {
                leaf_count += 1;
            } else {
                internal += 1;
                edges += node.children.len();
            }
        }
        Self {
            node_count,
            leaf_count,
            max_depth: root.depth(),
            avg_branching_factor: if internal == 0 {
                0.0
            } else {
                edges as f64 / internal as f64
            },
        }
    }
}

/// Validate a tree built with `strategy`.
///
/// The walk keeps its own stack, so chain-shaped linkage trees of any depth
/// are checked without recursion.
pub fn validate_tree(root: &ClusterNode, strategy: Strategy) -> ValidationReport {
    let mut check = Check {
        strategy,
        names: HashSet::new(),
        parents: vec![(None, 0)],
        report: ValidationReport {
            issues: Vec::new(),
            stats: TreeStats::of(root),
        },
    };

    if !check.enter(root, 0) {
        return check.report;
    }
    let mut stack = vec![Visit {
        node: root,
        slot: 0,
        next_child: 0,
        leaves: 0,
    }];

    while let Some(top) = stack.last_mut() {
        if let Some(child) = top.node.children.get(top.next_child) {
            let slot = check.parents.len();
            check.parents.push((Some(top.slot), top.next_child));
            top.next_child += 1;
            if check.enter(child, slot) {
                stack.push(Visit {
                    node: child,
                    slot,
                    next_child: 0,
                    leaves: 0,
                });
            } else {
                top.leaves += 1;
            }
            continue;
        }

        let done = stack.pop();
        if let Some(done) = done {
            check.leave(done.node, done.slot, done.leaves);
            if let Some(parent) = stack.last_mut() {
                parent.leaves += done.leaves;
            }
        }
    }

    check.report
}

/// An internal node whose children are being checked.
struct Visit<'a> {
    node: &'a ClusterNode,
    slot: usize,
    next_child: usize,
    leaves: usize,
}

struct Check<'a> {
    strategy: Strategy,
    names: HashSet<&'a str>,
    /// `(parent slot, child index)` per visited node, for issue paths.
    parents: Vec<(Option<usize>, usize)>,
    report: ValidationReport,
}

impl<'a> Check<'a> {
    /// Child-index path of the node in `slot`, e.g. `root/0/2`.
    fn path(&self, slot: usize) -> String {
        let mut indices = Vec::new();
        let mut cursor = slot;
        while let (Some(parent), index) = self.parents[cursor] {
            indices.push(index);
            cursor = parent;
        }
        let mut path = String::from("root");
        for index in indices.iter().rev() {
            path.push('/');
            path.push_str(&index.to_string());
        }
        path
    }

    fn add(&mut self, severity: Severity, message: impl Into<String>, slot: usize) {
        let path = self.path(slot);
        self.report.add(severity, message, &path);
    }

    /// Pre-order checks. Returns `true` when `node` has children to visit.
    fn enter(&mut self, node: &'a ClusterNode, slot: usize) -> bool {
        if node.preview.is_none() {
            self.add(Severity::Error, "node has no preview", slot);
        }
        match (&node.x, &node.y) {
            (Some(x), Some(y)) if x.len() != y.len() => {
                self.add(Severity::Warning, "x and y trails differ in length", slot);
            }
            (Some(_), None) | (None, Some(_)) => {
                self.add(Severity::Warning, "only one of x/y is set", slot);
            }
            _ => {}
        }

        if node.is_leaf() {
            if node.size != Some(1) {
                self.add(Severity::Error, "leaf size is not 1", slot);
            }
            return false;
        }

        if let Some(name) = node.name.as_deref() {
            if !self.names.insert(name) {
                self.add(Severity::Error, format!("duplicate cluster name {name:?}"), slot);
            }
        }
        if self.strategy == Strategy::Linkage && node.children.len() != 2 {
            let message = format!("linkage node has {} children", node.children.len());
            self.add(Severity::Error, message, slot);
        }
        true
    }

    /// Post-order checks once every leaf under `node` is counted.
    fn leave(&mut self, node: &ClusterNode, slot: usize, leaves: usize) {
        match (node.size, self.strategy) {
            (None, _) => self.add(Severity::Warning, "internal node has no size", slot),
            (Some(size), Strategy::Partitional) if size != leaves => self.add(
                Severity::Error,
                format!("size {size} but {leaves} leaves"),
                slot,
            ),
            (Some(size), Strategy::Linkage) if size != leaves => self.add(
                Severity::Warning,
                format!("merge count {size} but {leaves} leaves"),
                slot,
            ),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::ClusterId;

    fn pair(id: usize, a: &str, b: &str) -> ClusterNode {
        let mut node = ClusterNode::cluster(ClusterId::new(id), format!("c-{id}")).with_size(2);
        node.children = vec![ClusterNode::leaf(a), ClusterNode::leaf(b)];
        node
    }

    #[test]
    fn test_valid_linkage_tree() {
        let mut root = ClusterNode::cluster(ClusterId::new(0), "c-0").with_size(4);
        root.children = vec![pair(1, "a", "b"), pair(2, "c", "d")];

        let report = validate_tree(&root, Strategy::Linkage);
        assert!(report.is_clean(), "{report}");
        assert_eq!(report.stats.leaf_count, 4);
        assert_eq!(report.stats.node_count, 7);
        assert_eq!(report.stats.max_depth, 2);
        assert!((report.stats.avg_branching_factor - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_partitional_size_mismatch() {
        let mut root = ClusterNode::cluster(ClusterId::new(0), "c-0").with_size(5);
        root.children = vec![pair(1, "a", "b"), pair(2, "c", "d")];

        let report = validate_tree(&root, Strategy::Partitional);
        assert!(!report.is_healthy());
        assert_eq!(report.issues_at_level(Severity::Error)[0].path, "root");
    }

    #[test]
    fn test_duplicate_names_and_missing_preview() {
        let mut root = ClusterNode::cluster(ClusterId::new(0), "c-0").with_size(4);
        let mut dup = pair(0, "c", "d");
        dup.preview = None;
        root.children = vec![pair(1, "a", "b"), dup];

        let report = validate_tree(&root, Strategy::Linkage);
        assert_eq!(report.counts().get(&Severity::Error), Some(&2));
        assert!(report.issues.iter().all(|i| i.path == "root/1"));
    }

    #[test]
    fn test_linkage_arity() {
        let mut root = ClusterNode::cluster(ClusterId::new(0), "c-0").with_size(3);
        root.children = vec![
            ClusterNode::leaf("a"),
            ClusterNode::leaf("b"),
            ClusterNode::leaf("c"),
        ];
        assert!(validate_tree(&root, Strategy::Partitional).is_clean());
        assert!(!validate_tree(&root, Strategy::Linkage).is_healthy());
    }

    #[test]
    fn test_deep_chain_checked_without_recursion() {
        let depth = 100_000;
        let mut root = ClusterNode::leaf("item_0");
        for i in 1..=depth {
            let mut parent =
                ClusterNode::cluster(ClusterId::new(i), format!("c-{i}")).with_size(i + 1);
            parent.children = vec![root, ClusterNode::leaf(&format!("item_{i}"))];
            root = parent;
        }
        // one wrong count at the bottom merge
        let mut bottom = &mut root;
        for _ in 1..depth {
            bottom = &mut bottom.children[0];
        }
        bottom.size = Some(3);

        let report = validate_tree(&root, Strategy::Linkage);
        assert!(report.is_healthy(), "{report}");
        assert_eq!(report.stats.max_depth, depth);
        assert_eq!(report.stats.leaf_count, depth + 1);

        let issues = report.issues_at_level(Severity::Warning);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "merge count 3 but 2 leaves");
        assert_eq!(issues[0].path.matches("/0").count(), depth - 1);
    }
}
