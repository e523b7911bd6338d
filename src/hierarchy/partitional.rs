//! Recursive partitional cluster trees.
//!
//! Builds a tree top-down by repeatedly splitting a node's members into `k`
//! groups until a node is small enough or the depth budget runs out:
//!
//! ```text
//!                    [cluster 1: 40 items]
//!                   /          |          \
//!      [cluster 2: 18]   [cluster 9: 7]   [cluster 11: 15]
//!        /    |    \        / | \ ...         ...
//!     ...    ...   ...   leaves (7 < split_threshold)
//! ```
//!
//! Every node, leaf-parents included, gets a representative image rendered
//! from all of its members. Ids are drawn in pre-order, so cluster ids and
//! render calls follow a depth-first walk of the finished tree.
//!
//! With a [`Projector`] attached, each node also projects its members into
//! the plane and appends the result to a per-item coordinate trail. Leaves
//! carry their whole trail; internal nodes carry the coordinate-wise mean of
//! their members' trails.
//!
//! The mean is taken after the node's own projection is appended, so a node
//! at depth `d` carries `d + 1` entries and the root carries one. A trail
//! that stopped at the parent's level (mean taken before appending) would
//! leave the root with none.

use tracing::{debug, info, warn};

use super::ids::ClusterIds;
use super::node::ClusterNode;
use crate::cluster::{Partitioner, Projector};
use crate::error::{Error, Result};
use crate::render::RepresentativeRenderer;

/// What to do when a split routes no items to one of its groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyGroupPolicy {
    /// Leave the group out of the tree.
    #[default]
    Skip,
    /// Abort the build with [`Error::EmptyPartition`].
    Error,
}

/// Configuration for a partitional build.
#[derive(Debug, Clone)]
pub struct PartitionConfig {
    /// Groups per split (`k`).
    pub branching_factor: usize,
    /// Nodes with fewer members than this become leaf-parents.
    pub split_threshold: usize,
    /// Maximum number of splits along any path.
    pub max_depth: usize,
    /// Handling of empty groups.
    pub empty_groups: EmptyGroupPolicy,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            branching_factor: 7,
            split_threshold: 10,
            max_depth: 10,
            empty_groups: EmptyGroupPolicy::Skip,
        }
    }
}

impl PartitionConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the branching factor.
    pub fn with_branching_factor(mut self, k: usize) -> Self {
        self.branching_factor = k;
        self
    }

    /// Set the split threshold.
    pub fn with_split_threshold(mut self, threshold: usize) -> Self {
        self.split_threshold = threshold;
        self
    }

    /// Set maximum depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the empty-group policy.
    pub fn with_empty_groups(mut self, policy: EmptyGroupPolicy) -> Self {
        self.empty_groups = policy;
        self
    }
}

/// Per-item coordinate history, one entry per level visited.
#[derive(Debug, Clone, Default)]
struct Trail {
    x: Vec<f32>,
    y: Vec<f32>,
}

/// Builds cluster trees by recursive partitioning.
pub struct PartitionalTreeBuilder<P> {
    config: PartitionConfig,
    partitioner: P,
    projector: Option<Box<dyn Projector>>,
}

impl<P: Partitioner> PartitionalTreeBuilder<P> {
    /// Create a builder splitting with `partitioner`.
    pub fn new(config: PartitionConfig, partitioner: P) -> Self {
        Self {
            config,
            partitioner,
            projector: None,
        }
    }

    /// Record coordinate trails using `projector`.
    pub fn with_projector(mut self, projector: impl Projector + 'static) -> Self {
        self.projector = Some(Box::new(projector));
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// Build a tree over `features`, one row per item.
    ///
    /// `images` and `identifiers` are parallel to `features`. The returned
    /// root has `size == features.len()`.
    pub fn build<R: RepresentativeRenderer>(
        &self,
        renderer: &mut R,
        features: &[Vec<f32>],
        images: &[R::Image],
        identifiers: &[String],
    ) -> Result<ClusterNode> {
        let n = features.len();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        check_len("images", n, images.len())?;
        check_len("identifiers", n, identifiers.len())?;
        let dim = features[0].len();
        if let Some(row) = features.iter().find(|r| r.len() != dim) {
            return Err(Error::DimensionMismatch {
                expected: dim,
                found: row.len(),
            });
        }
        if self.config.branching_factor == 0 {
            return Err(Error::InvalidParameter {
                name: "branching_factor",
                message: "must be at least 1",
            });
        }

        let mut build = Build {
            renderer,
            ids: ClusterIds::new(),
            features,
            images,
            identifiers,
        };
        let members: Vec<usize> = (0..n).collect();
        let trails = self.projector.as_ref().map(|_| vec![Trail::default(); n]);
        let root = self.build_node(&mut build, &members, trails, self.config.max_depth)?;

        info!(
            items = n,
            clusters = build.ids.issued(),
            depth = root.depth(),
            "built partitional tree"
        );
        Ok(root)
    }

    fn build_node<R: RepresentativeRenderer>(
        &self,
        build: &mut Build<'_, R>,
        members: &[usize],
        mut trails: Option<Vec<Trail>>,
        depth: usize,
    ) -> Result<ClusterNode> {
        let id = build.ids.next_id();
        let member_images: Vec<&R::Image> = members.iter().map(|&i| &build.images[i]).collect();
        let rep = build.renderer.render(id, &member_images)?;

        let mut node = ClusterNode::cluster(id, rep.handle).with_size(members.len());
        debug!(id = id.get(), size = members.len(), depth, "partitional node");

        let rows: Vec<Vec<f32>> = members.iter().map(|&i| build.features[i].clone()).collect();

        if let (Some(projector), Some(trails)) = (&self.projector, trails.as_mut()) {
            let coords = if rows.len() > 1 {
                projector.project(&rows)?
            } else {
                vec![[0.0, 0.0]]
            };
            if coords.len() != rows.len() {
                return Err(Error::InputShapeMismatch {
                    field: "projection",
                    expected: rows.len(),
                    found: coords.len(),
                });
            }
            for (trail, [x, y]) in trails.iter_mut().zip(coords) {
                trail.x.push(x);
                trail.y.push(y);
            }
            let (x, y) = mean_trail(trails);
            node = node.with_coordinates(x, y);
        }

        if members.len() < self.config.split_threshold || depth == 0 {
            node.children = members
                .iter()
                .enumerate()
                .map(|(pos, &i)| {
                    let leaf = ClusterNode::leaf(&build.identifiers[i]);
                    match &trails {
                        Some(t) => leaf.with_coordinates(t[pos].x.clone(), t[pos].y.clone()),
                        None => leaf,
                    }
                })
                .collect();
            return Ok(node);
        }

        let k = self.config.branching_factor.min(members.len());
        let labels = self.partitioner.partition(&rows, k)?;
        if labels.len() != members.len() {
            return Err(Error::InputShapeMismatch {
                field: "partition labels",
                expected: members.len(),
                found: labels.len(),
            });
        }
        if let Some(&bad) = labels.iter().find(|&&l| l >= k) {
            return Err(Error::InvalidClusterCount {
                requested: bad + 1,
                n_items: k,
            });
        }

        for label in 0..k {
            let positions: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|&(_, &l)| l == label)
                .map(|(pos, _)| pos)
                .collect();

            if positions.is_empty() {
                match self.config.empty_groups {
                    EmptyGroupPolicy::Skip => {
                        warn!(id = id.get(), label, "skipping empty partition");
                        continue;
                    }
                    EmptyGroupPolicy::Error => {
                        return Err(Error::EmptyPartition { label, depth });
                    }
                }
            }

            let group: Vec<usize> = positions.iter().map(|&p| members[p]).collect();
            let group_trails = trails
                .as_ref()
                .map(|t| positions.iter().map(|&p| t[p].clone()).collect());
            let child = self.build_node(build, &group, group_trails, depth - 1)?;
            node.children.push(child);
        }

        Ok(node)
    }
}

struct Build<'a, R: RepresentativeRenderer> {
    renderer: &'a mut R,
    ids: ClusterIds,
    features: &'a [Vec<f32>],
    images: &'a [R::Image],
    identifiers: &'a [String],
}

pub(crate) fn check_len(field: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(Error::InputShapeMismatch {
            field,
            expected,
            found,
        });
    }
    Ok(())
}

fn mean_trail(trails: &[Trail]) -> (Vec<f32>, Vec<f32>) {
    let levels = trails.first().map_or(0, |t| t.x.len());
    let n = trails.len().max(1) as f32;
    let mut x = vec![0.0f32; levels];
    let mut y = vec![0.0f32; levels];
    for trail in trails {
        for level in 0..levels {
            x[level] += trail.x[level];
            y[level] += trail.y[level];
        }
    }
    x.iter_mut().for_each(|v| *v /= n);
    y.iter_mut().for_each(|v| *v /= n);
    (x, y)
}
