//! Cluster trees reconstructed from a linkage matrix.
//!
//! Starting at the final merge, each record `(a, b, distance, count)` becomes
//! one cluster node. Each side is resolved independently:
//!
//! | Side | Resolution |
//! |------|------------|
//! | fresh item (`r < n`) | base leaf for the item; its raw image is the side image |
//! | fresh merge (`r >= n`) | expand merge `r - n` into a child subtree; its representative is the side image |
//! | merge already expanded | reuse the stored representative, attach nothing |
//! | item seen before | [`Error::ReferenceResolution`] |
//! | merge still being expanded | [`Error::ReferenceResolution`] (cycle) |
//!
//! The node's own representative is the blend of its two side images, so an
//! ancestor never re-blends raw items. Results are memoized per raw
//! reference in an arena of `2n - 1` slots; each slot is written once.
//!
//! The walk uses an explicit stack instead of recursion. Ids are still drawn
//! when a merge is first opened, so they follow the pre-order of the tree.

use tracing::{debug, info};

use super::ids::{ClusterId, ClusterIds};
use super::linkage::{LinkageMatrix, MergeRecord, Reference};
use super::node::ClusterNode;
use super::partitional::check_len;
use crate::error::{Error, Result};
use crate::render::RepresentativeRenderer;

/// Memo slot for one raw reference.
#[derive(Debug, Clone)]
enum Slot<I> {
    /// Merge opened but not yet closed.
    InProgress,
    /// Item attached as a leaf.
    Item,
    /// Merge closed with this representative.
    Done(I),
}

/// An open merge awaiting its two sides.
struct Frame<I> {
    row: usize,
    record: MergeRecord,
    id: ClusterId,
    children: Vec<ClusterNode>,
    resolved: Vec<I>,
}

/// Builds cluster trees from a precomputed [`LinkageMatrix`].
#[derive(Debug, Clone, Default)]
pub struct LinkageTreeBuilder;

impl LinkageTreeBuilder {
    /// Create a builder.
    pub fn new() -> Self {
        Self
    }

    /// Reconstruct the tree rooted at the last merge of `linkage`.
    ///
    /// `images` and `identifiers` are indexed by item reference. Every item
    /// ends up under exactly one leaf; a build that cannot guarantee this
    /// fails instead of returning a partial tree.
    pub fn build<R: RepresentativeRenderer>(
        &self,
        renderer: &mut R,
        linkage: &LinkageMatrix,
        images: &[R::Image],
        identifiers: &[String],
    ) -> Result<ClusterNode> {
        linkage.validate()?;
        let n = linkage.n_items();
        check_len("images", n, images.len())?;
        check_len("identifiers", n, identifiers.len())?;
        let root_row = linkage.root_row().ok_or(Error::EmptyInput)?;

        let mut walk = Walk {
            linkage,
            images,
            identifiers,
            ids: ClusterIds::new(),
            memo: (0..2 * n - 1).map(|_| None).collect(),
        };

        walk.memo[linkage.merge_reference(root_row)] = Some(Slot::InProgress);
        let mut stack = vec![walk.open(root_row)?];

        while let Some(mut frame) = stack.pop() {
            if frame.resolved.len() < 2 {
                let expand = walk.resolve_side(&mut frame)?;
                stack.push(frame);
                if let Some(row) = expand {
                    stack.push(walk.open(row)?);
                }
                continue;
            }

            let (node, image) = walk.close(renderer, frame)?;
            match stack.last_mut() {
                Some(parent) => {
                    parent.children.push(node);
                    parent.resolved.push(image);
                }
                None => {
                    walk.check_coverage(root_row)?;
                    info!(
                        items = n,
                        clusters = walk.ids.issued(),
                        depth = node.depth(),
                        "built linkage tree"
                    );
                    return Ok(node);
                }
            }
        }

        Err(Error::Other("linkage walk ended without closing the root".into()))
    }
}

struct Walk<'a, I> {
    linkage: &'a LinkageMatrix,
    images: &'a [I],
    identifiers: &'a [String],
    ids: ClusterIds,
    memo: Vec<Option<Slot<I>>>,
}

impl<I: Clone> Walk<'_, I> {
    fn open(&mut self, row: usize) -> Result<Frame<I>> {
        let record = *self.linkage.get(row).ok_or(Error::ReferenceResolution {
            reference: self.linkage.merge_reference(row),
            row,
            reason: "merge row does not exist",
        })?;
        let id = self.ids.next_id();
        debug!(id = id.get(), row, a = record.a, b = record.b, "opening merge");
        Ok(Frame {
            row,
            record,
            id,
            children: Vec::with_capacity(2),
            resolved: Vec::with_capacity(2),
        })
    }

    /// Resolve the next unresolved side of `frame`.
    ///
    /// Returns the row to expand when the side is a fresh merge.
    fn resolve_side(&mut self, frame: &mut Frame<I>) -> Result<Option<usize>> {
        let raw = frame.record.side(frame.resolved.len());
        let row = frame.row;
        let fail = |reason| Error::ReferenceResolution {
            reference: raw,
            row,
            reason,
        };

        match self.linkage.reference(raw) {
            Reference::Item(item) => {
                if self.memo[raw].is_some() {
                    return Err(fail("item is referenced by more than one merge"));
                }
                self.memo[raw] = Some(Slot::Item);
                frame.children.push(ClusterNode::leaf(&self.identifiers[item]));
                frame.resolved.push(self.images[item].clone());
                Ok(None)
            }
            Reference::Merge(merge_row) => {
                if let Some(slot) = &self.memo[raw] {
                    return match slot {
                        Slot::Done(image) => {
                            debug!(reference = raw, "reusing resolved merge");
                            frame.resolved.push(image.clone());
                            Ok(None)
                        }
                        _ => Err(fail("merge is still being resolved")),
                    };
                }
                self.memo[raw] = Some(Slot::InProgress);
                Ok(Some(merge_row))
            }
        }
    }

    fn close<R>(&mut self, renderer: &mut R, frame: Frame<I>) -> Result<(ClusterNode, I)>
    where
        R: RepresentativeRenderer<Image = I>,
    {
        let members: Vec<&I> = frame.resolved.iter().collect();
        let rep = renderer.render(frame.id, &members)?;

        let mut node = ClusterNode::cluster(frame.id, rep.handle).with_size(frame.record.count);
        node.children = frame.children;
        debug!(id = frame.id.get(), row = frame.row, size = frame.record.count, "closed merge");

        self.memo[self.linkage.merge_reference(frame.row)] = Some(Slot::Done(rep.image.clone()));
        Ok((node, rep.image))
    }

    fn check_coverage(&self, root_row: usize) -> Result<()> {
        match (0..self.linkage.n_items()).find(|&i| self.memo[i].is_none()) {
            Some(item) => Err(Error::ReferenceResolution {
                reference: item,
                row: root_row,
                reason: "item is not reachable from the root merge",
            }),
            None => Ok(()),
        }
    }
}
