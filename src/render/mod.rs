//! Representative images for cluster nodes.
//!
//! Tree builders never blend or write images themselves. They hand the
//! members of a node to a [`RepresentativeRenderer`] and record the handle it
//! returns as the node's preview. The renderer also returns the blended
//! value so that linkage reconstruction can average two representatives
//! without going back to every raw item.
//!
//! | Renderer | Image type | Persistence |
//! |----------|------------|-------------|
//! | [`InMemoryRenderer`] | any [`Blend`] | none, handle is `<prefix>-<id>` |
//! | `JpegRenderer` | `RgbImage` | `<dir>/<prefix>-<id>.JPEG` |

#[cfg(feature = "imaging")]
mod jpeg;

#[cfg(feature = "imaging")]
pub use jpeg::JpegRenderer;

use crate::error::{Error, Result};
use crate::hierarchy::ClusterId;

/// Pixel-wise (or component-wise) mean of a group.
pub trait Blend: Sized + Clone {
    /// Blend the members into one representative value.
    fn blend(members: &[&Self]) -> Result<Self>;
}

impl Blend for Vec<f32> {
    fn blend(members: &[&Self]) -> Result<Self> {
        let first = members
            .first()
            .ok_or_else(|| Error::RenderFailure("no members to blend".into()))?;
        let dim = first.len();
        let mut out = vec![0.0f32; dim];
        for member in members {
            if member.len() != dim {
                return Err(Error::RenderFailure(format!(
                    "member has {} components, expected {dim}",
                    member.len()
                )));
            }
            for (acc, v) in out.iter_mut().zip(member.iter()) {
                *acc += v;
            }
        }
        let n = members.len() as f32;
        for v in out.iter_mut() {
            *v /= n;
        }
        Ok(out)
    }
}

/// A rendered representative: the persisted handle and the blended value.
#[derive(Debug, Clone, PartialEq)]
pub struct Representative<I> {
    /// Opaque handle (usually a path) recorded as the node's preview.
    pub handle: String,
    /// The blended image.
    pub image: I,
}

/// Service that renders and persists one representative per cluster node.
pub trait RepresentativeRenderer {
    /// Raw image type.
    type Image: Clone;

    /// Render a representative for `members` under cluster `id`.
    fn render(
        &mut self,
        id: ClusterId,
        members: &[&Self::Image],
    ) -> Result<Representative<Self::Image>>;
}

/// One call made to an [`InMemoryRenderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRecord {
    /// Cluster id the render was made for.
    pub id: ClusterId,
    /// Number of images blended.
    pub members: usize,
    /// Handle returned.
    pub handle: String,
}

/// Renderer that blends in memory and persists nothing.
///
/// Every call is recorded in order, which makes the side-effect sequence of
/// a build observable.
#[derive(Debug, Clone)]
pub struct InMemoryRenderer<I> {
    prefix: String,
    records: Vec<RenderRecord>,
    _image: core::marker::PhantomData<fn() -> I>,
}

impl<I: Blend> InMemoryRenderer<I> {
    /// Create a renderer whose handles look like `<prefix>-<id>`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            records: Vec::new(),
            _image: core::marker::PhantomData,
        }
    }

    /// Calls made so far, in call order.
    pub fn records(&self) -> &[RenderRecord] {
        &self.records
    }
}

impl<I: Blend> RepresentativeRenderer for InMemoryRenderer<I> {
    type Image = I;

    fn render(&mut self, id: ClusterId, members: &[&I]) -> Result<Representative<I>> {
        let image = I::blend(members)?;
        let handle = id.file_stem(&self.prefix);
        self.records.push(RenderRecord {
            id,
            members: members.len(),
            handle: handle.clone(),
        });
        Ok(Representative { handle, image })
    }
}
