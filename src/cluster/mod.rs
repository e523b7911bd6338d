//! Clustering algorithms that feed tree construction.
//!
//! Tree builders treat these as black boxes behind two seams:
//!
//! - [`Partitioner`]: split rows into `k` labeled groups (recursive trees)
//! - [`Projector`]: place rows in the plane (coordinate trails)
//!
//! Agglomerative linkage is computed up front by
//! [`HierarchicalClustering::fit_linkage`] and handed to the linkage tree
//! builder as a finished [`LinkageMatrix`](crate::hierarchy::LinkageMatrix).
//!
//! ## Usage
//!
//! ```rust
//! use clustree::cluster::{Kmeans, Partitioner};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//!
//! let labels = Kmeans::new().with_seed(7).partition(&data, 2).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//! ```

mod traits;

#[cfg(feature = "cluster")]
mod hierarchical;
#[cfg(feature = "cluster")]
mod kmeans;
#[cfg(feature = "cluster")]
mod projection;

pub use traits::{Partitioner, Projector};

#[cfg(feature = "cluster")]
pub use hierarchical::{HierarchicalClustering, Linkage, Metric};
#[cfg(feature = "cluster")]
pub use kmeans::Kmeans;
#[cfg(feature = "cluster")]
pub use projection::PcaProjector;
