use core::fmt;

/// Result alias for `clustree`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by tree construction, rendering and serialization.
///
/// Every variant aborts the build it occurs in: builders never hand back a
/// partially constructed tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Parallel inputs (features, images, identifiers) disagree in length.
    InputShapeMismatch {
        /// Which input was the wrong length.
        field: &'static str,
        /// Expected item count.
        expected: usize,
        /// Found item count.
        found: usize,
    },

    /// Feature rows of different widths.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// A partitioning step routed no items to one of the requested groups.
    EmptyPartition {
        /// Group label that came back empty.
        label: usize,
        /// Remaining depth budget at the split.
        depth: usize,
    },

    /// A linkage reference could not be resolved to a representative.
    ReferenceResolution {
        /// Raw reference value from the merge record.
        reference: usize,
        /// Merge row that carried the reference.
        row: usize,
        /// What went wrong.
        reason: &'static str,
    },

    /// The representative-image service failed.
    RenderFailure(String),

    /// Filesystem failure.
    Io(String),

    /// Document encoding failure.
    Serialization(String),

    /// Generic error with message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::InputShapeMismatch {
                field,
                expected,
                found,
            } => {
                write!(
                    f,
                    "input shape mismatch: {field} has {found} entries, expected {expected}"
                )
            }
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} items")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::EmptyPartition { label, depth } => {
                write!(f, "partition {label} is empty (depth budget {depth})")
            }
            Error::ReferenceResolution {
                reference,
                row,
                reason,
            } => {
                write!(
                    f,
                    "cannot resolve reference {reference} in merge row {row}: {reason}"
                )
            }
            Error::RenderFailure(msg) => write!(f, "representative render failed: {msg}"),
            Error::Io(msg) => write!(f, "i/o error: {msg}"),
            Error::Serialization(msg) => write!(f, "serialization error: {msg}"),
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
