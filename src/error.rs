use thiserror::Error;

/// Errors returned by fallible face preprocessing and recognition operations.
///
/// Not finding a face or an eye is *not* an error. Those outcomes are reported as `None`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("wrong shape for {context}: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("face recognition algorithm '{0}' is not supported (use Eigenfaces or Fisherfaces)")]
    UnsupportedAlgorithm(String),

    #[error("cannot train a face recognizer on an empty training set")]
    EmptyTrainingSet,

    #[error("training needs at least {required} distinct labels, found {found}")]
    NotEnoughClasses { found: usize, required: usize },

    #[error("training needs more than {classes} samples for {classes} labels, got {samples}")]
    NotEnoughSamples { samples: usize, classes: usize },

    #[error("image dimensions are zero")]
    EmptyImage,

    #[error("training data is degenerate: {0}")]
    DegenerateData(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
