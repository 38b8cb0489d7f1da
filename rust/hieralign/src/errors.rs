use std::path::PathBuf;

#[derive(Debug)]
pub enum DataProcessingError {
    ExpectedSlicesSameLength {
        expected: usize,
        other: usize,
        context: String,
    },
    MatrixTooLarge {
        size: usize,
    },
    InvalidChunkLength {
        chunk_len: usize,
    },
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: String,
    },
    ExpectedFiniteNonNanData {
        context: String,
    },
    /// The accepted clusters do not cover every row exactly once.
    InvalidPartition {
        context: String,
    },
}

impl std::fmt::Display for DataProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExpectedSlicesSameLength {
                expected,
                other,
                context,
            } => write!(
                f,
                "Expected slices of the same length ({} != {}) in {}",
                expected, other, context
            ),
            Self::MatrixTooLarge { size } => write!(
                f,
                "A symmetric matrix of size {} does not fit in addressable memory",
                size
            ),
            Self::InvalidChunkLength { chunk_len } => {
                write!(f, "Invalid matrix chunk length: {}", chunk_len)
            }
            Self::IndexOutOfBounds {
                index,
                len,
                context,
            } => write!(
                f,
                "Index {} out of bounds for length {} in {}",
                index, len, context
            ),
            Self::ExpectedFiniteNonNanData { context } => {
                write!(f, "Expected finite, non-NaN data in {}", context)
            }
            Self::InvalidPartition { context } => {
                write!(f, "Tree cut is not a partition of the rows: {}", context)
            }
        }
    }
}

/// Everything that can stop an alignment run.
///
/// `Canceled` is not a failure of the data, it is returned when the
/// caller flips the cancellation token mid-run.
#[derive(Debug)]
pub enum AlignmentError {
    Configuration {
        msg: String,
    },
    DuplicateSample {
        sample: String,
    },
    DuplicateSampleInCluster {
        sample: String,
        cluster: usize,
    },
    Canceled,
    DataProcessing(DataProcessingError),
    Io {
        source: std::io::Error,
        path: Option<PathBuf>,
    },
    Parse {
        msg: String,
    },
}

impl AlignmentError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration { msg: msg.into() }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse { msg: msg.into() }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

impl std::fmt::Display for AlignmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration { msg } => write!(f, "Invalid alignment parameters: {}", msg),
            Self::DuplicateSample { sample } => write!(
                f,
                "Sample '{}' appears in more than one feature list",
                sample
            ),
            Self::DuplicateSampleInCluster { sample, cluster } => write!(
                f,
                "Cluster {} holds more than one row from sample '{}'",
                cluster, sample
            ),
            Self::Canceled => write!(f, "Alignment was canceled"),
            Self::DataProcessing(e) => write!(f, "{}", e),
            Self::Io { source, path } => match path {
                Some(path) => write!(f, "Error accessing {}: {}", path.display(), source),
                None => write!(f, "I/O error: {}", source),
            },
            Self::Parse { msg } => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for AlignmentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AlignmentError>;

impl From<DataProcessingError> for AlignmentError {
    fn from(x: DataProcessingError) -> Self {
        Self::DataProcessing(x)
    }
}

impl From<std::io::Error> for AlignmentError {
    fn from(x: std::io::Error) -> Self {
        Self::Io {
            source: x,
            path: None,
        }
    }
}

impl From<std::num::ParseIntError> for AlignmentError {
    fn from(x: std::num::ParseIntError) -> Self {
        Self::Parse { msg: x.to_string() }
    }
}

impl From<std::num::ParseFloatError> for AlignmentError {
    fn from(x: std::num::ParseFloatError) -> Self {
        Self::Parse { msg: x.to_string() }
    }
}

impl From<serde_json::Error> for AlignmentError {
    fn from(val: serde_json::Error) -> Self {
        AlignmentError::Parse {
            msg: val.to_string(),
        }
    }
}
