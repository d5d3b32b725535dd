//! Error types for etiquetar operations.
//!
//! Configuration errors (dimension mismatches, bad indices, an empty
//! supported-combination list) and persistence errors are surfaced to the
//! caller; numerical edge cases in the softmax path are absorbed by the
//! stable log-sum-exp computation and never raised here.

use std::fmt;

/// Main error type for etiquetar operations.
///
/// # Examples
///
/// ```
/// use etiquetar::error::EtiquetarError;
///
/// let err = EtiquetarError::DimensionMismatch {
///     expected: "num_features=4".to_string(),
///     actual: "7".to_string(),
/// };
/// assert!(err.to_string().contains("dimension mismatch"));
/// ```
#[derive(Debug)]
pub enum EtiquetarError {
    /// Input dimensions don't match the model's declared dimensions.
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// A class or supported-combination index outside the valid range.
    IndexOutOfRange {
        /// What kind of index was addressed
        what: &'static str,
        /// Index requested
        index: usize,
        /// Number of valid entries
        len: usize,
    },

    /// The model holds no supported combinations, so prediction has no
    /// candidate to return.
    EmptySupport,

    /// I/O error (file not found, permission denied, etc.).
    Io(std::io::Error),

    /// Invalid or corrupt model format.
    FormatError {
        /// Error description
        message: String,
    },

    /// Unsupported format version.
    UnsupportedVersion {
        /// Version found
        found: u32,
        /// Maximum supported version
        supported: u32,
    },

    /// Checksum verification failed.
    ChecksumMismatch {
        /// Expected checksum
        expected: u32,
        /// Actual checksum
        actual: u32,
    },

    /// Serialization/deserialization error.
    Serialization(String),
}

impl fmt::Display for EtiquetarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtiquetarError::DimensionMismatch { expected, actual } => {
                write!(f, "dimension mismatch: expected {expected}, got {actual}")
            }
            EtiquetarError::IndexOutOfRange { what, index, len } => {
                write!(f, "{what} index {index} out of range (len={len})")
            }
            EtiquetarError::EmptySupport => {
                write!(f, "no supported label combinations configured")
            }
            EtiquetarError::Io(e) => write!(f, "I/O error: {e}"),
            EtiquetarError::FormatError { message } => {
                write!(f, "invalid model format: {message}")
            }
            EtiquetarError::UnsupportedVersion { found, supported } => {
                write!(
                    f,
                    "unsupported format version: found {found}, max supported {supported}"
                )
            }
            EtiquetarError::ChecksumMismatch { expected, actual } => {
                write!(
                    f,
                    "checksum mismatch: expected 0x{expected:08X}, got 0x{actual:08X}"
                )
            }
            EtiquetarError::Serialization(msg) => write!(f, "serialization error: {msg}"),
        }
    }
}

impl std::error::Error for EtiquetarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EtiquetarError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EtiquetarError {
    fn from(err: std::io::Error) -> Self {
        EtiquetarError::Io(err)
    }
}

impl EtiquetarError {
    /// Create a dimension mismatch error with descriptive context.
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, EtiquetarError>;
