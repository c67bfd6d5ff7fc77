use std::path::PathBuf;

/// Result type alias for flutterkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for flutterkit operations
///
/// Soft failures (missing SDK, unreadable config output, spawn failures) are
/// deliberately *not* represented here; those surface as `None` at the call
/// site. This enum covers caller contract violations and genuine I/O faults.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A target file handed to a command builder is not inside the pub root
    #[error("target '{target}' is not within the pub root '{root}'")]
    TargetOutsideRoot { target: PathBuf, root: PathBuf },

    /// A requested feature is not available in the installed SDK version
    #[error("the Flutter SDK ({version}) is too old to {feature}")]
    UnsupportedFeature { feature: String, version: String },

    /// The alternate backend's Dart toolchain could not be resolved
    #[error("unable to find the Dart SDK: {message}")]
    ToolchainNotFound { message: String },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a target-outside-root error
    #[must_use]
    pub fn target_outside_root(target: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Error::TargetOutsideRoot {
            target: target.into(),
            root: root.into(),
        }
    }

    /// Create an unsupported feature error
    #[must_use]
    pub fn unsupported_feature(feature: impl Into<String>, version: impl Into<String>) -> Self {
        Error::UnsupportedFeature {
            feature: feature.into(),
            version: version.into(),
        }
    }

    /// Create a toolchain resolution error
    #[must_use]
    pub fn toolchain_not_found(message: impl Into<String>) -> Self {
        Error::ToolchainNotFound {
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_outside_root_display() {
        let err = Error::target_outside_root("/tmp/elsewhere/main.dart", "/tmp/app");
        assert_eq!(
            err.to_string(),
            "target '/tmp/elsewhere/main.dart' is not within the pub root '/tmp/app'"
        );
    }

    #[test]
    fn test_unsupported_feature_display() {
        let err = Error::unsupported_feature("debug tests", "0.5.0");
        assert_eq!(
            err.to_string(),
            "the Flutter SDK (0.5.0) is too old to debug tests"
        );
    }
}
