//! quantmul error types

/// quantmul result type
pub type Result<T> = std::result::Result<T, KernelError>;

/// Errors reported by the kernel and its parameter helpers.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// Invalid argument to an operation
    #[error("invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// Argument name
        arg: &'static str,
        /// Why it's invalid
        reason: String,
    },

    /// Parameter file could not be read or written
    #[error("config error: {reason}")]
    Config {
        /// Description of what went wrong
        reason: String,
    },
}

impl KernelError {
    pub(crate) fn invalid(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument { arg, reason: reason.into() }
    }
}
