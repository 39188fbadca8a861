//! Shared error-code contract.
//!
//! Every error enum in the crate implements [`ErrorCode`] so callers (the CLI,
//! or a UI layer embedding the library) can branch on a grepable code and a
//! retry hint without matching on concrete variants.

/// Grepable error code and retryable flag for structured error reporting.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
