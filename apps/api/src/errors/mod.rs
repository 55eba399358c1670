//! Error handling for the wellness API.

pub mod error_code;
pub mod storage;
pub mod validation;

pub use error_code::ErrorCode;
pub use storage::StorageError;
pub use validation::{FieldError, FieldErrors, Validate};

#[cfg(test)]
mod tests_error_mapping;
