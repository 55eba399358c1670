//! Shared test support for the API crate: logging bootstrap and error
//! envelope assertions that do not depend on the API crate's own types.

pub mod envelope;
pub mod test_logging;

pub use envelope::{assert_error_envelope, ErrorEnvelopeLike};
