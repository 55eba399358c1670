pub mod auth;
pub mod validated_json;

pub use auth::{Authenticated, MaybeAuthenticated};
pub use validated_json::ValidatedJson;
