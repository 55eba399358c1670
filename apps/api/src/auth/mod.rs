pub mod authorize;
pub mod claims;
pub mod credentials;
pub mod jwt;

use std::fmt;

pub use claims::{AuthContext, Identity, IdentityClaims, Role, TokenClass};

/// Progress of the auth gate through a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unchecked,
    Extracting,
    Verifying,
    Authenticated,
    Rejected,
}

impl GateState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            GateState::Unchecked => "unchecked",
            GateState::Extracting => "extracting",
            GateState::Verifying => "verifying",
            GateState::Authenticated => "authenticated",
            GateState::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, GateState::Authenticated | GateState::Rejected)
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
