//! Credential lookup for remote task sources.
//!
//! Credentials are opaque to the dedup core; only source adapters read them.

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    Missing(String),
}

impl Display for CredentialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "credential `{name}` is not set"),
        }
    }
}

impl Error for CredentialError {}

/// Username/password pair. `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Supplies credentials to a source adapter on demand.
pub trait CredentialProvider {
    fn credentials(&self) -> Result<Credentials, CredentialError>;
}
