//! Credential pairs, redacted token secrets, and decoded access-token claims.

pub mod claims;
pub mod credentials;
pub mod secret;

pub use claims::*;
pub use credentials::*;
pub use secret::*;
