//! Credential record, secret wrappers, and OAuth scope sets.

pub mod credentials;
pub mod scope;
pub mod secret;

pub use credentials::*;
pub use scope::*;
pub use secret::*;
