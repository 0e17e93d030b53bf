pub mod credentials;
pub mod error;
pub mod hasher;

#[cfg(test)]
mod tests;

pub use credentials::CredentialManager;
pub use error::AuthError;
pub use hasher::{Hasher, HashingConfig};
