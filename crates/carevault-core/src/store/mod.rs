//! Secure credential store facade
//!
//! The public face of the store: put, get, delete and refresh checks over a
//! single protected payload. Nothing here returns an error. Every failure
//! degrades to "no credential", which callers answer by sending the user
//! back to sign-in.

mod builder;
mod facade;
mod status;

#[cfg(test)]
mod tests;

pub use builder::StoreBuilder;
pub use facade::SecureCredentialStore;
pub use status::CredentialStatus;
