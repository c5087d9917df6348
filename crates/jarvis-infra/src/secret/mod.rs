//! Secret provider implementations.
//!
//! The credential is read once at startup through a chain built by
//! [`chain::build_secret_chain`]: environment variables first, then secret
//! files in the data directory.

pub mod chain;
pub mod env;
pub mod file;

pub use env::EnvSecretProvider;
pub use file::FileSecretProvider;
