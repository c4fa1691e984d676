//! # Passkey Ceremony Client
//!
//! This crate is the client half of a WebAuthn/Passkey login system: the
//! part a browser page usually plays. It fetches ceremony options from a
//! server, turns their base64url fields into bytes, drives a platform
//! authenticator, and posts the finished credential back for validation.
//!
//! ## Key Concepts
//! - **WebAuthn**: Web Authentication API for passwordless authentication
//! - **Passkeys**: User-friendly implementation of WebAuthn credentials
//! - **Ceremony**: One complete register-or-login exchange, challenge to verdict
//!
//! ## Example
//! ```ignore
//! let config = ClientConfig::from_env()?;
//! let client = CeremonyClient::new(config, platform_authenticator)?;
//!
//! match client.login("alice").await {
//!     Ok(CeremonyOutcome::Redirected { location }) => open_page(location),
//!     Ok(CeremonyOutcome::Complete) => (),
//!     Err(err) => show_prompt(err.user_message()),
//! }
//! ```
//!
//! The authenticator itself is not in this crate; implement
//! [`Authenticator`] over whatever platform facility is available.

// Module declarations - organize code into logical components
pub mod authenticator; // Platform boundary (the navigator.credentials analog)
pub mod ceremony; // Ceremony wire types, normalization and drivers
pub mod client; // End-to-end ceremony runner
pub mod codec; // base64url <-> bytes conversion
pub mod config; // Configuration management (environment variables, settings)
pub mod error; // Error handling and custom error types
pub mod reload; // Development reload stream listener

pub use authenticator::{
    AssertedCredential, AssertionResponse, AttestationResponse, Authenticator, AuthenticatorError,
    CreatedCredential,
};
pub use ceremony::{CeremonyPhase, Flow};
pub use client::{CeremonyClient, CeremonyOutcome};
pub use config::ClientConfig;
pub use error::{CeremonyError, CeremonyResult};
pub use reload::{ReloadEvent, ReloadListener};
