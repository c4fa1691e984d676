//! # Authenticator Boundary
//!
//! The ceremony client never talks to hardware or an OS credential store
//! directly. It hands fully decoded options to an [`Authenticator`]
//! implementation and gets raw credential bytes back, the same division of
//! labor the browser has with `navigator.credentials`.
//!
//! Implementations wrap whatever platform facility is available: an OS
//! passkey API, a CTAP transport, or a scripted fake in tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::ceremony::options::{NormalizedAuthenticationOptions, NormalizedRegistrationOptions};

/// Failures originating on the authenticator side of the boundary.
///
/// These map onto the outcomes a browser distinguishes when a
/// `navigator.credentials` call rejects, so the client can prompt the user
/// accordingly instead of showing one catch-all error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthenticatorError {
    /// The user dismissed the prompt or let it lapse
    #[error("the user cancelled the request")]
    Cancelled,

    /// No authenticator is present or usable on this device
    #[error("no usable authenticator on this device")]
    Unavailable,

    /// The options violate authenticator policy, for example a duplicate
    /// credential during registration or an unsupported algorithm
    #[error("options violate authenticator policy: {0}")]
    ConstraintViolation(String),

    /// Login only: the authenticator holds no credential matching the
    /// request
    #[error("no matching credential")]
    NoMatchingCredential,

    /// Anything else the platform reports, carried verbatim for the logs
    #[error("platform failure: {0}")]
    Platform(String),
}

/// Output of a registration ceremony's authenticator step, raw bytes still.
#[derive(Debug, Clone)]
pub struct AttestationResponse {
    /// CBOR attestation statement produced by the authenticator
    pub attestation_object: Vec<u8>,
    /// Serialized client data the authenticator signed over
    pub client_data_json: Vec<u8>,
}

/// Output of a login ceremony's authenticator step, raw bytes still.
#[derive(Debug, Clone)]
pub struct AssertionResponse {
    /// Authenticator data covered by the signature
    pub authenticator_data: Vec<u8>,
    /// Serialized client data the authenticator signed over
    pub client_data_json: Vec<u8>,
    /// Signature proving possession of the private key
    pub signature: Vec<u8>,
    /// User handle, when the authenticator discloses one
    pub user_handle: Option<Vec<u8>>,
}

/// A freshly created credential, before wire encoding.
#[derive(Debug, Clone)]
pub struct CreatedCredential {
    /// Credential identifier in its textual form
    pub id: String,
    /// The same identifier as raw bytes
    pub raw_id: Vec<u8>,
    /// Credential type, "public-key" for every authenticator in the wild
    pub credential_type: String,
    pub response: AttestationResponse,
}

/// A credential assertion, before wire encoding.
#[derive(Debug, Clone)]
pub struct AssertedCredential {
    pub id: String,
    pub raw_id: Vec<u8>,
    pub credential_type: String,
    pub response: AssertionResponse,
}

/// Platform boundary for credential ceremonies.
///
/// `create` backs registration (make a new credential for the decoded
/// options), `get` backs login (produce an assertion over the decoded
/// challenge). Options are passed by value: each normalized bundle is used
/// for exactly one authenticator interaction and never reused.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Create a new credential bound to the relying party in `options`.
    async fn create(
        &self,
        options: NormalizedRegistrationOptions,
    ) -> Result<CreatedCredential, AuthenticatorError>;

    /// Produce an assertion for the challenge in `options`, honoring the
    /// `allow_credentials` restriction when present.
    async fn get(
        &self,
        options: NormalizedAuthenticationOptions,
    ) -> Result<AssertedCredential, AuthenticatorError>;
}
