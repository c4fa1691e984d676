//! # Ceremony Wire Types
//!
//! This module defines the request/response types exchanged with the
//! ceremony server. These structs are automatically serialized/deserialized
//! to/from JSON.
//!
//! ## API Flow
//! Each ceremony has two requests from the client's point of view
//! - Options: client posts the username, server answers with a challenge
//! - Validate: client posts the finished credential, server verifies it
//!
//! ## Why `#[serde(flatten)]` maps?
//! Servers keep growing their option payloads (`authenticatorSelection`,
//! `attestation`, `extensions`, ...). The client only ever interprets the
//! binary identifier fields, so everything else is captured into a
//! `Map<String, Value>` and carried through untouched instead of being
//! modeled field by field and silently dropped on the floor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request for ceremony options, identical for both flows
///
/// ## Example JSON
/// ```json
/// {
///   "username": "alice"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsRequest {
    /// Username to register or authenticate as
    pub username: String,
}

/// Envelope the server wraps registration options in
///
/// Mirrors the browser API, where the same shape is handed straight to
/// `navigator.credentials.create({ publicKey: ... })`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptionsResponse {
    pub public_key: RegistrationOptions,
}

/// Creation options as they arrive from the server
///
/// Only `challenge` and `user` are interpreted here; both carry unpadded
/// base64url where an authenticator needs raw bytes.
///
/// ## Example JSON
/// ```json
/// {
///   "challenge": "bXkgY2hhbGxlbmdl",
///   "user": { "id": "dXNlci1pZA", "name": "alice", "displayName": "Alice" },
///   "rp": { "id": "localhost", "name": "Demo" },
///   "pubKeyCredParams": [{ "type": "public-key", "alg": -7 }]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptions {
    /// Server-issued challenge, base64url
    pub challenge: String,

    /// The account this credential will belong to
    pub user: UserEntity,

    /// Everything else the server sent, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// User entry inside registration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntity {
    /// Server-side user handle, base64url
    pub id: String,

    /// Display name and friends, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Envelope the server wraps authentication options in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOptionsResponse {
    pub public_key: AuthenticationOptions,
}

/// Request options as they arrive from the server
///
/// `allowCredentials` is optional: a server running discoverable-credential
/// login omits it and lets the authenticator pick the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOptions {
    /// Server-issued challenge, base64url
    pub challenge: String,

    /// Credentials the server will accept, in preference order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_credentials: Option<Vec<CredentialDescriptor>>,

    /// Everything else the server sent, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of the `allowCredentials` list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialDescriptor {
    /// Credential ID, base64url
    pub id: String,

    /// Type and transports, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Finished registration as posted to `/auth/validate-register`
///
/// Field names follow the browser's `PublicKeyCredential` serialization,
/// including the `clientDataJSON` capitalization that `camelCase` renaming
/// alone would get wrong.
///
/// ## Example JSON
/// ```json
/// {
///   "id": "ASdQ",
///   "rawId": "ASdQ",
///   "response": { "attestationObject": "o2Nm...", "clientDataJSON": "eyJ0..." },
///   "type": "public-key"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationFinishRequest {
    /// Credential identifier as the authenticator reported it
    pub id: String,

    /// The same identifier re-encoded from raw bytes
    pub raw_id: String,

    pub response: WireAttestationResponse,

    /// `type` is a Rust keyword, hence the explicit rename
    #[serde(rename = "type")]
    pub credential_type: String,
}

/// Attestation payload inside [`RegistrationFinishRequest`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAttestationResponse {
    pub attestation_object: String,

    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
}

/// Finished login as posted to `/auth/validate-login`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationFinishRequest {
    pub id: String,

    pub raw_id: String,

    pub response: WireAssertionResponse,

    #[serde(rename = "type")]
    pub credential_type: String,
}

/// Assertion payload inside [`AuthenticationFinishRequest`]
///
/// `userHandle` is omitted entirely, not sent as `null`, when the
/// authenticator disclosed no handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAssertionResponse {
    pub authenticator_data: String,

    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,

    pub signature: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<String>,
}

/// Error body the server attaches to rejected ceremony requests
///
/// ## Example JSON
/// ```json
/// { "message": "User already exists" }
/// ```
///
/// `message` is optional so a bare `{}` or an unrelated body still parses
/// and falls back to the flow's default text.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorMessage {
    #[serde(default)]
    pub message: Option<String>,
}
