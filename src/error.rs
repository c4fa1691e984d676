//! # Error Handling
//!
//! This module defines the error type for ceremony failures and handles
//! converting failures into user-facing prompt text.
//!
//! ## Learning Points
//! - Rust error handling with `Result<T, E>`
//! - The `thiserror` crate for deriving error traits
//! - Separating diagnostic detail (logs) from user-facing text (prompts)
//! - Wrapping a nested error enum with `#[from]`

use thiserror::Error; // Simplifies error type creation with derive macros

use crate::authenticator::AuthenticatorError;

/// Ceremony-wide error type
///
/// This enum represents every way a registration or login ceremony can fail.
/// Each variant corresponds to a different stage of the ceremony, so callers
/// can tell "the server said no" apart from "the user walked away".
///
/// ## The `#[derive(Error)]` macro
/// The `thiserror::Error` derive macro automatically implements:
/// - `std::error::Error` trait
/// - `Display` trait (using the `#[error(...)]` messages)
/// - Automatic conversion from source errors (using `#[from]`)
///
/// ## The `#[from]` attribute
/// This enables automatic conversion using the `?` operator. For example:
/// ```ignore
/// let bytes = BASE64_URL_SAFE_NO_PAD.decode(wire)?;
/// // The ? automatically converts base64::DecodeError to MalformedEncoding
/// ```
#[derive(Error, Debug)]
pub enum CeremonyError {
    /// The caller started a ceremony without a username
    ///
    /// Detected before any network traffic, so an empty form submit
    /// never reaches the server.
    #[error("No username provided")]
    MissingInput,

    /// A binary field on the wire was not valid unpadded base64url
    ///
    /// The `#[from]` attribute automatically implements
    /// `From<base64::DecodeError>` for CeremonyError, so decode errors
    /// convert with the `?` operator
    #[error("Malformed base64url data: {0}")]
    MalformedEncoding(#[from] base64::DecodeError),

    /// The server sent ceremony options the client cannot use
    ///
    /// Common causes: missing `publicKey` envelope, empty challenge,
    /// undecodable binary identifier
    #[error("Invalid ceremony options: {0}")]
    InvalidOptions(String),

    /// The server rejected a ceremony request
    ///
    /// Carries the server's own explanation when the error body had a
    /// `message` field, otherwise a flow-specific default
    #[error("Server rejected the request: {message}")]
    ServerRejected { message: String },

    /// The platform authenticator failed or refused
    ///
    /// Groups cancellation, unavailability, policy violations and the
    /// rest of the [`AuthenticatorError`] kinds under one variant
    #[error("Authenticator error: {0}")]
    Authenticator(#[from] AuthenticatorError),

    /// The authenticator did not answer within the configured deadline
    #[error("Authenticator timed out")]
    AuthenticatorTimeout,

    /// The server redirected somewhere the client cannot resolve
    ///
    /// A 3xx without a `Location` header, or a `Location` value that is
    /// not a resolvable URL
    #[error("Invalid redirect target: {0}")]
    InvalidRedirect(String),

    /// Transport errors (reqwest library errors)
    ///
    /// Connection refused, DNS failure, TLS trouble, or a body that
    /// stopped arriving halfway
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Convert a CeremonyError into text fit for an end-user prompt
///
/// The embedding UI shows whatever this returns, the same way the browser
/// demo raised `alert(err.message)`.
///
/// ## How it works
/// 1. Match the error variant
/// 2. Log detailed error information (for client debugging)
/// 3. Create a user-friendly message (hide transport and parsing details)
impl CeremonyError {
    pub fn user_message(&self) -> String {
        match self {
            CeremonyError::MissingInput => "Please enter a username".to_string(),

            // The server's message is written for end users, pass it through
            CeremonyError::ServerRejected { message } => message.clone(),

            CeremonyError::Authenticator(AuthenticatorError::Cancelled) => {
                "The request was cancelled".to_string()
            }
            CeremonyError::Authenticator(AuthenticatorError::Unavailable) => {
                "This device has no usable authenticator".to_string()
            }
            CeremonyError::Authenticator(AuthenticatorError::NoMatchingCredential) => {
                "No matching passkey was found for this site".to_string()
            }
            CeremonyError::Authenticator(AuthenticatorError::ConstraintViolation(detail)) => {
                tracing::warn!(%detail, "authenticator refused the options");
                "This passkey cannot be used here".to_string()
            }
            CeremonyError::Authenticator(AuthenticatorError::Platform(detail)) => {
                // Log detailed error for debugging (not shown to user)
                tracing::error!(%detail, "authenticator platform failure");
                "The authenticator failed unexpectedly".to_string()
            }
            CeremonyError::AuthenticatorTimeout => {
                "The authenticator did not respond in time".to_string()
            }

            CeremonyError::MalformedEncoding(e) => {
                tracing::error!(error = %e, "undecodable binary field");
                "The server sent unusable data".to_string()
            }
            CeremonyError::InvalidOptions(detail) => {
                tracing::error!(%detail, "unusable ceremony options");
                "The server sent unusable sign-in options".to_string()
            }
            CeremonyError::InvalidRedirect(detail) => {
                tracing::error!(%detail, "unresolvable redirect");
                "The server sent a broken redirect".to_string()
            }
            CeremonyError::Network(e) => {
                tracing::error!(error = %e, "transport failure");
                // Return generic message to user (don't leak URLs or addresses)
                "Could not reach the server".to_string()
            }
        }
    }
}

/// Convenience type alias for Results using CeremonyError
///
/// Instead of writing `Result<Vec<u8>, CeremonyError>` everywhere,
/// we can write `CeremonyResult<Vec<u8>>` which is shorter and more readable.
///
/// Example usage:
/// ```ignore
/// pub fn decode(wire: &str) -> CeremonyResult<Vec<u8>> {
///     Ok(BASE64_URL_SAFE_NO_PAD.decode(wire)?)
/// }
/// ```
pub type CeremonyResult<T> = Result<T, CeremonyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_prompts_for_username() {
        assert_eq!(CeremonyError::MissingInput.user_message(), "Please enter a username");
    }

    #[test]
    fn server_message_passes_through_verbatim() {
        let err = CeremonyError::ServerRejected { message: "User already exists".to_string() };
        assert_eq!(err.user_message(), "User already exists");
    }

    #[test]
    fn cancellation_is_not_blamed_on_the_server() {
        let err = CeremonyError::Authenticator(AuthenticatorError::Cancelled);
        assert_eq!(err.user_message(), "The request was cancelled");
    }

    #[test]
    fn decode_errors_convert_via_question_mark() {
        fn inner() -> CeremonyResult<Vec<u8>> {
            crate::codec::decode("not base64url!")
        }
        assert!(matches!(inner(), Err(CeremonyError::MalformedEncoding(_))));
    }

    #[test]
    fn internal_detail_stays_out_of_user_text() {
        let err = CeremonyError::InvalidOptions("missing field `challenge`".to_string());
        assert!(!err.user_message().contains("challenge"));
    }
}
