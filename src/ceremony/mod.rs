//! # Ceremony Module
//!
//! This module contains the client half of the WebAuthn/Passkey ceremonies.
//!
//! ## Submodules
//! - `types`: Wire types exchanged with the ceremony server
//! - `options`: Decoding server options into authenticator-ready form
//! - `registration`: Creating a new passkey credential
//! - `authentication`: Logging in with an existing passkey
//!
//! ## Ceremony Flow Overview
//!
//! ### Registration (Creating a Passkey)
//! 1. Client posts the username to `/auth/register`
//! 2. Server answers with creation options wrapped in `publicKey`
//! 3. Client decodes the binary fields → `options::normalize_registration()`
//! 4. Authenticator creates the credential → `registration::create_credential()`
//! 5. Client posts the encoded credential to `/auth/validate-register`
//! 6. Server verifies and redirects to the signed-in page
//!
//! ### Authentication (Logging In)
//! 1. Client posts the username to `/auth/login`
//! 2. Server answers with request options wrapped in `publicKey`
//! 3. Client decodes the challenge and allow list → `options::normalize_authentication()`
//! 4. Authenticator signs the challenge → `authentication::assert_credential()`
//! 5. Client posts the encoded assertion to `/auth/validate-login`
//! 6. Server verifies the signature and redirects to the signed-in page

use std::{fmt, future::Future, time::Duration};

use crate::authenticator::AuthenticatorError;
use crate::error::{CeremonyError, CeremonyResult};

pub mod authentication;
pub mod options;
pub mod registration;
pub mod types;

/// Which of the two ceremonies is being run.
///
/// Everything except the endpoint paths and the shape of the authenticator
/// response is shared between them, so most of the client is written once
/// over `Flow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Create a new passkey for a username
    Register,
    /// Sign in with an existing passkey
    Login,
}

impl Flow {
    pub fn as_str(self) -> &'static str {
        match self {
            Flow::Register => "register",
            Flow::Login => "login",
        }
    }

    /// Server path that hands out ceremony options for this flow.
    pub fn options_path(self) -> &'static str {
        match self {
            Flow::Register => "auth/register",
            Flow::Login => "auth/login",
        }
    }

    /// Server path that verifies the finished ceremony for this flow.
    pub fn validate_path(self) -> &'static str {
        match self {
            Flow::Register => "auth/validate-register",
            Flow::Login => "auth/validate-login",
        }
    }

    /// Fallback user message when the options request fails without a
    /// server-provided explanation.
    pub fn default_fetch_message(self) -> &'static str {
        match self {
            Flow::Register => "Failed to fetch registration options",
            Flow::Login => "Failed to fetch login options",
        }
    }

    /// Fallback user message when validation fails without a
    /// server-provided explanation.
    pub fn default_validate_message(self) -> &'static str {
        match self {
            Flow::Register => "Failed to validate registration",
            Flow::Login => "Failed to validate login",
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stages a ceremony passes through, in order.
///
/// Used for logging and for reasoning about failures; a ceremony that fails
/// in `FetchingOptions` never touched the authenticator, one that fails in
/// `Submitting` already has a signed credential that the server refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyPhase {
    Idle,
    FetchingOptions,
    Normalizing,
    AwaitingAuthenticator,
    Submitting,
    Redirected,
    Failed,
}

/// Runs one authenticator interaction under the configured deadline.
///
/// With no deadline the interaction may take as long as the user needs,
/// which is how browsers behave unless the options say otherwise.
pub(crate) async fn with_deadline<T>(
    deadline: Option<Duration>,
    interaction: impl Future<Output = Result<T, AuthenticatorError>>,
) -> CeremonyResult<T> {
    match deadline {
        Some(limit) => match tokio::time::timeout(limit, interaction).await {
            Ok(outcome) => Ok(outcome?),
            Err(_) => Err(CeremonyError::AuthenticatorTimeout),
        },
        None => Ok(interaction.await?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- flow paths ----

    #[test]
    fn flows_use_their_own_endpoints() {
        assert_eq!(Flow::Register.options_path(), "auth/register");
        assert_eq!(Flow::Register.validate_path(), "auth/validate-register");
        assert_eq!(Flow::Login.options_path(), "auth/login");
        assert_eq!(Flow::Login.validate_path(), "auth/validate-login");
    }

    #[test]
    fn flow_displays_as_its_name() {
        assert_eq!(Flow::Register.to_string(), "register");
        assert_eq!(Flow::Login.to_string(), "login");
    }

    // ---- deadline handling ----

    #[tokio::test]
    async fn unbounded_interaction_completes() {
        let outcome = with_deadline(None, async { Ok::<_, AuthenticatorError>(7u8) }).await;
        assert_eq!(outcome.unwrap(), 7);
    }

    #[tokio::test]
    async fn stalled_interaction_times_out() {
        let outcome = with_deadline(
            Some(Duration::from_millis(20)),
            std::future::pending::<Result<u8, AuthenticatorError>>(),
        )
        .await;
        assert!(matches!(outcome, Err(CeremonyError::AuthenticatorTimeout)));
    }

    #[tokio::test]
    async fn authenticator_error_keeps_its_kind_under_deadline() {
        let outcome = with_deadline(Some(Duration::from_secs(1)), async {
            Err::<u8, _>(AuthenticatorError::Cancelled)
        })
        .await;
        assert!(matches!(
            outcome,
            Err(CeremonyError::Authenticator(AuthenticatorError::Cancelled))
        ));
    }
}
