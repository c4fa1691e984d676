//! # Ceremony Client
//!
//! This module ties the pieces together: it runs a whole registration or
//! login ceremony against the server, from username to redirect.
//!
//! ## Ceremony Phases
//! Every ceremony walks the same line of phases
//! `Idle → FetchingOptions → Normalizing → AwaitingAuthenticator → Submitting`
//! and ends in `Redirected`, silently complete, or `Failed`. The current
//! phase is carried in the logs so a failure names the stage it happened in.
//!
//! ## Redirect Handling
//! The HTTP client is built with automatic redirects disabled. A 3xx from
//! the validation endpoint is not a transport detail here, it is the
//! server's "you are signed in, go there" instruction. The client resolves
//! the `Location` itself and performs the navigation request explicitly,
//! the way a browser navigates after `res.redirected`.

use reqwest::{header, redirect};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::authenticator::Authenticator;
use crate::ceremony::options;
use crate::ceremony::types::{
    AuthenticationOptionsResponse, ErrorMessage, OptionsRequest, RegistrationOptionsResponse,
};
use crate::ceremony::{authentication, registration, CeremonyPhase, Flow};
use crate::config::ClientConfig;
use crate::error::{CeremonyError, CeremonyResult};

/// How a successful ceremony ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CeremonyOutcome {
    /// The server redirected after validation and the client followed the
    /// resolved location
    Redirected { location: reqwest::Url },
    /// The server accepted the credential without redirecting
    Complete,
}

/// Runs passkey ceremonies against one server with one authenticator.
///
/// The client is cheap to keep around; the underlying connection pool is
/// reused across ceremonies. Ceremonies for the same user should be run one
/// at a time, matching what a single browser tab can do.
pub struct CeremonyClient<A> {
    http: reqwest::Client,
    config: ClientConfig,
    authenticator: A,
}

impl<A: Authenticator> CeremonyClient<A> {
    /// Build a client for the given server and authenticator.
    pub fn new(config: ClientConfig, authenticator: A) -> CeremonyResult<Self> {
        // Redirects mean navigation in this protocol, never follow them
        // behind the ceremony's back
        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(CeremonyClient { http, config, authenticator })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run a full registration ceremony for `username`.
    pub async fn register(&self, username: &str) -> CeremonyResult<CeremonyOutcome> {
        let mut phase = PhaseLog::start(Flow::Register);
        match self.registration_ceremony(username, &mut phase).await {
            Ok(outcome) => {
                phase.complete(&outcome);
                Ok(outcome)
            }
            Err(err) => Err(phase.fail(err)),
        }
    }

    /// Run a full login ceremony for `username`.
    pub async fn login(&self, username: &str) -> CeremonyResult<CeremonyOutcome> {
        let mut phase = PhaseLog::start(Flow::Login);
        match self.authentication_ceremony(username, &mut phase).await {
            Ok(outcome) => {
                phase.complete(&outcome);
                Ok(outcome)
            }
            Err(err) => Err(phase.fail(err)),
        }
    }

    async fn registration_ceremony(
        &self,
        username: &str,
        phase: &mut PhaseLog,
    ) -> CeremonyResult<CeremonyOutcome> {
        // Checked before any traffic, an empty form never reaches the server
        if username.is_empty() {
            return Err(CeremonyError::MissingInput);
        }

        phase.enter(CeremonyPhase::FetchingOptions);
        let envelope: RegistrationOptionsResponse =
            self.fetch_options(Flow::Register, username).await?;

        phase.enter(CeremonyPhase::Normalizing);
        let normalized = options::normalize_registration(envelope.public_key)?;

        phase.enter(CeremonyPhase::AwaitingAuthenticator);
        let payload = registration::create_credential(
            &self.authenticator,
            normalized,
            self.config.authenticator_timeout,
        )
        .await?;

        phase.enter(CeremonyPhase::Submitting);
        self.submit(Flow::Register, &payload).await
    }

    async fn authentication_ceremony(
        &self,
        username: &str,
        phase: &mut PhaseLog,
    ) -> CeremonyResult<CeremonyOutcome> {
        if username.is_empty() {
            return Err(CeremonyError::MissingInput);
        }

        phase.enter(CeremonyPhase::FetchingOptions);
        let envelope: AuthenticationOptionsResponse =
            self.fetch_options(Flow::Login, username).await?;

        phase.enter(CeremonyPhase::Normalizing);
        let normalized = options::normalize_authentication(envelope.public_key)?;

        phase.enter(CeremonyPhase::AwaitingAuthenticator);
        let payload = authentication::assert_credential(
            &self.authenticator,
            normalized,
            self.config.authenticator_timeout,
        )
        .await?;

        phase.enter(CeremonyPhase::Submitting);
        self.submit(Flow::Login, &payload).await
    }

    /// Post the username and parse this flow's options envelope.
    async fn fetch_options<T: DeserializeOwned>(
        &self,
        flow: Flow,
        username: &str,
    ) -> CeremonyResult<T> {
        let response = self
            .http
            .post(self.config.options_url(flow))
            .json(&OptionsRequest { username: username.to_string() })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(flow, flow.default_fetch_message(), response).await);
        }

        // A body that parses but misses required fields is the same failure
        // as one that is not options at all: unusable options
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| CeremonyError::InvalidOptions(err.to_string()))
    }

    /// Post the finished credential and interpret the verdict.
    async fn submit<P: Serialize>(&self, flow: Flow, payload: &P) -> CeremonyResult<CeremonyOutcome> {
        let response = self
            .http
            .post(self.config.validate_url(flow))
            .json(payload)
            .send()
            .await?;

        // Check for redirection before success: a 303 is the happy path
        if response.status().is_redirection() {
            let target = Self::redirect_target(&response)?;
            self.navigate(target).await
        } else if response.status().is_success() {
            Ok(CeremonyOutcome::Complete)
        } else {
            Err(Self::rejection(flow, flow.default_validate_message(), response).await)
        }
    }

    /// Turn a non-success response into `ServerRejected`, preferring the
    /// server's own `message` over the flow's default text.
    async fn rejection(flow: Flow, fallback: &str, response: reqwest::Response) -> CeremonyError {
        let status = response.status();
        let message = response
            .text()
            .await
            .ok()
            .and_then(|body| serde_json::from_str::<ErrorMessage>(&body).ok())
            .and_then(|parsed| parsed.message)
            .unwrap_or_else(|| fallback.to_string());

        tracing::warn!(%flow, %status, %message, "server rejected the request");
        CeremonyError::ServerRejected { message }
    }

    /// Resolve the `Location` header against the URL that was requested.
    fn redirect_target(response: &reqwest::Response) -> CeremonyResult<reqwest::Url> {
        let location = response
            .headers()
            .get(header::LOCATION)
            .ok_or_else(|| CeremonyError::InvalidRedirect("no location header".to_string()))?
            .to_str()
            .map_err(|_| CeremonyError::InvalidRedirect("location header is not text".to_string()))?;

        // Servers send relative locations like "/task"
        response
            .url()
            .join(location)
            .map_err(|err| CeremonyError::InvalidRedirect(err.to_string()))
    }

    /// Perform the navigation request for a followed redirect.
    ///
    /// The ceremony is already verified at this point; the landing page's
    /// own status is not interpreted, only transport failures surface.
    async fn navigate(&self, location: reqwest::Url) -> CeremonyResult<CeremonyOutcome> {
        tracing::info!(%location, "following post-ceremony redirect");
        self.http.get(location.clone()).send().await?;
        Ok(CeremonyOutcome::Redirected { location })
    }
}

// Phase bookkeeping for one ceremony run. Lives in the logs only; the
// public API reports phases through error kinds instead.
struct PhaseLog {
    flow: Flow,
    phase: CeremonyPhase,
}

impl PhaseLog {
    fn start(flow: Flow) -> Self {
        tracing::debug!(%flow, "ceremony started");
        PhaseLog { flow, phase: CeremonyPhase::Idle }
    }

    fn enter(&mut self, next: CeremonyPhase) {
        self.phase = next;
        tracing::debug!(flow = %self.flow, phase = ?self.phase, "ceremony phase");
    }

    fn complete(&mut self, outcome: &CeremonyOutcome) {
        match outcome {
            CeremonyOutcome::Redirected { location } => {
                self.phase = CeremonyPhase::Redirected;
                tracing::info!(flow = %self.flow, %location, "ceremony finished");
            }
            CeremonyOutcome::Complete => {
                tracing::info!(flow = %self.flow, "ceremony finished without redirect");
            }
        }
    }

    fn fail(&mut self, err: CeremonyError) -> CeremonyError {
        tracing::warn!(flow = %self.flow, failed_in = ?self.phase, error = %err, "ceremony failed");
        self.phase = CeremonyPhase::Failed;
        err
    }
}
