//! # Passkey Registration Driver
//!
//! This module handles the client-side middle of a registration ceremony:
//! between "the server sent creation options" and "the client posts the
//! finished credential".
//!
//! ## Registration Flow
//! 1. **Create**: Hand decoded options to the authenticator
//! 2. **Encode**: Re-encode the credential's binary parts for the wire
//!
//! ## Security Concepts
//! - **Challenge**: Random value the authenticator signs over to prove
//!   credential ownership; decoded by the normalizer, consumed here
//! - **Attestation Object**: Authenticator-produced CBOR the server
//!   verifies; opaque bytes to this client
//! - The private key never surfaces here. The authenticator keeps it; this
//!   driver only ever sees public material.

use std::time::Duration;

use crate::authenticator::Authenticator;
use crate::ceremony::options::NormalizedRegistrationOptions;
use crate::ceremony::types::{RegistrationFinishRequest, WireAttestationResponse};
use crate::ceremony::with_deadline;
use crate::codec;
use crate::error::CeremonyResult;

/// Drive the authenticator through credential creation
///
/// This is the authenticator step of registration. The options bundle is
/// consumed: one normalization feeds exactly one authenticator interaction.
///
/// ## Flow
/// 1. Pass the decoded options to `Authenticator::create`, under the
///    deadline when one is configured
/// 2. Base64url-encode `rawId`, `attestationObject` and `clientDataJSON`
/// 3. Assemble the validation payload in browser field order
///
/// ## Parameters
/// - `authenticator`: Platform boundary that actually mints the credential
/// - `options`: Decoded creation options from the normalizer
/// - `deadline`: Upper bound for the interaction, `None` to wait forever
///
/// ## Returns
/// [`RegistrationFinishRequest`] ready to post to the validation endpoint.
///
/// ## Errors
/// - `Authenticator`: The user cancelled, no authenticator was usable, or
///   the options violated authenticator policy
/// - `AuthenticatorTimeout`: The deadline elapsed first
pub async fn create_credential<A>(
    authenticator: &A,
    options: NormalizedRegistrationOptions,
    deadline: Option<Duration>,
) -> CeremonyResult<RegistrationFinishRequest>
where
    A: Authenticator + ?Sized,
{
    // The authenticator does the cryptography; this call is where the user
    // touches their key or scans their finger
    let created = with_deadline(deadline, authenticator.create(options)).await?;

    tracing::debug!(credential = %created.id, "authenticator created a credential");

    // Binary parts go back onto the wire as unpadded base64url, the same
    // encoding they arrived in
    Ok(RegistrationFinishRequest {
        id: created.id,
        raw_id: codec::encode(&created.raw_id),
        response: WireAttestationResponse {
            attestation_object: codec::encode(&created.response.attestation_object),
            client_data_json: codec::encode(&created.response.client_data_json),
        },
        credential_type: created.credential_type,
    })
}
