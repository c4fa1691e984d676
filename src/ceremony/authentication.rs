use std::time::Duration;

use crate::authenticator::Authenticator;
use crate::ceremony::options::NormalizedAuthenticationOptions;
use crate::ceremony::types::{AuthenticationFinishRequest, WireAssertionResponse};
use crate::ceremony::with_deadline;
use crate::codec;
use crate::error::CeremonyResult;

pub async fn assert_credential<A>(
    authenticator: &A,
    options: NormalizedAuthenticationOptions,
    deadline: Option<Duration>,
) -> CeremonyResult<AuthenticationFinishRequest>
where
    A: Authenticator + ?Sized,
{
    // Sign the challenge
    let asserted = with_deadline(deadline, authenticator.get(options)).await?;

    tracing::debug!(credential = %asserted.id, "authenticator produced an assertion");

    // Re-encode binary parts for the wire; userHandle stays absent when the
    // authenticator disclosed none
    Ok(AuthenticationFinishRequest {
        id: asserted.id,
        raw_id: codec::encode(&asserted.raw_id),
        response: WireAssertionResponse {
            authenticator_data: codec::encode(&asserted.response.authenticator_data),
            client_data_json: codec::encode(&asserted.response.client_data_json),
            signature: codec::encode(&asserted.response.signature),
            user_handle: asserted.response.user_handle.as_deref().map(codec::encode),
        },
        credential_type: asserted.credential_type,
    })
}
