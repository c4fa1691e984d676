//! # Options Normalization
//!
//! Ceremony options arrive as JSON with binary fields encoded as unpadded
//! base64url. Authenticators want raw bytes. This module is the pure
//! transformation between the two: decode the identifier fields, leave
//! everything else exactly as the server sent it.
//!
//! Normalization does no I/O and talks to no authenticator, so every edge
//! case is testable with plain data.

use serde_json::{Map, Value};

use crate::ceremony::types::{AuthenticationOptions, RegistrationOptions};
use crate::codec;
use crate::error::{CeremonyError, CeremonyResult};

/// Registration options ready to hand to an authenticator.
#[derive(Debug, Clone)]
pub struct NormalizedRegistrationOptions {
    pub challenge: Vec<u8>,
    pub user: NormalizedUserEntity,
    /// Untouched remainder of the server's options
    pub extra: Map<String, Value>,
}

/// User entry with its handle decoded.
#[derive(Debug, Clone)]
pub struct NormalizedUserEntity {
    pub id: Vec<u8>,
    pub extra: Map<String, Value>,
}

/// Authentication options ready to hand to an authenticator.
#[derive(Debug, Clone)]
pub struct NormalizedAuthenticationOptions {
    pub challenge: Vec<u8>,
    /// Accepted credentials in the server's preference order, `None` for
    /// discoverable-credential login
    pub allow_credentials: Option<Vec<NormalizedCredentialDescriptor>>,
    pub extra: Map<String, Value>,
}

/// One allow-list entry with its credential ID decoded.
#[derive(Debug, Clone)]
pub struct NormalizedCredentialDescriptor {
    pub id: Vec<u8>,
    pub extra: Map<String, Value>,
}

/// Decodes the binary fields of registration options.
///
/// `challenge` and `user.id` must be present, non-empty and valid
/// base64url; anything else fails with
/// [`CeremonyError::InvalidOptions`] naming the offending field.
pub fn normalize_registration(
    options: RegistrationOptions,
) -> CeremonyResult<NormalizedRegistrationOptions> {
    let RegistrationOptions { challenge, user, extra } = options;

    Ok(NormalizedRegistrationOptions {
        challenge: decode_required("challenge", &challenge)?,
        user: NormalizedUserEntity {
            id: decode_required("user.id", &user.id)?,
            extra: user.extra,
        },
        extra,
    })
}

/// Decodes the binary fields of authentication options.
///
/// The allow list keeps its order; the authenticator is supposed to try
/// candidates in the server's preference order.
pub fn normalize_authentication(
    options: AuthenticationOptions,
) -> CeremonyResult<NormalizedAuthenticationOptions> {
    let AuthenticationOptions { challenge, allow_credentials, extra } = options;

    let allow_credentials = match allow_credentials {
        Some(descriptors) => Some(
            descriptors
                .into_iter()
                .enumerate()
                .map(|(index, descriptor)| {
                    Ok(NormalizedCredentialDescriptor {
                        id: decode_required(
                            &format!("allowCredentials[{index}].id"),
                            &descriptor.id,
                        )?,
                        extra: descriptor.extra,
                    })
                })
                .collect::<CeremonyResult<Vec<_>>>()?,
        ),
        None => None,
    };

    Ok(NormalizedAuthenticationOptions {
        challenge: decode_required("challenge", &challenge)?,
        allow_credentials,
        extra,
    })
}

// A required binary identifier: present, non-empty, decodable. Decode
// failures are reported as unusable options rather than a bare codec
// error so the log names the field.
fn decode_required(field: &str, wire: &str) -> CeremonyResult<Vec<u8>> {
    if wire.is_empty() {
        return Err(CeremonyError::InvalidOptions(format!("{field} is empty")));
    }
    codec::decode(wire)
        .map_err(|err| CeremonyError::InvalidOptions(format!("{field}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registration_options(challenge: &str, user_id: &str) -> RegistrationOptions {
        serde_json::from_value(json!({
            "challenge": challenge,
            "user": { "id": user_id, "name": "alice", "displayName": "Alice" },
            "rp": { "id": "localhost", "name": "Demo" },
        }))
        .unwrap()
    }

    fn authentication_options(body: serde_json::Value) -> AuthenticationOptions {
        serde_json::from_value(body).unwrap()
    }

    // ---- registration ----

    #[test]
    fn decodes_challenge_and_user_handle() {
        let normalized = normalize_registration(registration_options("AQID", "CQk")).unwrap();
        assert_eq!(normalized.challenge, vec![1, 2, 3]);
        assert_eq!(normalized.user.id, vec![9, 9]);
    }

    #[test]
    fn passes_unknown_fields_through_untouched() {
        let normalized = normalize_registration(registration_options("AQID", "CQk")).unwrap();
        assert_eq!(normalized.extra["rp"]["id"], "localhost");
        assert_eq!(normalized.user.extra["displayName"], "Alice");
    }

    #[test]
    fn rejects_empty_challenge() {
        let err = normalize_registration(registration_options("", "CQk")).unwrap_err();
        assert!(matches!(err, CeremonyError::InvalidOptions(ref detail) if detail.contains("challenge")));
    }

    #[test]
    fn rejects_undecodable_challenge_as_invalid_options() {
        let err = normalize_registration(registration_options("@@@", "CQk")).unwrap_err();
        assert!(matches!(err, CeremonyError::InvalidOptions(_)));
    }

    #[test]
    fn rejects_empty_user_handle() {
        let err = normalize_registration(registration_options("AQID", "")).unwrap_err();
        assert!(matches!(err, CeremonyError::InvalidOptions(ref detail) if detail.contains("user.id")));
    }

    // ---- authentication ----

    #[test]
    fn missing_allow_list_stays_missing() {
        let normalized = normalize_authentication(authentication_options(json!({
            "challenge": "AQID",
        })))
        .unwrap();
        assert_eq!(normalized.challenge, vec![1, 2, 3]);
        assert!(normalized.allow_credentials.is_none());
    }

    #[test]
    fn allow_list_is_decoded_in_order() {
        let normalized = normalize_authentication(authentication_options(json!({
            "challenge": "AQID",
            "allowCredentials": [
                { "type": "public-key", "id": "BQ" },
                { "type": "public-key", "id": "Bg" },
            ],
        })))
        .unwrap();

        let allowed = normalized.allow_credentials.unwrap();
        assert_eq!(allowed.len(), 2);
        assert_eq!(allowed[0].id, vec![5]);
        assert_eq!(allowed[1].id, vec![6]);
        assert_eq!(allowed[0].extra["type"], "public-key");
    }

    #[test]
    fn bad_allow_list_entry_names_its_position() {
        let err = normalize_authentication(authentication_options(json!({
            "challenge": "AQID",
            "allowCredentials": [
                { "type": "public-key", "id": "BQ" },
                { "type": "public-key", "id": "===" },
            ],
        })))
        .unwrap_err();

        assert!(matches!(
            err,
            CeremonyError::InvalidOptions(ref detail) if detail.contains("allowCredentials[1]")
        ));
    }

    #[test]
    fn empty_allow_list_is_kept_empty() {
        // An empty list is not the same as no list: the server explicitly
        // said "no credential will match".
        let normalized = normalize_authentication(authentication_options(json!({
            "challenge": "AQID",
            "allowCredentials": [],
        })))
        .unwrap();
        assert_eq!(normalized.allow_credentials.unwrap().len(), 0);
    }
}
