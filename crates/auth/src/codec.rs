//! Token codec: HS256-signed compact tokens carrying [`Claims`].
//!
//! The codec is pure: its only state is the signing secret, and the clock is
//! passed in explicitly on both issue and verify.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::debug;

use crate::claims::{validate_claims, Claims, Identity, TokenError};

#[derive(Debug, Error)]
pub enum CodecError {
    /// The signing secret is missing. This is a startup configuration error.
    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("failed to sign token: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),

    #[error("token lifetime {0} overflows the expiry timestamp")]
    LifetimeOverflow(Duration),
}

/// A freshly minted token together with its lifetime metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Lifetime in whole seconds (used as the cookie `Max-Age`).
    pub fn max_age_secs(&self) -> i64 {
        (self.expires_at - self.issued_at).num_seconds()
    }
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec").field("algorithm", &"HS256").finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, CodecError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(CodecError::EmptySecret);
        }

        // Expiry is checked against the caller's clock in `validate_claims`,
        // not against the system clock inside jsonwebtoken.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = ["exp".to_string()].into_iter().collect();

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Sign `identity` into a token valid for `ttl` from `now`.
    pub fn issue(
        &self,
        identity: Identity,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, CodecError> {
        // Whole seconds only, so `iat`/`exp` round-trip exactly.
        let issued_at = DateTime::<Utc>::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or(CodecError::LifetimeOverflow(ttl))?;
        let claims = Claims::new(identity, issued_at, expires_at);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Check signature integrity, then expiry against `now`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::Invalid);
        }

        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(error = %e, "token rejected");
            TokenError::Invalid
        })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use shopdesk_core::UserId;

    fn codec() -> TokenCodec {
        TokenCodec::new("unit-test-secret").unwrap()
    }

    fn admin(id: i64) -> Identity {
        Identity {
            id: UserId::new(id),
            role: Role::Admin,
        }
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap()
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(TokenCodec::new(""), Err(CodecError::EmptySecret)));
    }

    #[test]
    fn issued_token_verifies_with_same_claims() {
        let codec = codec();
        let now = base_time();
        let issued = codec.issue(admin(1), Duration::minutes(15), now).unwrap();

        let claims = codec.verify(&issued.token, now + Duration::minutes(1)).unwrap();
        assert_eq!(claims.identity(), admin(1));
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, (now + Duration::minutes(15)).timestamp());
        assert_eq!(issued.max_age_secs(), 900);
    }

    #[test]
    fn issuance_is_deterministic() {
        let codec = codec();
        let now = base_time();
        let a = codec.issue(admin(3), Duration::minutes(15), now).unwrap();
        let b = codec.issue(admin(3), Duration::minutes(15), now).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let now = base_time();
        let foreign = TokenCodec::new("someone-else")
            .unwrap()
            .issue(admin(1), Duration::minutes(15), now)
            .unwrap();

        assert_eq!(codec().verify(&foreign.token, now), Err(TokenError::Invalid));
    }

    #[test]
    fn lifetime_past_the_calendar_is_an_error() {
        let err = codec()
            .issue(admin(1), Duration::days(100_000_000), base_time())
            .unwrap_err();
        assert!(matches!(err, CodecError::LifetimeOverflow(_)));
    }

    #[test]
    fn garbage_and_empty_input_are_invalid() {
        let now = base_time();
        assert_eq!(codec().verify("", now), Err(TokenError::Invalid));
        assert_eq!(codec().verify("not.a.token", now), Err(TokenError::Invalid));
    }

    proptest! {
        #[test]
        fn tokens_past_expiry_are_expired(
            id in 1i64..1_000_000,
            ttl_secs in 1i64..(8 * 24 * 3600),
            late_by in 0i64..(30 * 24 * 3600),
        ) {
            let codec = codec();
            let now = base_time();
            let issued = codec.issue(admin(id), Duration::seconds(ttl_secs), now).unwrap();

            let at = now + Duration::seconds(ttl_secs + late_by);
            prop_assert_eq!(codec.verify(&issued.token, at), Err(TokenError::Expired));
        }

        #[test]
        fn flipped_signature_character_is_invalid(
            id in 1i64..1_000_000,
            offset in 0usize..40,
        ) {
            let codec = codec();
            let now = base_time();
            let issued = codec.issue(admin(id), Duration::minutes(15), now).unwrap();

            let sig_start = issued.token.rfind('.').unwrap() + 1;
            let mut bytes = issued.token.clone().into_bytes();
            // Stay clear of the final character, whose low bits are padding.
            let idx = sig_start + offset % (bytes.len() - sig_start - 1);
            bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            prop_assert_eq!(codec.verify(&tampered, now), Err(TokenError::Invalid));
        }
    }
}
