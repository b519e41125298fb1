use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::auth::error::{AuthError, AuthResult};
use crate::services::auth::role::Role;

pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum TokenCodecError {
    #[error("signing secret must be at least {MIN_SECRET_LEN} bytes, got {0}")]
    SecretTooShort(usize),
    #[error("issuer must not be empty")]
    EmptyIssuer,
}

/// Access token (JWT) claims as they travel on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccessTokenClaims {
    iss: String,
    sub: String,
    role: Role,
    iat: i64,
    exp: i64,
    jti: String,
}

/// Result of `TokenCodec::issue`.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Verified, application-facing view of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub jti: String,
}

/// HS256 signer/verifier.
///
/// - The secret is injected once at startup and never rotated.
/// - `exp` is checked here (not by jsonwebtoken) so callers can pass an explicit `now`
///   and so expiry is reported separately from signature failures.
#[derive(Clone)]
pub struct TokenCodec {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Result<Self, TokenCodecError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenCodecError::SecretTooShort(secret.len()));
        }
        let issuer = issuer.into();
        if issuer.trim().is_empty() {
            return Err(TokenCodecError::EmptyIssuer);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Ok(Self {
            issuer,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn issue(&self, subject: &str, role: Role, ttl: Duration) -> AuthResult<IssuedToken> {
        self.issue_at(subject, role, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        role: Role,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> AuthResult<IssuedToken> {
        if subject.trim().is_empty() {
            return Err(AuthError::validation("token subject must not be empty"));
        }

        let issued_at = truncate_to_seconds(now);
        let expires_at = issued_at.checked_add_signed(ttl).ok_or_else(|| {
            tracing::error!(ttl_seconds = ttl.num_seconds(), "token expiry out of range");
            AuthError::Signing("token expiry out of range".to_string())
        })?;

        let claims = AccessTokenClaims {
            iss: self.issuer.clone(),
            sub: subject.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        let token = jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "failed to sign JWT");
            AuthError::Signing(e.to_string())
        })?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    pub fn decode(&self, token: &str) -> AuthResult<TokenClaims> {
        self.decode_at(token, Utc::now())
    }

    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<TokenClaims> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
                .map_err(|e| {
                    tracing::debug!(error = %e, "token rejected");
                    AuthError::TokenInvalid
                })?;
        let claims = data.claims;

        if claims.sub.trim().is_empty() {
            return Err(AuthError::TokenInvalid);
        }

        let issued_at =
            DateTime::from_timestamp(claims.iat, 0).ok_or(AuthError::TokenInvalid)?;
        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::TokenInvalid)?;

        if expires_at < now {
            return Err(AuthError::TokenExpired);
        }

        Ok(TokenClaims {
            subject: claims.sub,
            role: claims.role,
            issued_at,
            expires_at,
            jti: claims.jti,
        })
    }
}

fn truncate_to_seconds(t: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(t.timestamp(), 0).unwrap_or(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-that-is-long-enough-for-testing";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, "regioninvest").unwrap()
    }

    #[test]
    fn rejects_short_secret() {
        let err = TokenCodec::new(b"too-short", "regioninvest").unwrap_err();
        assert!(matches!(err, TokenCodecError::SecretTooShort(9)));
    }

    #[test]
    fn decode_immediately_after_issue_succeeds() {
        let codec = codec();
        let issued = codec
            .issue("porteur1", Role::Porteur, Duration::hours(1))
            .unwrap();

        let claims = codec.decode(&issued.token).unwrap();
        assert_eq!(claims.subject, "porteur1");
        assert_eq!(claims.role, Role::Porteur);
        assert_eq!(claims.expires_at, issued.expires_at);
        assert!(claims.expires_at > Utc::now());
        assert_eq!(issued.token.split('.').count(), 3);
    }

    #[test]
    fn decode_after_expiry_fails_with_token_expired() {
        let codec = codec();
        let now = Utc::now();
        let issued = codec
            .issue_at("admin", Role::Admin, Duration::minutes(5), now)
            .unwrap();

        assert!(codec.decode_at(&issued.token, now + Duration::minutes(4)).is_ok());
        // Exactly at expiry is still accepted; one second later is not.
        assert!(codec.decode_at(&issued.token, issued.expires_at).is_ok());

        let later = issued.expires_at + Duration::seconds(1);
        assert!(matches!(
            codec.decode_at(&issued.token, later),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn token_from_another_secret_is_invalid() {
        let other = TokenCodec::new(b"another-secret-key-that-is-long-enough!!", "regioninvest")
            .unwrap();
        let issued = other.issue("admin", Role::Admin, Duration::hours(1)).unwrap();

        assert!(matches!(
            codec().decode(&issued.token),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn token_from_another_issuer_is_invalid() {
        let other = TokenCodec::new(SECRET, "someone-else").unwrap();
        let issued = other.issue("admin", Role::Admin, Duration::hours(1)).unwrap();

        assert!(matches!(
            codec().decode(&issued.token),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn tampered_payload_is_invalid() {
        let codec = codec();
        let issued = codec.issue("user1", Role::User, Duration::hours(1)).unwrap();

        let mut parts: Vec<&str> = issued.token.split('.').collect();
        let forged = codec.issue("admin", Role::Admin, Duration::hours(1)).unwrap();
        let forged_parts: Vec<&str> = forged.token.split('.').collect();
        // Splice the admin payload onto the user signature.
        parts[1] = forged_parts[1];
        let spliced = parts.join(".");

        assert!(matches!(codec.decode(&spliced), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            codec().decode("invalid.token.here"),
            Err(AuthError::TokenInvalid)
        ));
        assert!(matches!(codec().decode(""), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn out_of_range_ttl_is_an_error() {
        let result = codec().issue("admin", Role::Admin, Duration::days(200_000_000));
        assert!(matches!(result, Err(AuthError::Signing(_))));
    }

    #[test]
    fn empty_subject_cannot_be_issued() {
        assert!(codec().issue("  ", Role::User, Duration::hours(1)).is_err());
    }
}
