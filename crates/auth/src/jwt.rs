//! Bearer token decoding.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::{validate_claims, JwtClaims, TokenValidationError};

/// Decode + verify a bearer token into claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// Shared-secret HS256 validator.
///
/// Expiry is carried as RFC 3339 timestamps (`issued_at`/`expires_at`) rather
/// than the registered numeric `exp` claim, so time checks run through
/// [`validate_claims`] instead of the library's own.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        Self {
            key: DecodingKey::from_secret(&secret),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};
    use tradeerp_core::TenantId;

    use crate::{PrincipalId, Role};

    fn mint(secret: &str, claims: &JwtClaims) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(now: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: PrincipalId::new(),
            tenant_id: TenantId::new(),
            roles: vec![Role::HR_MANAGER],
            issued_at: now,
            expires_at: now + Duration::minutes(10),
            user_id: Some(3),
        }
    }

    #[test]
    fn decodes_token_signed_with_same_secret() {
        let now = Utc::now();
        let c = claims(now);
        let v = Hs256JwtValidator::new(b"s3cret".to_vec());
        assert_eq!(v.validate(&mint("s3cret", &c), now).unwrap(), c);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let now = Utc::now();
        let v = Hs256JwtValidator::new(b"s3cret".to_vec());
        let err = v.validate(&mint("other", &claims(now)), now).unwrap_err();
        assert!(matches!(err, TokenValidationError::Malformed(_)));
    }

    #[test]
    fn rejects_expired_token_after_decoding() {
        let now = Utc::now();
        let v = Hs256JwtValidator::new(b"s3cret".to_vec());
        let token = mint("s3cret", &claims(now));
        let err = v.validate(&token, now + Duration::hours(1)).unwrap_err();
        assert_eq!(err, TokenValidationError::Expired);
    }
}
