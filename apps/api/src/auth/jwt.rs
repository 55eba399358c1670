use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::claims::{Identity, IdentityClaims, TokenClass};
use crate::state::security_config::SecurityConfig;
use crate::AppError;

/// Why a presented token was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Bad signature, wrong secret, wrong issuer/audience/class or malformed.
    #[error("invalid token")]
    Invalid,
    /// Well-formed and correctly signed but past its `exp`.
    #[error("token expired")]
    Expired { expired_at: Option<i64> },
}

/// A freshly signed token and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub class: TokenClass,
    pub expires_at: OffsetDateTime,
    /// Seconds from issuance until `exp`
    pub expires_in: i64,
}

/// Access + refresh pair handed to clients after login or refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token lifetime in seconds
    pub expires_in: i64,
    pub token_type: &'static str,
}

/// Issues and verifies HS256 tokens. Access and refresh tokens use separate
/// secrets, so a token of one class never verifies as the other.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    security: SecurityConfig,
}

impl TokenCodec {
    pub fn new(security: SecurityConfig) -> Self {
        Self { security }
    }

    pub fn security(&self) -> &SecurityConfig {
        &self.security
    }

    pub fn issue(&self, identity: &Identity, class: TokenClass) -> Result<IssuedToken, AppError> {
        self.issue_at(identity, class, OffsetDateTime::now_utc())
    }

    /// Sign a token as if issued at `now`.
    pub fn issue_at(
        &self,
        identity: &Identity,
        class: TokenClass,
        now: OffsetDateTime,
    ) -> Result<IssuedToken, AppError> {
        let ttl = i64::try_from(self.security.ttl(class).as_secs())
            .map_err(|_| AppError::internal("Token lifetime out of range"))?;
        let iat = now.unix_timestamp();
        let exp = iat + ttl;

        let claims = IdentityClaims {
            identity: identity.clone(),
            iat,
            exp,
            iss: self.security.issuer.clone(),
            aud: self.security.audience.clone(),
            jti: Uuid::new_v4().to_string(),
            typ: class,
        };

        let token = encode(
            &Header::new(self.security.algorithm),
            &claims,
            &EncodingKey::from_secret(self.security.secret(class)),
        )
        .map_err(|e| AppError::internal_with_source("Failed to encode token", e))?;

        let expires_at = OffsetDateTime::from_unix_timestamp(exp)
            .map_err(|e| AppError::internal_with_source("Token expiry out of range", e))?;

        Ok(IssuedToken {
            token,
            class,
            expires_at,
            expires_in: claims.exp - iat,
        })
    }

    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, AppError> {
        let now = OffsetDateTime::now_utc();
        let access = self.issue_at(identity, TokenClass::Access, now)?;
        let refresh = self.issue_at(identity, TokenClass::Refresh, now)?;
        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            expires_in: access.expires_in,
            token_type: "Bearer",
        })
    }

    fn validation(&self, check_exp: bool) -> Validation {
        let mut validation = Validation::new(self.security.algorithm);
        validation.leeway = 0;
        validation.validate_exp = check_exp;
        validation.set_issuer(&[self.security.issuer.as_str()]);
        validation.set_audience(&[self.security.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "aud"]);
        validation
    }

    /// Verify signature, issuer, audience, expiry and class.
    pub fn verify(&self, token: &str, class: TokenClass) -> Result<IdentityClaims, TokenError> {
        let key = DecodingKey::from_secret(self.security.secret(class));

        let claims = match decode::<IdentityClaims>(token, &key, &self.validation(true)) {
            Ok(data) => data.claims,
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                // exp is checked before iss/aud; expired only if everything else holds.
                let stale = decode::<IdentityClaims>(token, &key, &self.validation(false))
                    .map_err(|_| TokenError::Invalid)?
                    .claims;
                if stale.typ != class {
                    return Err(TokenError::Invalid);
                }
                return Err(TokenError::Expired {
                    expired_at: Some(stale.exp),
                });
            }
            Err(_) => return Err(TokenError::Invalid),
        };

        if claims.typ != class {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }
}
