//! Signed session tokens.
//!
//! A token is `<claims>.<signature>`, both parts base64url without padding. The claims are a
//! JSON object `{sub, role, exp}` with `exp` in Unix seconds; the signature is HMAC-SHA256
//! over the encoded claims.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use binwatch_core::{AuthError, Authenticator, IssuedToken, Role, Session, UserId};
use chrono::{DateTime, Duration, Utc};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const MAX_TOKEN_LEN: usize = 1024;

#[derive(Deserialize)]
struct Claims {
    sub: i64,
    role: Role,
    exp: i64,
}

/// [`Authenticator`] signing tokens with a shared secret.
#[derive(Clone)]
pub struct HmacTokenSigner {
    mac: HmacSha256,
    ttl: Duration,
}

impl HmacTokenSigner {
    /// Create a signer for `secret` issuing tokens valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLength`] when the key is rejected.
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret)?,
            ttl,
        })
    }

    fn sign(&self, claims_part: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(claims_part.as_bytes());
        mac
    }
}

impl Authenticator for HmacTokenSigner {
    fn issue(&self, session: Session, now: DateTime<Utc>) -> IssuedToken {
        let expires_at = now + self.ttl;
        let claims = json!({
            "sub": session.user.0,
            "role": session.role,
            "exp": expires_at.timestamp(),
        });
        let claims_part = URL_SAFE_NO_PAD.encode(claims.to_string());
        let signature = self.sign(&claims_part).finalize().into_bytes();
        IssuedToken {
            token: format!("{claims_part}.{}", URL_SAFE_NO_PAD.encode(signature)),
            expires_at,
        }
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Session, AuthError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(AuthError::Malformed);
        }
        let (claims_part, signature_part) = token.split_once('.').ok_or(AuthError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_part)
            .map_err(|_err| AuthError::Malformed)?;
        self.sign(claims_part)
            .verify_slice(&signature)
            .map_err(|_err| AuthError::BadSignature)?;

        let claims_json = URL_SAFE_NO_PAD
            .decode(claims_part)
            .map_err(|_err| AuthError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&claims_json).map_err(|_err| AuthError::Malformed)?;
        if claims.exp <= now.timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(Session {
            user: UserId(claims.sub),
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(secret: &str) -> HmacTokenSigner {
        HmacTokenSigner::new(secret.as_bytes(), Duration::days(7)).expect("any key length")
    }

    fn session() -> Session {
        Session {
            user: UserId(7),
            role: Role::Authority,
        }
    }

    #[test]
    fn issued_tokens_verify() {
        let signer = signer("s3cret");
        let now = Utc::now();
        let issued = signer.issue(session(), now);
        assert_eq!(issued.expires_at, now + Duration::days(7));
        assert_eq!(signer.verify(&issued.token, now), Ok(session()));
    }

    #[test]
    fn tokens_expire() {
        let signer = signer("s3cret");
        let now = Utc::now();
        let issued = signer.issue(session(), now);
        assert_eq!(
            signer.verify(&issued.token, now + Duration::days(8)),
            Err(AuthError::Expired)
        );
    }

    #[test]
    fn other_secret_is_rejected() {
        let now = Utc::now();
        let issued = signer("s3cret").issue(session(), now);
        assert_eq!(
            signer("other").verify(&issued.token, now),
            Err(AuthError::BadSignature)
        );
    }

    #[test]
    fn tampered_claims_are_rejected() {
        let signer = signer("s3cret");
        let now = Utc::now();
        let issued = signer.issue(session(), now);
        let (_, signature) = issued.token.split_once('.').expect("two parts");
        let forged_claims = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"sub":7,"role":"authority","exp":{}}}"#,
            (now + Duration::days(365)).timestamp()
        ));
        assert_eq!(
            signer.verify(&format!("{forged_claims}.{signature}"), now),
            Err(AuthError::BadSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let signer = signer("s3cret");
        assert_eq!(
            signer.verify("not-a-token", Utc::now()),
            Err(AuthError::Malformed)
        );
    }
}
