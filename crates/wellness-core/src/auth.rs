//! Identity token verification.
//!
//! The tracker does not manage credentials itself. Callers present a bearer
//! token issued by an identity provider and a [`TokenVerifier`] turns it into
//! [`IdentityClaims`]. [`SignedTokenVerifier`] is the built-in provider:
//! HMAC-SHA256 signed claims, `base64url(claims_json).hex(signature)`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::AuthError;
use crate::user::UserProfile;

type HmacSha256 = Hmac<Sha256>;

/// Verified identity of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IdentityClaims {
    pub fn new(uid: impl Into<String>, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            name: None,
            picture: None,
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    /// Profile fields carried by the token.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            email: self.email.clone(),
            display_name: self.name.clone(),
            photo_url: self.picture.clone(),
        }
    }
}

/// Seam to an identity provider.
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` as of `now`.
    ///
    /// # Errors
    /// Returns an [`AuthError`] for malformed, forged or expired tokens.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityClaims, AuthError>;
}

/// Extract the token from an `Authorization` header value.
///
/// # Errors
/// Returns [`AuthError::MissingBearer`] when the header is absent, uses a
/// different scheme, or carries an empty token.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AuthError::MissingBearer)?;
    if token.is_empty() {
        return Err(AuthError::MissingBearer);
    }
    Ok(token)
}

/// HMAC-SHA256 token issuer and verifier sharing one secret.
pub struct SignedTokenVerifier {
    key: Vec<u8>,
}

impl SignedTokenVerifier {
    /// Derive the signing key from a configured secret.
    pub fn new(secret: &str) -> Self {
        Self {
            key: derive_key(secret),
        }
    }

    /// Sign `claims` into a token string.
    pub fn issue(&self, claims: &IdentityClaims) -> Result<String, serde_json::Error> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let signature = self.sign(payload.as_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    fn mac(&self, payload: &[u8]) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC can take keys of any size");
        mac.update(payload);
        mac
    }

    fn sign(&self, payload: &[u8]) -> String {
        hex::encode(self.mac(payload).finalize().into_bytes())
    }
}

impl TokenVerifier for SignedTokenVerifier {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityClaims, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::Malformed)?;

        let signature = hex::decode(signature).map_err(|_| AuthError::Malformed)?;
        if self.mac(payload.as_bytes()).verify_slice(&signature).is_err() {
            warn!("rejected token with bad signature");
            return Err(AuthError::BadSignature);
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::Malformed)?;
        let claims: IdentityClaims =
            serde_json::from_slice(&bytes).map_err(|_| AuthError::Malformed)?;

        if claims.uid.trim().is_empty() {
            return Err(AuthError::MissingSubject);
        }
        if claims.expires_at <= now {
            warn!(uid = %claims.uid, "rejected expired token");
            return Err(AuthError::Expired(claims.expires_at));
        }

        Ok(claims)
    }
}

fn derive_key(secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b"wellness-identity-token-v1");
    hasher.finalize().to_vec()
}
