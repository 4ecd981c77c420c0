//! HS256 JSON Web Tokens
//!
//! Tokens carry the account email as `sub` and an `exp` unix timestamp.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use slotwise_core::user::ports::TokenService;
use slotwise_domain::{Result, SlotwiseError};

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
}

pub struct JwtTokenService {
    secret: Vec<u8>,
    ttl: Duration,
}

impl JwtTokenService {
    pub fn new(secret: impl AsRef<[u8]>, ttl_minutes: i64) -> Result<Self> {
        let secret = secret.as_ref().to_vec();
        if secret.is_empty() {
            return Err(SlotwiseError::Config("token signing secret is empty".into()));
        }
        Ok(Self { secret, ttl: Duration::minutes(ttl_minutes) })
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|err| SlotwiseError::Internal(format!("invalid signing key: {err}")))
    }

    fn sign(&self, signing_input: &str) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, subject: &str) -> Result<String> {
        let claims = Claims { sub: subject.to_string(), exp: (Utc::now() + self.ttl).timestamp() };
        let payload = serde_json::to_vec(&claims)
            .map_err(|err| SlotwiseError::Internal(format!("failed to encode claims: {err}")))?;

        let signing_input =
            format!("{}.{}", URL_SAFE_NO_PAD.encode(HEADER), URL_SAFE_NO_PAD.encode(payload));
        let signature = self.sign(&signing_input)?;
        Ok(format!("{signing_input}.{signature}"))
    }

    fn verify(&self, token: &str) -> Result<String> {
        let invalid = || SlotwiseError::Auth("Could not validate credentials".into());

        let mut parts = token.split('.');
        let (Some(header_part), Some(payload_part), Some(signature_part), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let header: Header = URL_SAFE_NO_PAD
            .decode(header_part)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(invalid)?;
        if header.alg != "HS256" {
            return Err(invalid());
        }

        let signature = URL_SAFE_NO_PAD.decode(signature_part).map_err(|_| invalid())?;
        let mut mac = self.mac()?;
        mac.update(format!("{header_part}.{payload_part}").as_bytes());
        mac.verify_slice(&signature).map_err(|_| invalid())?;

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload_part)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(invalid)?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(SlotwiseError::Auth("Token has expired".into()));
        }

        Ok(claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips_subject() {
        let service = JwtTokenService::new("secret", 30).unwrap();
        let token = service.issue("ada@example.com").unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(service.verify(&token).unwrap(), "ada@example.com");
    }

    #[test]
    fn other_secret_or_tampering_is_rejected() {
        let service = JwtTokenService::new("secret", 30).unwrap();
        let other = JwtTokenService::new("different", 30).unwrap();
        let token = service.issue("ada@example.com").unwrap();

        assert!(matches!(other.verify(&token), Err(SlotwiseError::Auth(_))));

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(r#"{"sub":"eve@example.com","exp":9999999999}"#);
        parts[1] = &forged;
        assert!(matches!(service.verify(&parts.join(".")), Err(SlotwiseError::Auth(_))));
        assert!(matches!(service.verify("not-a-token"), Err(SlotwiseError::Auth(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = JwtTokenService::new("secret", -1).unwrap();
        let token = service.issue("ada@example.com").unwrap();

        match service.verify(&token) {
            Err(SlotwiseError::Auth(msg)) => assert!(msg.contains("expired")),
            other => panic!("expected expiry error, got {other:?}"),
        }
    }

    #[test]
    fn empty_secret_is_a_config_error() {
        assert!(matches!(JwtTokenService::new("", 30), Err(SlotwiseError::Config(_))));
    }
}
