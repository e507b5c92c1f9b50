use crate::models::Issuer;
use crate::providers::authentication::{AuthenticationProvider, Credential};
use crate::providers::errors::ProviderError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, serde::Deserialize)]
struct JwtHeader {
    alg: String,
}

/// Verifies HS256-signed bearer tokens locally.
///
/// The owner is read from `owner_claim` (`oid` unless configured otherwise),
/// falling back to `sub`.
pub struct JwtProvider {
    secret: Vec<u8>,
    issuer: Issuer,
    expected_issuer: Option<String>,
    owner_claim: String,
}

impl JwtProvider {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            issuer: Issuer::Jwt,
            expected_issuer: None,
            owner_claim: "oid".to_string(),
        }
    }

    pub fn with_issuer(mut self, issuer: Issuer) -> Self {
        self.issuer = issuer;
        self
    }

    /// Require this `iss` claim on every token.
    pub fn with_expected_issuer(mut self, expected_issuer: Option<String>) -> Self {
        self.expected_issuer = expected_issuer;
        self
    }

    pub fn with_owner_claim(mut self, owner_claim: impl Into<String>) -> Self {
        self.owner_claim = owner_claim.into();
        self
    }

    fn mac(&self, signing_input: &str) -> Result<HmacSha256, ProviderError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|err| ProviderError::Internal(format!("error generating hmac {err:?}")))?;
        mac.update(signing_input.as_bytes());
        Ok(mac)
    }

    /// Signs `claims` into a compact HS256 token.
    pub fn encode(&self, claims: &Value) -> Result<String, ProviderError> {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = serde_json::to_vec(claims)
            .map_err(|err| ProviderError::Internal(format!("Failed to serialize claims: {err}")))?;
        let signing_input = format!("{}.{}", header, URL_SAFE_NO_PAD.encode(payload));
        let signature = self.mac(&signing_input)?.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Checks signature, expiry and issuer, and returns the claims.
    pub fn decode(&self, token: &str) -> Result<Map<String, Value>, ProviderError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(ProviderError::Unauthorized(
                "Invalid JWT format: expected 3 parts (header.payload.signature)".to_string(),
            ));
        }

        let header: JwtHeader = decode_segment(parts[0])?;
        if header.alg != "HS256" {
            return Err(ProviderError::Unauthorized(format!(
                "Unsupported JWT algorithm {}",
                header.alg
            )));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(parts[2])
            .map_err(|err| ProviderError::Unauthorized(format!("Failed to decode JWT signature: {err}")))?;
        self.mac(&format!("{}.{}", parts[0], parts[1]))?
            .verify_slice(&signature)
            .map_err(|_| ProviderError::Unauthorized("JWT signature mismatch".to_string()))?;

        let claims: Map<String, Value> = decode_segment(parts[1])?;

        if let Some(exp) = claims.get("exp") {
            let exp = exp
                .as_i64()
                .ok_or_else(|| ProviderError::Unauthorized("JWT exp is not a number".to_string()))?;
            let now = chrono::Utc::now().timestamp();
            if exp < now {
                return Err(ProviderError::Unauthorized(format!(
                    "JWT token expired (exp: {}, now: {})",
                    exp, now
                )));
            }
        }

        if let Some(expected) = &self.expected_issuer {
            if claims.get("iss").and_then(Value::as_str) != Some(expected.as_str()) {
                return Err(ProviderError::Unauthorized(
                    "JWT issued by an unexpected issuer".to_string(),
                ));
            }
        }

        Ok(claims)
    }
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, ProviderError> {
    let decoded = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|err| ProviderError::Unauthorized(format!("Failed to decode JWT segment: {err}")))?;

    serde_json::from_slice(&decoded)
        .map_err(|err| ProviderError::Unauthorized(format!("Failed to parse JWT segment: {err}")))
}

#[async_trait::async_trait]
impl AuthenticationProvider for JwtProvider {
    fn issuer(&self) -> Issuer {
        self.issuer
    }

    async fn is_valid(&self, credential: &Credential) -> Result<bool, ProviderError> {
        let verified = credential
            .bearer_token()
            .and_then(|token| self.decode(token));

        match verified {
            Ok(_) => Ok(true),
            Err(ProviderError::Unauthorized(reason)) => {
                tracing::debug!(%reason, "Rejected bearer token");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    async fn owner(&self, credential: &Credential) -> Option<String> {
        let token = credential.bearer_token().ok()?;
        let claims = self.decode(token).ok()?;

        [self.owner_claim.as_str(), "sub"]
            .iter()
            .find_map(|claim| claims.get(*claim).and_then(Value::as_str))
            .filter(|owner| !owner.is_empty())
            .map(str::to_string)
    }
}
