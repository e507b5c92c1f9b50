use crate::models::Issuer;
use crate::providers::errors::ProviderError;
use std::fmt;

/// Raw value of the `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("Missing credentials.".to_string());
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Token of a `Bearer <token>` credential.
    pub fn bearer_token(&self) -> Result<&str, ProviderError> {
        let mut parts = self.0.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => {
                Ok(token)
            }
            _ => Err(ProviderError::Unauthorized(
                "Expected Bearer scheme in Authorization header".to_string(),
            )),
        }
    }
}

// never log the secret itself
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = match self.0.split_once(' ') {
            Some((scheme, _)) if scheme.eq_ignore_ascii_case("bearer") => format!("{} ****", scheme),
            _ => "****".to_string(),
        };
        f.debug_tuple("Credential").field(&masked).finish()
    }
}

/// Verifies credentials and tells who is calling.
#[async_trait::async_trait]
pub trait AuthenticationProvider: Send + Sync {
    /// Issuer recorded on users provisioned through this provider.
    fn issuer(&self) -> Issuer;

    /// `Ok(false)` for a credential the provider rejects; `Err` when it could not decide.
    async fn is_valid(&self, credential: &Credential) -> Result<bool, ProviderError>;

    /// Stable identity of the caller, `None` when the credential does not resolve to one.
    async fn owner(&self, credential: &Credential) -> Option<String>;
}
