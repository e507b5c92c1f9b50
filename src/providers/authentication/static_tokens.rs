use crate::models::Issuer;
use crate::providers::authentication::{AuthenticationProvider, Credential};
use crate::providers::errors::ProviderError;
use std::collections::HashMap;

/// Fixed token table, for local development and tests.
/// Accepts both `Bearer <token>` and the bare token.
pub struct StaticProvider {
    tokens: HashMap<String, String>,
    issuer: Issuer,
}

impl StaticProvider {
    pub fn new<I, K, V>(tokens: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|(token, owner)| (token.into(), owner.into()))
                .collect(),
            issuer: Issuer::Static,
        }
    }

    pub fn with_issuer(mut self, issuer: Issuer) -> Self {
        self.issuer = issuer;
        self
    }

    fn lookup(&self, credential: &Credential) -> Option<&String> {
        let token = credential.bearer_token().unwrap_or(credential.as_str());
        self.tokens.get(token)
    }
}

#[async_trait::async_trait]
impl AuthenticationProvider for StaticProvider {
    fn issuer(&self) -> Issuer {
        self.issuer
    }

    async fn is_valid(&self, credential: &Credential) -> Result<bool, ProviderError> {
        Ok(self.lookup(credential).is_some())
    }

    async fn owner(&self, credential: &Credential) -> Option<String> {
        self.lookup(credential).cloned()
    }
}
