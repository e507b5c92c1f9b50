use crate::models::Issuer;
use crate::providers::authentication::{AuthenticationProvider, Credential};
use crate::providers::errors::ProviderError;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Short-lived token -> owner map. Expired entries are dropped whenever a new
/// owner is stored, so the map never outgrows the tokens seen within one `ttl`.
pub struct OAuthCache {
    ttl: Duration,
    owners: RwLock<HashMap<String, (String, Instant)>>,
}

impl OAuthCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            owners: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, token: &str) -> Option<String> {
        let owners = self.owners.read().await;
        owners
            .get(token)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(owner, _)| owner.clone())
    }

    pub async fn insert(&self, token: String, owner: String) {
        let now = Instant::now();
        let mut owners = self.owners.write().await;
        owners.retain(|_, (_, expires_at)| *expires_at > now);
        owners.insert(token, (owner, now + self.ttl));
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.owners.read().await.len()
    }
}

/// Validates bearer tokens against a remote userinfo endpoint.
pub struct OAuthProvider {
    client: reqwest::Client,
    auth_url: String,
    issuer: Issuer,
    owner_claim: String,
    cache: OAuthCache,
}

impl OAuthProvider {
    pub fn new(
        auth_url: impl Into<String>,
        timeout: Duration,
        cache_ttl: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            auth_url: auth_url.into(),
            issuer: Issuer::AzureAd,
            owner_claim: "oid".to_string(),
            cache: OAuthCache::new(cache_ttl),
        })
    }

    pub fn with_issuer(mut self, issuer: Issuer) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn with_owner_claim(mut self, owner_claim: impl Into<String>) -> Self {
        self.owner_claim = owner_claim.into();
        self
    }

    /// Owner behind `token`, served from the cache when possible.
    async fn resolve(&self, token: &str) -> Result<String, ProviderError> {
        if let Some(owner) = self.cache.get(token).await {
            return Ok(owner);
        }

        let owner = self.fetch_owner(token).await?;
        self.cache.insert(token.to_string(), owner.clone()).await;
        Ok(owner)
    }

    #[tracing::instrument(name = "Fetch caller identity.", skip(self, token))]
    async fn fetch_owner(&self, token: &str) -> Result<String, ProviderError> {
        let resp = self
            .client
            .get(&self.auth_url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| {
                tracing::error!(target: "auth", error = %err, "OAuth request failed");
                ProviderError::from(err)
            })?;

        match resp.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ProviderError::Unauthorized("401 Unauthorized".to_string()));
            }
            status => {
                return Err(ProviderError::InvalidResponse(format!(
                    "auth server answered {status}"
                )));
            }
        }

        let body: Value = resp.json().await?;
        [self.owner_claim.as_str(), "sub", "id"]
            .iter()
            .find_map(|claim| body.get(*claim).and_then(Value::as_str))
            .filter(|owner| !owner.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::InvalidResponse("can't find the caller identity".to_string())
            })
    }
}

#[async_trait::async_trait]
impl AuthenticationProvider for OAuthProvider {
    fn issuer(&self) -> Issuer {
        self.issuer
    }

    async fn is_valid(&self, credential: &Credential) -> Result<bool, ProviderError> {
        let token = match credential.bearer_token() {
            Ok(token) => token,
            Err(_) => return Ok(false),
        };

        match self.resolve(token).await {
            Ok(_) => Ok(true),
            Err(ProviderError::Unauthorized(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn owner(&self, credential: &Credential) -> Option<String> {
        let token = credential.bearer_token().ok()?;
        self.resolve(token)
            .await
            .map_err(|err| tracing::warn!("Failed to resolve owner: {}", err))
            .ok()
    }
}
