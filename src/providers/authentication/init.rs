use crate::configuration::{AuthKind, AuthSettings};
use crate::providers::authentication::{
    AuthenticationProvider, JwtProvider, OAuthProvider, StaticProvider,
};
use crate::providers::errors::ProviderError;
use std::sync::Arc;
use std::time::Duration;

/// Builds the authentication provider selected by `settings.provider`.
pub fn init(settings: &AuthSettings) -> Result<Arc<dyn AuthenticationProvider>, ProviderError> {
    let provider: Arc<dyn AuthenticationProvider> = match settings.provider {
        AuthKind::Jwt => {
            let secret = settings
                .jwt_secret
                .as_ref()
                .filter(|secret| !secret.is_empty())
                .ok_or_else(|| ProviderError::Internal("auth.jwt_secret is not set".to_string()))?;
            let mut provider = JwtProvider::new(secret.as_bytes())
                .with_expected_issuer(settings.jwt_issuer.clone())
                .with_owner_claim(settings.owner_claim.clone());
            if let Some(issuer) = settings.issuer {
                provider = provider.with_issuer(issuer);
            }
            tracing::info!("Using JWT authentication");
            Arc::new(provider)
        }
        AuthKind::Oauth => {
            let auth_url = settings
                .auth_url
                .as_ref()
                .ok_or_else(|| ProviderError::Internal("auth.auth_url is not set".to_string()))?;
            let mut provider = OAuthProvider::new(
                auth_url.clone(),
                Duration::from_secs(settings.timeout_secs),
                Duration::from_secs(settings.cache_ttl_secs),
            )?
            .with_owner_claim(settings.owner_claim.clone());
            if let Some(issuer) = settings.issuer {
                provider = provider.with_issuer(issuer);
            }
            tracing::info!("Using OAuth authentication against {}", auth_url);
            Arc::new(provider)
        }
        AuthKind::Static => {
            if settings.static_tokens.is_empty() {
                tracing::warn!("Static authentication has no tokens - every request is rejected");
            }
            let mut provider = StaticProvider::new(settings.static_tokens.clone());
            if let Some(issuer) = settings.issuer {
                provider = provider.with_issuer(issuer);
            }
            tracing::warn!("Using static token authentication");
            Arc::new(provider)
        }
    };

    Ok(provider)
}
