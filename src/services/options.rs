use crate::providers::{AuthenticationProvider, StorageProvider};
use crate::services::errors::ServiceConfigError;
use derive_builder::Builder;
use serde_derive::Deserialize;
use std::sync::Arc;

/// Identity stored as a template's owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerIdentity {
    /// Raw identity returned by the authentication provider
    #[default]
    AuthId,
    /// Generated id of the provisioned user record
    UserId,
}

/// What happens to a user's templates when the user record is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserDeletionPolicy {
    /// Templates stay behind
    #[default]
    Orphan,
    /// Templates are deleted with the user
    Cascade,
    /// Deletion is refused while the user owns templates
    Reject,
}

/// Everything `TemplateService::init` needs. Both providers are mandatory:
/// `ClientOptionsBuilder::build` fails with `ServiceConfigError` when one is missing.
#[derive(Builder, Clone)]
#[builder(pattern = "owned", build_fn(error = "ServiceConfigError"))]
pub struct ClientOptions {
    pub storage_provider: Arc<dyn StorageProvider>,
    pub authentication_provider: Arc<dyn AuthenticationProvider>,
    #[builder(default)]
    pub owner_identity: OwnerIdentity,
    #[builder(default)]
    pub user_deletion: UserDeletionPolicy,
}
