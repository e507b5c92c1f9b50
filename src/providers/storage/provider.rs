use crate::models::{NewTemplate, NewUser, Template, TemplateQuery, User, UserKey};
use crate::providers::errors::ProviderError;

/// Persistence for users and templates.
/// Allows mocking in tests and swapping the backing store.
#[async_trait::async_trait]
pub trait StorageProvider: Send + Sync {
    /// All users stored under (auth_id, issuer). At most one for a well-behaved store.
    async fn get_users(&self, key: &UserKey) -> Result<Vec<User>, ProviderError>;

    /// Atomically returns the user stored under the key of `user`, creating it if absent.
    /// The flag is `true` when this call created the record.
    async fn find_or_insert_user(&self, user: NewUser) -> Result<(User, bool), ProviderError>;

    /// Returns the number of removed users.
    async fn remove_user(&self, key: &UserKey) -> Result<u64, ProviderError>;

    /// Removes the user under `key` and every template of `owner` in one atomic step.
    /// Returns the removed (users, templates) counts; nothing is removed on error.
    async fn remove_user_with_templates(
        &self,
        key: &UserKey,
        owner: &str,
    ) -> Result<(u64, u64), ProviderError>;

    /// Persists the template and returns its generated id.
    async fn insert_template(&self, template: NewTemplate) -> Result<String, ProviderError>;

    async fn get_templates(&self, query: &TemplateQuery) -> Result<Vec<Template>, ProviderError>;

    async fn count_templates_by_owner(&self, owner: &str) -> Result<u64, ProviderError>;
}
