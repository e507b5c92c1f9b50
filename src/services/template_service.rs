use crate::models::{
    Issuer, NewTemplate, NewUser, Template, TemplateInstance, TemplateQuery, User, UserKey,
};
use crate::providers::{AuthenticationProvider, Credential, StorageProvider};
use crate::services::errors::ServiceError;
use crate::services::options::{ClientOptions, OwnerIdentity, UserDeletionPolicy};
use serde_json::Value;
use std::sync::Arc;

/// Filters accepted by `TemplateService::get_templates`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateFilter {
    pub id: Option<String>,
    pub is_published: Option<bool>,
}

/// Orchestrates owner resolution, user provisioning and template access.
///
/// Every operation resolves the owner from the credential itself, even though
/// the HTTP gate already validated it.
pub struct TemplateService {
    storage: Arc<dyn StorageProvider>,
    authentication: Arc<dyn AuthenticationProvider>,
    owner_identity: OwnerIdentity,
    user_deletion: UserDeletionPolicy,
}

impl TemplateService {
    pub fn init(options: ClientOptions) -> Self {
        Self {
            storage: options.storage_provider,
            authentication: options.authentication_provider,
            owner_identity: options.owner_identity,
            user_deletion: options.user_deletion,
        }
    }

    pub fn authentication(&self) -> Arc<dyn AuthenticationProvider> {
        self.authentication.clone()
    }

    pub fn issuer(&self) -> Issuer {
        self.authentication.issuer()
    }

    async fn resolve_owner(&self, credential: &Credential) -> Result<String, ServiceError> {
        self.authentication
            .owner(credential)
            .await
            .filter(|owner| !owner.is_empty())
            .ok_or(ServiceError::AuthFailure)
    }

    fn template_owner(&self, user: &User) -> String {
        match self.owner_identity {
            OwnerIdentity::AuthId => user.auth_id.clone(),
            OwnerIdentity::UserId => user.id.clone(),
        }
    }

    async fn find_user(&self, owner: &str) -> Result<Option<User>, ServiceError> {
        let key = UserKey {
            auth_id: owner.to_string(),
            issuer: self.issuer(),
        };
        let users = self.storage.get_users(&key).await.map_err(|err| {
            tracing::error!("Failed to look up user: {}", err);
            ServiceError::InvalidUser
        })?;

        Ok(users.into_iter().next())
    }

    #[tracing::instrument(name = "Provision user.", skip(self, owner))]
    async fn ensure_user(&self, owner: &str) -> Result<User, ServiceError> {
        let (user, created) = self
            .storage
            .find_or_insert_user(NewUser::new(owner, self.issuer()))
            .await
            .map_err(|err| {
                tracing::error!("Failed to provision user: {}", err);
                ServiceError::InvalidUser
            })?;

        if created {
            tracing::info!(user_id = %user.id, issuer = %user.issuer, "Created user record");
        }

        Ok(user)
    }

    /// Stores `template` as the first instance of a new unpublished template and
    /// returns its id. The caller's user record is created on first use.
    /// `template_id` is accepted for API compatibility and ignored.
    #[tracing::instrument(name = "Post template.", skip(self, credential, template))]
    pub async fn post_template(
        &self,
        credential: &Credential,
        template: &Value,
        template_id: Option<&str>,
        version: Option<&str>,
    ) -> Result<String, ServiceError> {
        let owner = self.resolve_owner(credential).await?;
        let user = self.ensure_user(&owner).await?;

        let json = serde_json::to_string(template).map_err(|err| {
            tracing::debug!("Failed to serialize template: {}", err);
            ServiceError::InvalidTemplate
        })?;
        let new_template =
            NewTemplate::draft(self.template_owner(&user), TemplateInstance::new(json, version));

        let id = self
            .storage
            .insert_template(new_template)
            .await
            .map_err(|err| {
                tracing::error!("Failed to insert template: {}", err);
                ServiceError::InvalidTemplate
            })?;
        tracing::info!(template_id = %id, "Template created");

        Ok(id)
    }

    /// Templates of the caller matching `filter`. An empty result is `TemplateNotFound`.
    #[tracing::instrument(name = "Get templates.", skip(self, credential))]
    pub async fn get_templates(
        &self,
        credential: &Credential,
        filter: TemplateFilter,
    ) -> Result<Vec<Template>, ServiceError> {
        let owner = self.resolve_owner(credential).await?;
        let user = self
            .find_user(&owner)
            .await?
            .ok_or(ServiceError::InvalidUser)?;

        let query = TemplateQuery {
            id: filter.id,
            owner: Some(self.template_owner(&user)),
            is_published: filter.is_published,
        };

        let templates = self.storage.get_templates(&query).await.map_err(|err| {
            tracing::error!("Failed to fetch templates: {}", err);
            ServiceError::TemplateNotFound
        })?;

        if templates.is_empty() {
            return Err(ServiceError::TemplateNotFound);
        }

        Ok(templates)
    }

    /// User records of the caller under the provider's issuer.
    #[tracing::instrument(name = "Get user.", skip(self, credential))]
    pub async fn get_user(&self, credential: &Credential) -> Result<Vec<User>, ServiceError> {
        let owner = self.resolve_owner(credential).await?;
        let key = UserKey {
            auth_id: owner,
            issuer: self.issuer(),
        };

        let users = self.storage.get_users(&key).await.map_err(|err| {
            tracing::error!("Failed to fetch user: {}", err);
            ServiceError::InvalidUser
        })?;

        if users.is_empty() {
            return Err(ServiceError::UserNotFound);
        }

        Ok(users)
    }

    /// Deletes the caller's own user record and returns how many records were removed.
    /// `issuer` defaults to the provider's issuer; a name that is not a known issuer
    /// matches no user. Templates are handled according to the configured
    /// `UserDeletionPolicy`.
    #[tracing::instrument(name = "Remove user.", skip(self, credential, auth_id))]
    pub async fn remove_user(
        &self,
        credential: &Credential,
        auth_id: &str,
        issuer: Option<&str>,
    ) -> Result<u64, ServiceError> {
        let owner = self.resolve_owner(credential).await?;
        if auth_id != owner {
            tracing::warn!("Refused to delete another user's record");
            return Err(ServiceError::UnauthorizedUser);
        }

        let issuer = match issuer {
            Some(raw) => raw.parse::<Issuer>().map_err(|err| {
                tracing::debug!("Unknown issuer: {}", err);
                ServiceError::UserNotFound
            })?,
            None => self.issuer(),
        };
        let key = UserKey {
            auth_id: auth_id.to_string(),
            issuer,
        };

        let removed = match self.user_deletion {
            UserDeletionPolicy::Orphan => self.storage.remove_user(&key).await?,
            UserDeletionPolicy::Reject => {
                let user = self.stored_user(&key).await?;
                let owned = self
                    .storage
                    .count_templates_by_owner(&self.template_owner(&user))
                    .await?;
                if owned > 0 {
                    return Err(ServiceError::UserHasTemplates(owned));
                }
                self.storage.remove_user(&key).await?
            }
            UserDeletionPolicy::Cascade => {
                let user = self.stored_user(&key).await?;
                let (removed, templates) = self
                    .storage
                    .remove_user_with_templates(&key, &self.template_owner(&user))
                    .await?;
                tracing::info!(templates, "Removed templates of deleted user");
                removed
            }
        };

        if removed == 0 {
            return Err(ServiceError::UserNotFound);
        }

        Ok(removed)
    }

    async fn stored_user(&self, key: &UserKey) -> Result<User, ServiceError> {
        self.storage
            .get_users(key)
            .await?
            .into_iter()
            .next()
            .ok_or(ServiceError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTemplate;
    use crate::providers::authentication::StaticProvider;
    use crate::providers::storage::MemoryStorage;
    use crate::providers::ProviderError;
    use crate::services::ClientOptionsBuilder;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Counts every storage call before delegating to memory storage.
    /// Deletions fail while `fail_deletes` is set.
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        calls: AtomicUsize,
        fail_deletes: AtomicBool,
    }

    impl CountingStorage {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait::async_trait]
    impl StorageProvider for CountingStorage {
        async fn get_users(&self, key: &UserKey) -> Result<Vec<User>, ProviderError> {
            self.hit();
            self.inner.get_users(key).await
        }

        async fn find_or_insert_user(&self, user: NewUser) -> Result<(User, bool), ProviderError> {
            self.hit();
            self.inner.find_or_insert_user(user).await
        }

        async fn remove_user(&self, key: &UserKey) -> Result<u64, ProviderError> {
            self.hit();
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(ProviderError::Unavailable("delete failed".to_string()));
            }
            self.inner.remove_user(key).await
        }

        async fn remove_user_with_templates(
            &self,
            key: &UserKey,
            owner: &str,
        ) -> Result<(u64, u64), ProviderError> {
            self.hit();
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(ProviderError::Unavailable("delete failed".to_string()));
            }
            self.inner.remove_user_with_templates(key, owner).await
        }

        async fn insert_template(&self, template: NewTemplate) -> Result<String, ProviderError> {
            self.hit();
            self.inner.insert_template(template).await
        }

        async fn get_templates(
            &self,
            query: &TemplateQuery,
        ) -> Result<Vec<Template>, ProviderError> {
            self.hit();
            self.inner.get_templates(query).await
        }

        async fn count_templates_by_owner(&self, owner: &str) -> Result<u64, ProviderError> {
            self.hit();
            self.inner.count_templates_by_owner(owner).await
        }
    }

    /// Storage whose every call fails.
    struct BrokenStorage;

    #[async_trait::async_trait]
    impl StorageProvider for BrokenStorage {
        async fn get_users(&self, _key: &UserKey) -> Result<Vec<User>, ProviderError> {
            Err(ProviderError::Unavailable("down".to_string()))
        }

        async fn find_or_insert_user(&self, _user: NewUser) -> Result<(User, bool), ProviderError> {
            Err(ProviderError::Unavailable("down".to_string()))
        }

        async fn remove_user(&self, _key: &UserKey) -> Result<u64, ProviderError> {
            Err(ProviderError::Unavailable("down".to_string()))
        }

        async fn insert_template(&self, _template: NewTemplate) -> Result<String, ProviderError> {
            Err(ProviderError::Unavailable("down".to_string()))
        }

        async fn get_templates(
            &self,
            _query: &TemplateQuery,
        ) -> Result<Vec<Template>, ProviderError> {
            Err(ProviderError::Unavailable("down".to_string()))
        }

        async fn count_templates_by_owner(&self, _owner: &str) -> Result<u64, ProviderError> {
            Err(ProviderError::Unavailable("down".to_string()))
        }

        async fn remove_user_with_templates(
            &self,
            _key: &UserKey,
            _owner: &str,
        ) -> Result<(u64, u64), ProviderError> {
            Err(ProviderError::Unavailable("down".to_string()))
        }
    }

    fn tokens() -> StaticProvider {
        StaticProvider::new([("alice-token", "alice"), ("bob-token", "bob"), ("empty", "")])
    }

    fn service_with(
        storage: Arc<dyn StorageProvider>,
        owner_identity: OwnerIdentity,
        user_deletion: UserDeletionPolicy,
    ) -> TemplateService {
        let options = ClientOptionsBuilder::default()
            .storage_provider(storage)
            .authentication_provider(Arc::new(tokens()))
            .owner_identity(owner_identity)
            .user_deletion(user_deletion)
            .build()
            .unwrap();

        TemplateService::init(options)
    }

    fn service(storage: Arc<dyn StorageProvider>) -> TemplateService {
        service_with(storage, OwnerIdentity::AuthId, UserDeletionPolicy::Orphan)
    }

    fn alice() -> Credential {
        Credential::parse("Bearer alice-token").unwrap()
    }

    fn bob() -> Credential {
        Credential::parse("Bearer bob-token").unwrap()
    }

    fn alice_key() -> UserKey {
        UserKey {
            auth_id: "alice".to_string(),
            issuer: Issuer::Static,
        }
    }

    #[tokio::test]
    async fn first_post_creates_user_and_template() {
        let storage = Arc::new(MemoryStorage::new());
        let service = service(storage.clone());

        let id = service
            .post_template(&alice(), &json!({"a": 1}), None, None)
            .await
            .unwrap();

        let users = storage.get_users(&alice_key()).await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(users[0].team.is_empty() && users[0].org.is_empty());

        let templates = storage.get_templates(&TemplateQuery::default()).await.unwrap();
        assert_eq!(templates.len(), 1);
        let template = &templates[0];
        assert_eq!(template.id, id);
        assert_eq!(template.owner, "alice");
        assert!(!template.is_published);
        assert!(template.tags.is_empty());
        assert_eq!(template.instances.len(), 1);
        assert_eq!(template.instances[0].version, "1.0");
        assert_eq!(template.instances[0].json, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn second_post_reuses_user() {
        let storage = Arc::new(MemoryStorage::new());
        let service = service(storage.clone());

        service
            .post_template(&alice(), &json!({"a": 1}), None, None)
            .await
            .unwrap();
        service
            .post_template(&alice(), &json!({"b": 2}), Some("ignored"), Some("2.0"))
            .await
            .unwrap();

        assert_eq!(storage.get_users(&alice_key()).await.unwrap().len(), 1);
        let templates = storage.get_templates(&TemplateQuery::default()).await.unwrap();
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[1].instances[0].version, "2.0");
    }

    #[tokio::test]
    async fn concurrent_first_posts_create_one_user() {
        let storage = Arc::new(MemoryStorage::new());
        let service = Arc::new(service(storage.clone()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .post_template(&alice(), &json!({ "n": i }), None, None)
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(storage.get_users(&alice_key()).await.unwrap().len(), 1);
        assert_eq!(storage.count_templates_by_owner("alice").await.unwrap(), 8);
    }

    #[tokio::test]
    async fn user_id_owner_identity_stores_generated_id() {
        let storage = Arc::new(MemoryStorage::new());
        let service = service_with(
            storage.clone(),
            OwnerIdentity::UserId,
            UserDeletionPolicy::Orphan,
        );

        service
            .post_template(&alice(), &json!({"a": 1}), None, None)
            .await
            .unwrap();

        let user = storage.get_users(&alice_key()).await.unwrap().remove(0);
        let templates = service
            .get_templates(&alice(), TemplateFilter::default())
            .await
            .unwrap();
        assert_eq!(templates[0].owner, user.id);
    }

    #[tokio::test]
    async fn unresolved_owner_is_auth_failure() {
        let storage = Arc::new(CountingStorage::default());
        let service = service(storage.clone());
        let unknown = Credential::parse("Bearer nobody").unwrap();
        let empty = Credential::parse("Bearer empty").unwrap();

        for credential in [&unknown, &empty] {
            assert!(matches!(
                service.post_template(credential, &json!({}), None, None).await,
                Err(ServiceError::AuthFailure)
            ));
            assert!(matches!(
                service.get_templates(credential, TemplateFilter::default()).await,
                Err(ServiceError::AuthFailure)
            ));
            assert!(matches!(
                service.get_user(credential).await,
                Err(ServiceError::AuthFailure)
            ));
        }
        assert_eq!(storage.calls(), 0);
    }

    #[tokio::test]
    async fn provisioning_failure_is_invalid_user() {
        let service = service(Arc::new(BrokenStorage));

        assert!(matches!(
            service.post_template(&alice(), &json!({}), None, None).await,
            Err(ServiceError::InvalidUser)
        ));
    }

    #[tokio::test]
    async fn templates_of_unknown_user_are_invalid_user() {
        let service = service(Arc::new(MemoryStorage::new()));

        assert!(matches!(
            service.get_templates(&alice(), TemplateFilter::default()).await,
            Err(ServiceError::InvalidUser)
        ));
    }

    #[tokio::test]
    async fn empty_template_list_is_not_found() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .find_or_insert_user(NewUser::new("alice", Issuer::Static))
            .await
            .unwrap();
        let service = service(storage);

        assert!(matches!(
            service.get_templates(&alice(), TemplateFilter::default()).await,
            Err(ServiceError::TemplateNotFound)
        ));
    }

    #[tokio::test]
    async fn templates_are_scoped_to_caller_and_filters() {
        let service = service(Arc::new(MemoryStorage::new()));
        let id = service
            .post_template(&alice(), &json!({"a": 1}), None, None)
            .await
            .unwrap();
        service
            .post_template(&bob(), &json!({"b": 1}), None, None)
            .await
            .unwrap();

        let mine = service
            .get_templates(&alice(), TemplateFilter::default())
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, id);

        let by_id = service
            .get_templates(
                &alice(),
                TemplateFilter {
                    id: Some(id.clone()),
                    is_published: Some(false),
                },
            )
            .await
            .unwrap();
        assert_eq!(by_id[0].id, id);

        assert!(matches!(
            service
                .get_templates(
                    &alice(),
                    TemplateFilter {
                        is_published: Some(true),
                        ..Default::default()
                    }
                )
                .await,
            Err(ServiceError::TemplateNotFound)
        ));
        assert!(matches!(
            service
                .get_templates(
                    &bob(),
                    TemplateFilter {
                        id: Some(id),
                        ..Default::default()
                    }
                )
                .await,
            Err(ServiceError::TemplateNotFound)
        ));
    }

    #[tokio::test]
    async fn get_user_requires_record() {
        let service = service(Arc::new(MemoryStorage::new()));
        assert!(matches!(
            service.get_user(&alice()).await,
            Err(ServiceError::UserNotFound)
        ));

        service
            .post_template(&alice(), &json!({}), None, None)
            .await
            .unwrap();
        let users = service.get_user(&alice()).await.unwrap();
        assert_eq!(users[0].auth_id, "alice");
    }

    #[tokio::test]
    async fn deleting_another_user_is_unauthorized() {
        let storage = Arc::new(CountingStorage::default());
        let service = service(storage.clone());
        service
            .post_template(&bob(), &json!({}), None, None)
            .await
            .unwrap();
        let calls_before = storage.calls();

        assert!(matches!(
            service.remove_user(&alice(), "bob", Some("Static")).await,
            Err(ServiceError::UnauthorizedUser)
        ));
        assert_eq!(storage.calls(), calls_before);
        assert_eq!(
            storage
                .get_users(&UserKey {
                    auth_id: "bob".to_string(),
                    issuer: Issuer::Static
                })
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn orphan_policy_keeps_templates() {
        let storage = Arc::new(MemoryStorage::new());
        let service = service(storage.clone());
        service
            .post_template(&alice(), &json!({}), None, None)
            .await
            .unwrap();

        assert_eq!(
            service
                .remove_user(&alice(), "alice", Some("Static"))
                .await
                .unwrap(),
            1
        );
        assert!(storage.get_users(&alice_key()).await.unwrap().is_empty());
        assert_eq!(storage.count_templates_by_owner("alice").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn cascade_policy_removes_templates() {
        let storage = Arc::new(MemoryStorage::new());
        let service = service_with(
            storage.clone(),
            OwnerIdentity::AuthId,
            UserDeletionPolicy::Cascade,
        );
        service
            .post_template(&alice(), &json!({}), None, None)
            .await
            .unwrap();
        service
            .post_template(&bob(), &json!({}), None, None)
            .await
            .unwrap();

        service
            .remove_user(&alice(), "alice", Some("Static"))
            .await
            .unwrap();
        assert_eq!(storage.count_templates_by_owner("alice").await.unwrap(), 0);
        assert_eq!(storage.count_templates_by_owner("bob").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn cascade_policy_follows_user_id_owner_identity() {
        let storage = Arc::new(MemoryStorage::new());
        let service = service_with(
            storage.clone(),
            OwnerIdentity::UserId,
            UserDeletionPolicy::Cascade,
        );
        service
            .post_template(&alice(), &json!({}), None, None)
            .await
            .unwrap();

        service
            .remove_user(&alice(), "alice", Some("Static"))
            .await
            .unwrap();
        assert!(storage
            .get_templates(&TemplateQuery::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn reject_policy_refuses_while_templates_exist() {
        let storage = Arc::new(MemoryStorage::new());
        let service = service_with(
            storage.clone(),
            OwnerIdentity::AuthId,
            UserDeletionPolicy::Reject,
        );
        service
            .post_template(&alice(), &json!({}), None, None)
            .await
            .unwrap();

        assert!(matches!(
            service.remove_user(&alice(), "alice", Some("Static")).await,
            Err(ServiceError::UserHasTemplates(1))
        ));
        assert_eq!(storage.get_users(&alice_key()).await.unwrap().len(), 1);

        storage
            .find_or_insert_user(NewUser::new("bob", Issuer::Static))
            .await
            .unwrap();
        assert_eq!(service.remove_user(&bob(), "bob", None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_cascade_keeps_user_and_templates() {
        let storage = Arc::new(CountingStorage::default());
        let service = service_with(
            storage.clone(),
            OwnerIdentity::AuthId,
            UserDeletionPolicy::Cascade,
        );
        service
            .post_template(&alice(), &json!({}), None, None)
            .await
            .unwrap();
        storage.fail_deletes.store(true, Ordering::SeqCst);

        assert!(matches!(
            service.remove_user(&alice(), "alice", None).await,
            Err(ServiceError::Storage(_))
        ));
        assert_eq!(storage.get_users(&alice_key()).await.unwrap().len(), 1);
        assert_eq!(storage.count_templates_by_owner("alice").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn ownership_is_checked_before_issuer() {
        let service = service(Arc::new(MemoryStorage::new()));
        service
            .post_template(&bob(), &json!({}), None, None)
            .await
            .unwrap();

        assert!(matches!(
            service.remove_user(&alice(), "bob", Some("Bogus")).await,
            Err(ServiceError::UnauthorizedUser)
        ));
        assert!(matches!(
            service.remove_user(&bob(), "bob", Some("Bogus")).await,
            Err(ServiceError::UserNotFound)
        ));
        assert_eq!(service.remove_user(&bob(), "bob", None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn removing_missing_user_is_not_found() {
        let service = service(Arc::new(MemoryStorage::new()));

        assert!(matches!(
            service.remove_user(&alice(), "alice", Some("Static")).await,
            Err(ServiceError::UserNotFound)
        ));
    }
}
