use crate::models::{NewTemplate, NewUser, Template, TemplateQuery, User, UserKey};
use crate::providers::errors::ProviderError;
use crate::providers::storage::StorageProvider;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-process storage. Templates are kept in insertion order.
#[derive(Default)]
pub struct MemoryStorage {
    users: RwLock<Vec<User>>,
    templates: RwLock<Vec<Template>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StorageProvider for MemoryStorage {
    async fn get_users(&self, key: &UserKey) -> Result<Vec<User>, ProviderError> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|user| user.key() == *key).cloned().collect())
    }

    async fn find_or_insert_user(&self, user: NewUser) -> Result<(User, bool), ProviderError> {
        let key = user.key();
        // lookup and insert under one write lock
        let mut users = self.users.write().await;
        if let Some(existing) = users.iter().find(|existing| existing.key() == key) {
            return Ok((existing.clone(), false));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4().to_string(),
            auth_id: user.auth_id,
            issuer: user.issuer,
            team: user.team,
            org: user.org,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());

        Ok((created, true))
    }

    async fn remove_user(&self, key: &UserKey) -> Result<u64, ProviderError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|user| user.key() != *key);

        Ok((before - users.len()) as u64)
    }

    async fn remove_user_with_templates(
        &self,
        key: &UserKey,
        owner: &str,
    ) -> Result<(u64, u64), ProviderError> {
        // users before templates, the only order both locks are taken in
        let mut users = self.users.write().await;
        let mut templates = self.templates.write().await;

        let users_before = users.len();
        users.retain(|user| user.key() != *key);
        let templates_before = templates.len();
        templates.retain(|t| t.owner != owner);

        Ok((
            (users_before - users.len()) as u64,
            (templates_before - templates.len()) as u64,
        ))
    }

    async fn insert_template(&self, template: NewTemplate) -> Result<String, ProviderError> {
        if template.instances.is_empty() {
            return Err(ProviderError::Internal(
                "template must hold at least one instance".to_string(),
            ));
        }

        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        self.templates.write().await.push(Template {
            id: id.clone(),
            owner: template.owner,
            is_published: template.is_published,
            tags: template.tags,
            instances: template.instances,
            created_at: now,
            updated_at: now,
        });

        Ok(id)
    }

    async fn get_templates(&self, query: &TemplateQuery) -> Result<Vec<Template>, ProviderError> {
        let templates = self.templates.read().await;
        Ok(templates
            .iter()
            .filter(|template| query.matches(template))
            .cloned()
            .collect())
    }

    async fn count_templates_by_owner(&self, owner: &str) -> Result<u64, ProviderError> {
        let templates = self.templates.read().await;
        Ok(templates.iter().filter(|t| t.owner == owner).count() as u64)
    }
}
