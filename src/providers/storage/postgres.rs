use crate::db;
use crate::models::{NewTemplate, NewUser, Template, TemplateQuery, User, UserKey};
use crate::providers::errors::ProviderError;
use crate::providers::storage::StorageProvider;
use sqlx::PgPool;

/// Postgres-backed storage. Schema lives in `migrations/`.
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), ProviderError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl StorageProvider for PostgresStorage {
    async fn get_users(&self, key: &UserKey) -> Result<Vec<User>, ProviderError> {
        db::user::fetch_by_key(&self.pool, key).await
    }

    async fn find_or_insert_user(&self, user: NewUser) -> Result<(User, bool), ProviderError> {
        if let Some(created) = db::user::insert_if_absent(&self.pool, &user).await? {
            return Ok((created, true));
        }

        db::user::fetch_by_key(&self.pool, &user.key())
            .await?
            .into_iter()
            .next()
            .map(|existing| (existing, false))
            .ok_or_else(|| {
                ProviderError::Internal("user vanished between insert and lookup".to_string())
            })
    }

    async fn remove_user(&self, key: &UserKey) -> Result<u64, ProviderError> {
        db::user::delete_by_key(&self.pool, key).await
    }

    async fn remove_user_with_templates(
        &self,
        key: &UserKey,
        owner: &str,
    ) -> Result<(u64, u64), ProviderError> {
        db::user::delete_with_templates(&self.pool, key, owner).await
    }

    async fn insert_template(&self, template: NewTemplate) -> Result<String, ProviderError> {
        if template.instances.is_empty() {
            return Err(ProviderError::Internal(
                "template must hold at least one instance".to_string(),
            ));
        }
        db::template::insert(&self.pool, &template).await
    }

    async fn get_templates(&self, query: &TemplateQuery) -> Result<Vec<Template>, ProviderError> {
        db::template::fetch(&self.pool, query).await
    }

    async fn count_templates_by_owner(&self, owner: &str) -> Result<u64, ProviderError> {
        db::template::count_by_owner(&self.pool, owner).await
    }
}
