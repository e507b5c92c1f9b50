use crate::models;
use crate::providers::ProviderError;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    auth_id: String,
    issuer: String,
    team: Vec<String>,
    org: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for models::User {
    type Error = ProviderError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let issuer = row
            .issuer
            .parse::<models::Issuer>()
            .map_err(ProviderError::InvalidResponse)?;

        Ok(models::User {
            id: row.id.to_string(),
            auth_id: row.auth_id,
            issuer,
            team: row.team,
            org: row.org,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub async fn fetch_by_key(
    pool: &PgPool,
    key: &models::UserKey,
) -> Result<Vec<models::User>, ProviderError> {
    let query_span = tracing::info_span!("Fetch users by auth id.", issuer = %key.issuer);
    sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, auth_id, issuer, team, org, created_at, updated_at
        FROM users
        WHERE auth_id = $1 AND issuer = $2
        "#,
    )
    .bind(&key.auth_id)
    .bind(key.issuer.as_str())
    .fetch_all(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch users, error: {:?}", err);
        ProviderError::from(err)
    })?
    .into_iter()
    .map(models::User::try_from)
    .collect()
}

/// Inserts the user unless (auth_id, issuer) is already taken. `None` means it was.
pub async fn insert_if_absent(
    pool: &PgPool,
    user: &models::NewUser,
) -> Result<Option<models::User>, ProviderError> {
    let query_span = tracing::info_span!("Saving user into the database", issuer = %user.issuer);
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, auth_id, issuer, team, org, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
        ON CONFLICT (auth_id, issuer) DO NOTHING
        RETURNING id, auth_id, issuer, team, org, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&user.auth_id)
    .bind(user.issuer.as_str())
    .bind(&user.team)
    .bind(&user.org)
    .fetch_optional(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        ProviderError::from(err)
    })?;

    row.map(models::User::try_from).transpose()
}

#[tracing::instrument(name = "Delete user.", skip(pool))]
pub async fn delete_by_key(pool: &PgPool, key: &models::UserKey) -> Result<u64, ProviderError> {
    sqlx::query("DELETE FROM users WHERE auth_id = $1 AND issuer = $2")
        .bind(&key.auth_id)
        .bind(key.issuer.as_str())
        .execute(pool)
        .await
        .map(|result| result.rows_affected())
        .map_err(|err| {
            tracing::error!("Failed to delete user: {:?}", err);
            ProviderError::from(err)
        })
}

/// Deletes the user and the templates of `owner` in one transaction.
#[tracing::instrument(name = "Delete user with templates.", skip(pool))]
pub async fn delete_with_templates(
    pool: &PgPool,
    key: &models::UserKey,
    owner: &str,
) -> Result<(u64, u64), ProviderError> {
    async {
        let mut tx = pool.begin().await?;

        let users = sqlx::query("DELETE FROM users WHERE auth_id = $1 AND issuer = $2")
            .bind(&key.auth_id)
            .bind(key.issuer.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let templates = sqlx::query("DELETE FROM templates WHERE owner = $1")
            .bind(owner)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok((users, templates))
    }
    .await
    .map_err(|err: sqlx::Error| {
        tracing::error!("Failed to delete user with templates: {:?}", err);
        ProviderError::from(err)
    })
}
