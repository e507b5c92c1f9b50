use crate::models;
use crate::providers::ProviderError;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    owner: String,
    is_published: bool,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct InstanceRow {
    template_id: Uuid,
    json: String,
    version: String,
}

/// Inserts the template and its instances in one transaction.
pub async fn insert(pool: &PgPool, template: &models::NewTemplate) -> Result<String, ProviderError> {
    let query_span = tracing::info_span!("Saving template into the database", owner = %template.owner);
    let id = Uuid::new_v4();

    async {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO templates (id, owner, is_published, tags, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(&template.owner)
        .bind(template.is_published)
        .bind(&template.tags)
        .execute(&mut *tx)
        .await?;

        for (position, instance) in template.instances.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO template_instances (id, template_id, position, json, version)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(id)
            .bind(position as i32)
            .bind(&instance.json)
            .bind(&instance.version)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }
    .instrument(query_span)
    .await
    .map(|_| id.to_string())
    .map_err(|err: sqlx::Error| {
        tracing::error!("Failed to insert template: {:?}", err);
        ProviderError::from(err)
    })
}

pub async fn fetch(
    pool: &PgPool,
    query: &models::TemplateQuery,
) -> Result<Vec<models::Template>, ProviderError> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT id, owner, is_published, tags, created_at, updated_at FROM templates WHERE TRUE",
    );

    if let Some(id) = &query.id {
        // ids are UUIDs; anything else cannot match
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(vec![]);
        };
        builder.push(" AND id = ").push_bind(id);
    }
    if let Some(owner) = &query.owner {
        builder.push(" AND owner = ").push_bind(owner.clone());
    }
    if let Some(is_published) = query.is_published {
        builder.push(" AND is_published = ").push_bind(is_published);
    }
    builder.push(" ORDER BY created_at, id");

    let query_span = tracing::info_span!("Fetch templates.");
    let rows = builder
        .build_query_as::<TemplateRow>()
        .fetch_all(pool)
        .instrument(query_span)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch templates, error: {:?}", err);
            ProviderError::from(err)
        })?;

    if rows.is_empty() {
        return Ok(vec![]);
    }

    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let instances = sqlx::query_as::<_, InstanceRow>(
        r#"
        SELECT template_id, json, version
        FROM template_instances
        WHERE template_id = ANY($1)
        ORDER BY template_id, position
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .instrument(tracing::info_span!("Fetch template instances."))
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch template instances, error: {:?}", err);
        ProviderError::from(err)
    })?;

    let mut grouped: HashMap<Uuid, Vec<models::TemplateInstance>> = HashMap::new();
    for instance in instances {
        grouped
            .entry(instance.template_id)
            .or_default()
            .push(models::TemplateInstance {
                json: instance.json,
                version: instance.version,
            });
    }

    Ok(rows
        .into_iter()
        .map(|row| models::Template {
            id: row.id.to_string(),
            instances: grouped.remove(&row.id).unwrap_or_default(),
            owner: row.owner,
            is_published: row.is_published,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect())
}

pub async fn count_by_owner(pool: &PgPool, owner: &str) -> Result<u64, ProviderError> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM templates WHERE owner = $1")
        .bind(owner)
        .fetch_one(pool)
        .instrument(tracing::info_span!("Count templates of owner."))
        .await
        .map(|count| count as u64)
        .map_err(|err| {
            tracing::error!("Failed to count templates: {:?}", err);
            ProviderError::from(err)
        })
}
