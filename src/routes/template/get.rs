use crate::helpers::{ApiError, JsonResponse};
use crate::models::Template;
use crate::providers::Credential;
use crate::services::{ServiceError, TemplateFilter, TemplateService};
use actix_web::{get, web, Error, Responder, Result};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateListQuery {
    pub is_published: Option<bool>,
    pub name: Option<String>,
    pub version: Option<String>,
}

fn failure(err: ServiceError) -> Error {
    match err {
        ServiceError::AuthFailure => JsonResponse::<Template>::build().unauthorized(err.to_string()),
        _ => JsonResponse::<Template>::build()
            .not_found(ApiError::TemplateNotFound, "Template not found."),
    }
}

#[tracing::instrument(name = "Get template list.", skip(credential, service))]
#[get("")]
pub async fn list(
    credential: Credential,
    query: web::Query<TemplateListQuery>,
    service: web::Data<TemplateService>,
) -> Result<impl Responder> {
    let query = query.into_inner();
    if query.name.is_some() || query.version.is_some() {
        return Err(JsonResponse::<Template>::build()
            .not_implemented("Filtering by name or version is not supported."));
    }

    let filter = TemplateFilter {
        id: None,
        is_published: query.is_published,
    };

    service
        .get_templates(&credential, filter)
        .await
        .map(|templates| JsonResponse::build().set_list(templates).ok("templates"))
        .map_err(failure)
}

#[tracing::instrument(name = "Get template.", skip(credential, service))]
#[get("/{id}")]
pub async fn item(
    credential: Credential,
    path: web::Path<(String,)>,
    service: web::Data<TemplateService>,
) -> Result<impl Responder> {
    let filter = TemplateFilter {
        id: Some(path.into_inner().0),
        is_published: None,
    };

    service
        .get_templates(&credential, filter)
        .await
        .map(|templates| JsonResponse::build().set_list(templates).ok("templates"))
        .map_err(failure)
}
