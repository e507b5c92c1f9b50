use crate::helpers::{ApiError, JsonResponse};
use crate::providers::Credential;
use crate::services::{ServiceError, TemplateService};
use actix_web::{delete, web, Responder, Result};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct IssuerQuery {
    pub issuer: Option<String>,
}

#[tracing::instrument(name = "Delete user.", skip(credential, service))]
#[delete("/{auth_id}")]
pub async fn remove(
    credential: Credential,
    path: web::Path<(String,)>,
    query: web::Query<IssuerQuery>,
    service: web::Data<TemplateService>,
) -> Result<impl Responder> {
    let auth_id = path.into_inner().0;

    service
        .remove_user(&credential, &auth_id, query.issuer.as_deref())
        .await
        .map(|removed| JsonResponse::build().set_item(removed).ok("removed"))
        .map_err(|err| match err {
            ServiceError::AuthFailure => JsonResponse::<u64>::build().unauthorized(err.to_string()),
            ServiceError::UnauthorizedUser => {
                JsonResponse::<u64>::build().forbidden("Users may only delete themselves.")
            }
            ServiceError::UserHasTemplates(_) => {
                JsonResponse::<u64>::build().conflict(ApiError::UserHasTemplates, err.to_string())
            }
            ServiceError::Storage(ref cause) => {
                tracing::error!("Failed to delete user: {}", cause);
                JsonResponse::<u64>::build().internal_server_error("User could not be deleted.")
            }
            _ => JsonResponse::<u64>::build().not_found(ApiError::UserNotFound, "User not found."),
        })
}
