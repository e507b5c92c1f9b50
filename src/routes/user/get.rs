use crate::helpers::{ApiError, JsonResponse};
use crate::models::User;
use crate::providers::Credential;
use crate::services::{ServiceError, TemplateService};
use actix_web::{get, web, Responder, Result};

#[tracing::instrument(name = "Get user.", skip(credential, service))]
#[get("")]
pub async fn item(
    credential: Credential,
    service: web::Data<TemplateService>,
) -> Result<impl Responder> {
    service
        .get_user(&credential)
        .await
        .map(|users| JsonResponse::build().set_list(users).ok("user"))
        .map_err(|err| match err {
            ServiceError::AuthFailure => JsonResponse::<User>::build().unauthorized(err.to_string()),
            _ => JsonResponse::<User>::build().not_found(ApiError::UserNotFound, "User not found."),
        })
}
