use crate::forms::TemplateForm;
use crate::helpers::{ApiError, JsonResponse};
use crate::providers::Credential;
use crate::services::{ServiceError, TemplateService};
use actix_web::{post, web, Responder, Result};
use serde_valid::Validate;

#[tracing::instrument(name = "Add template.", skip(credential, form, service))]
#[post("")]
pub async fn create(
    credential: Credential,
    form: web::Json<TemplateForm>,
    service: web::Data<TemplateService>,
) -> Result<impl Responder> {
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::<String>::build()
            .bad_request(ApiError::InvalidTemplate, errors.to_string()));
    }

    let template = form.template_json().map_err(|msg| {
        JsonResponse::<String>::build().bad_request(ApiError::InvalidTemplate, msg)
    })?;

    service
        .post_template(
            &credential,
            &template,
            form.id.as_deref(),
            form.version.as_deref(),
        )
        .await
        .map(|id| JsonResponse::build().set_item(id).created())
        .map_err(|err| match err {
            ServiceError::AuthFailure => {
                JsonResponse::<String>::build().unauthorized(err.to_string())
            }
            _ => JsonResponse::<String>::build()
                .bad_request(ApiError::InvalidTemplate, "Template could not be stored."),
        })
}
