use crate::helpers::JsonResponse;
use crate::middleware::authentication::get_header;
use crate::providers::Credential;
use actix_web::{dev::Payload, http::header::HeaderMap, Error, FromRequest, HttpRequest};
use std::future::{ready, Ready};

/// Reads the `Authorization` header as a credential.
pub fn extract_credential(headers: &HeaderMap) -> Result<Credential, String> {
    get_header::<String>(headers, "authorization")?
        .ok_or_else(|| "Missing credentials.".to_string())
        .and_then(|raw| Credential::parse(&raw))
}

impl FromRequest for Credential {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            extract_credential(req.headers())
                .map_err(|msg| JsonResponse::<()>::build().unauthorized(msg)),
        )
    }
}
