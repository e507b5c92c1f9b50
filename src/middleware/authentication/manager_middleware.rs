use crate::helpers::JsonResponse;
use crate::middleware::authentication::extract_credential;
use crate::providers::AuthenticationProvider;
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse},
    Error,
};
use futures::{
    future::{FutureExt, LocalBoxFuture},
    task::{Context, Poll},
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

pub struct ManagerMiddleware<S> {
    pub service: Rc<RefCell<S>>,
    pub provider: Arc<dyn AuthenticationProvider>,
}

#[tracing::instrument(name = "Authenticate request.", skip(provider, req))]
async fn try_authenticate(
    provider: Arc<dyn AuthenticationProvider>,
    req: &ServiceRequest,
) -> Result<(), String> {
    let credential = extract_credential(req.headers())?;

    match provider.is_valid(&credential).await {
        Ok(true) => Ok(()),
        Ok(false) => Err("Invalid authentication token.".to_string()),
        Err(err) => {
            tracing::warn!("Authentication provider failed: {}", err);
            Err("Invalid authentication token.".to_string())
        }
    }
}

impl<S, B> Service<ServiceRequest> for ManagerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = S::Error;
    type Future = LocalBoxFuture<'static, Result<ServiceResponse<B>, Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        if let Ok(service) = self.service.try_borrow_mut() {
            service.poll_ready(ctx)
        } else {
            Poll::Pending
        }
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let provider = self.provider.clone();
        async move {
            try_authenticate(provider, &req).await?;
            Ok(req)
        }
        .then(|req: Result<ServiceRequest, String>| async move {
            match req {
                Ok(req) => {
                    let fut = service.borrow_mut().call(req);
                    fut.await
                }
                Err(msg) => Err(JsonResponse::<()>::build().unauthorized(msg)),
            }
        })
        .boxed_local()
    }
}
