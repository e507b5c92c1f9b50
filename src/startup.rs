use crate::configuration::Settings;
use crate::helpers::{ApiError, JsonResponse};
use crate::middleware::authentication::Manager;
use crate::routes;
use crate::services::TemplateService;
use actix_cors::Cors;
use actix_web::{dev::Server, web, App, HttpServer};
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub async fn run(
    listener: TcpListener,
    service: TemplateService,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let authentication = service.authentication();
    let service = web::Data::new(service);
    let mount_path = settings.service.mount_path.trim_end_matches('/').to_string();

    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!("Rejected request body: {}", err);
        JsonResponse::<()>::build().bad_request(ApiError::InvalidTemplate, err.to_string())
    });

    let query_config = web::QueryConfig::default().error_handler(|err, _req| {
        tracing::debug!("Rejected query string: {}", err);
        JsonResponse::<()>::build().bad_request(ApiError::InvalidTemplate, err.to_string())
    });

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .app_data(json_config.clone())
            .app_data(query_config.clone())
            .app_data(service.clone())
            .service(web::scope("/health_check").service(routes::health_check))
            .service(
                web::scope(&mount_path)
                    .service(
                        web::scope("/template")
                            .wrap(Manager::new(authentication.clone()))
                            .service(routes::template::list)
                            .service(routes::template::item)
                            .service(routes::template::create),
                    )
                    .service(
                        web::scope("/user")
                            .wrap(Manager::new(authentication.clone()))
                            .service(routes::user::item)
                            .service(routes::user::remove),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
