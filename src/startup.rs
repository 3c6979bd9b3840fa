use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::SessionKeys;
use crate::configuration::{ApplicationSettings, JwtSettings};
use crate::domain::{Captain, Role, User};
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::{SessionGuard, SessionVerifier};
use crate::routes::{health_check, login, logout, profile, register_captain, register_user};
use crate::store::Stores;

/// Largest JSON body accepted by any endpoint.
const JSON_BODY_LIMIT: usize = 16 * 1024;

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            AppError::from(ValidationError::MalformedBody(err.to_string())).into()
        })
}

pub fn run(
    listener: TcpListener,
    stores: Stores,
    jwt_config: JwtSettings,
    app_config: ApplicationSettings,
) -> Result<Server, std::io::Error> {
    let user_verifier = SessionVerifier::<User>::new(
        SessionKeys::for_role(Role::User, &jwt_config),
        stores.users.clone(),
        stores.ledger.clone(),
    );
    let captain_verifier = SessionVerifier::<Captain>::new(
        SessionKeys::for_role(Role::Captain, &jwt_config),
        stores.captains.clone(),
        stores.ledger.clone(),
    );

    let user_data = web::Data::new(user_verifier.clone());
    let captain_data = web::Data::new(captain_verifier.clone());
    let app_config = web::Data::new(app_config);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            // Shared state
            .app_data(json_config())
            .app_data(user_data.clone())
            .app_data(captain_data.clone())
            .app_data(app_config.clone())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/users")
                    .route("/register", web::post().to(register_user))
                    .route("/login", web::post().to(login::<User>))
                    .route("/logout", web::post().to(logout::<User>))
                    .service(
                        web::resource("/profile")
                            .wrap(SessionGuard::new(user_verifier.clone()))
                            .route(web::get().to(profile::<User>)),
                    ),
            )
            .service(
                web::scope("/captains")
                    .route("/register", web::post().to(register_captain))
                    .route("/login", web::post().to(login::<Captain>))
                    .route("/logout", web::post().to(logout::<Captain>))
                    .service(
                        web::resource("/profile")
                            .wrap(SessionGuard::new(captain_verifier.clone()))
                            .route(web::get().to(profile::<Captain>)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
