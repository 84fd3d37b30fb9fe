use actix_web::{dev::Server, web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::auth::TokenCodec;
use crate::configuration::JwtSettings;
use crate::middleware::AccessGuard;
use crate::routes::{
    current_user, health_check, list_users, login, logout, refresh, register,
};
use crate::store::PgUserStore;

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    jwt_config: JwtSettings,
) -> Result<Server, std::io::Error> {
    let store = web::Data::new(PgUserStore::new(connection));
    let codec = TokenCodec::new(&jwt_config);
    let codec_data = web::Data::new(codec.clone());

    let server = HttpServer::new(move || {
        App::new()
            // Shared state
            .app_data(store.clone())
            .app_data(codec_data.clone())

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            .route("/auth/logout", web::post().to(logout))
            .route("/users", web::get().to(list_users))

            // Protected routes (require a valid access token)
            .service(
                web::scope("/auth/me")
                    .wrap(AccessGuard::new(codec.clone()))
                    .route("", web::get().to(current_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
