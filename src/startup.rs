use actix_web::{web, App, HttpServer};
use actix_web::dev::Server;
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{Authenticator, SessionManager, TokenCodec};
use crate::middleware::AuthMiddleware;
use crate::routes::{
    delete_me, health_check, login, logout, me, refresh, register, update_me,
};
use crate::store::SharedStore;

pub fn run(
    listener: TcpListener,
    store: SharedStore,
    codec: Arc<TokenCodec>,
) -> Result<Server, std::io::Error> {
    let manager = web::Data::new(SessionManager::new(store.clone(), codec.clone()));
    let store_data = web::Data::new(store.clone());
    let authenticator = Authenticator::new(store, codec);

    let server = HttpServer::new(move || {
        App::new()
            // Shared state
            .app_data(manager.clone())
            .app_data(store_data.clone())

            // Public routes (no authentication required)
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/logout", web::post().to(logout)),
            )

            // Protected routes (bearer token or refresh cookie)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(authenticator.clone()))
                    .route("/me", web::get().to(me))
                    .route("/me", web::put().to(update_me))
                    .route("/me", web::delete().to(delete_me)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
