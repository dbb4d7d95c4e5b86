use std::io;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, middleware, web};

use storyfoundry::config::{AppConfig, session_key};
use storyfoundry::handlers::{AppState, api_v1, workflow_handlers};
use storyfoundry::workflow::{PgBackend, WorkflowCache};
use storyfoundry::{auth, db};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().map_err(io::Error::other)?;

    let pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .map_err(io::Error::other)?;
    db::run_migrations(&pool).await.map_err(io::Error::other)?;

    let state = web::Data::new(AppState::new(
        PgBackend::new(pool.clone()),
        WorkflowCache::new(config.cache_ttl),
    ));
    let pool = web::Data::new(pool);
    let secret_key = session_key();
    let secure_cookies = config.secure_cookies;

    log::info!(
        "Starting server at http://{} (workflow cache ttl {}s)",
        config.bind_addr,
        config.cache_ttl.num_seconds()
    );

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
            .cookie_secure(secure_cookies)
            .cookie_http_only(true)
            .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(pool.clone())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .wrap(middleware::from_fn(api_v1::require_json_content_type))
                    .wrap(middleware::from_fn(auth::middleware::require_actor))
                    .configure(api_v1::configure)
                    .configure(workflow_handlers::configure_api::<PgBackend>),
            )
            .service(
                web::scope("")
                    .wrap(middleware::from_fn(auth::middleware::require_actor))
                    .configure(workflow_handlers::configure_pages::<PgBackend>),
            )
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
