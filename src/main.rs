mod config;
mod db;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use config::Config;
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

use crate::db::db::DBClient;
use crate::service::{chat_service::ChatService, feed::MessageFeed, ledger::MessageLedger};

pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub chat_service: Arc<ChatService<DBClient>>,
    pub ledger: Arc<MessageLedger<DBClient>>,
    pub feed: Arc<MessageFeed>,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client_arc = Arc::new(db_client);
        let feed = Arc::new(MessageFeed::new());

        let chat_service = Arc::new(ChatService::new(db_client_arc.clone(), feed.clone()));
        let ledger = Arc::new(MessageLedger::new(db_client_arc.clone(), feed.clone()));

        Self {
            env: config,
            db_client: db_client_arc,
            chat_service,
            ledger,
            feed,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::INFO)
        .init();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("connected to the database");
            pool
        }
        Err(err) => {
            tracing::error!("failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!().run(&pool).await {
        tracing::error!("failed to run migrations: {:?}", err);
        std::process::exit(1);
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT]);

    let app_state = Arc::new(AppState::new(DBClient::new(pool), config.clone()));

    // Keeps the badge pipeline observable in the logs; clients register their
    // own subscriptions and recompute unread counts on each event.
    let _ledger_sub = app_state
        .feed
        .subscribe(|event| tracing::debug!(?event, "message ledger changed"));

    let app = create_router(app_state).layer(cors);

    tracing::info!("server is running on http://localhost:{}", config.port);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .unwrap();

    axum::serve(listener, app).await.unwrap();
}
