use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::{AppState, Repositories};
use crate::infra::push::http_push_service::HttpPushService;
use crate::infra::repositories::{
    postgres_announcement_repo::PostgresAnnouncementRepo, postgres_device_repo::PostgresDeviceRepo,
    postgres_event_repo::PostgresEventRepo, postgres_guest_event_repo::PostgresGuestEventRepo,
    postgres_schedule_repo::PostgresScheduleRepo, postgres_user_repo::PostgresUserRepo,
    sqlite_announcement_repo::SqliteAnnouncementRepo, sqlite_device_repo::SqliteDeviceRepo,
    sqlite_event_repo::SqliteEventRepo, sqlite_guest_event_repo::SqliteGuestEventRepo,
    sqlite_schedule_repo::SqliteScheduleRepo, sqlite_user_repo::SqliteUserRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;
    let push_service = Arc::new(HttpPushService::new(
        config.push_gateway_url.clone(),
        config.push_gateway_token.clone(),
    ));

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;
        postgres_repositories(pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;
        sqlite_repositories(pool)
    };

    AppState::assemble(config, repos, push_service)
}

pub fn sqlite_repositories(pool: SqlitePool) -> Repositories {
    let events = Arc::new(SqliteEventRepo::new(pool.clone()));
    Repositories {
        users: Arc::new(SqliteUserRepo::new(pool.clone())),
        events: events.clone(),
        short_codes: events,
        guests: Arc::new(SqliteGuestEventRepo::new(pool.clone())),
        schedule: Arc::new(SqliteScheduleRepo::new(pool.clone())),
        announcements: Arc::new(SqliteAnnouncementRepo::new(pool.clone())),
        devices: Arc::new(SqliteDeviceRepo::new(pool)),
    }
}

pub fn postgres_repositories(pool: PgPool) -> Repositories {
    let events = Arc::new(PostgresEventRepo::new(pool.clone()));
    Repositories {
        users: Arc::new(PostgresUserRepo::new(pool.clone())),
        events: events.clone(),
        short_codes: events,
        guests: Arc::new(PostgresGuestEventRepo::new(pool.clone())),
        schedule: Arc::new(PostgresScheduleRepo::new(pool.clone())),
        announcements: Arc::new(PostgresAnnouncementRepo::new(pool.clone())),
        devices: Arc::new(PostgresDeviceRepo::new(pool)),
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
