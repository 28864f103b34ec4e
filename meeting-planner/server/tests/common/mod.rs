#![allow(dead_code)]

use meeting_planner_server::meeting::store::SeaOrmMeetingStore;
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::{postgres, testcontainers};

pub async fn setup_container() -> anyhow::Result<testcontainers::ContainerAsync<postgres::Postgres>>
{
    let container = postgres::Postgres::default().start().await?;
    Ok(container)
}

pub async fn setup_db(
    container: &testcontainers::ContainerAsync<postgres::Postgres>,
) -> anyhow::Result<DatabaseConnection> {
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let db_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
    let db = Database::connect(&db_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Test context backed by a fresh PostgreSQL container.
pub struct TestContext {
    // container is kept to ensure it's not dropped
    pub container: testcontainers::ContainerAsync<postgres::Postgres>,
    pub db: DatabaseConnection,
}

impl TestContext {
    pub fn store(&self) -> SeaOrmMeetingStore {
        SeaOrmMeetingStore::new(self.db.clone())
    }
}

pub async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let container = setup_container().await?;
    let db = setup_db(&container).await?;
    Ok(TestContext { db, container })
}

/// Local wall-clock dates of the shared fixture, one per city.
pub const PARIS: (&str, &str) = ("2017-01-03T12:30:30", "Europe/Paris");
pub const SAO_PAULO: (&str, &str) = ("2019-03-03T12:30:30", "America/Sao_Paulo");
pub const BERLIN: (&str, &str) = ("2018-02-03T12:30:30", "Europe/Berlin");
pub const TOKYO: (&str, &str) = ("2018-11-03T09:30:30", "Asia/Tokyo");
pub const LOS_ANGELES: (&str, &str) = ("2019-11-11T19:30:30", "America/Los_Angeles");
