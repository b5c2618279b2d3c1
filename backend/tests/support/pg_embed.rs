//! Embedded PostgreSQL for the Diesel adapter suites.
//!
//! One cluster is bootstrapped per test binary through
//! `pg-embed-setup-unpriv`. Each test then receives its own database, cloned
//! from a template that already carries the booking migrations, so suites
//! never observe each other's rows.
//!
//! Setup failures skip the calling test with a `SKIP-TEST-CLUSTER` marker.
//! Set `EVENTBOOK_REQUIRE_TEST_CLUSTER=1` to turn them into failures instead.

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use pg_embedded_setup_unpriv::test_support::hash_directory;
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use uuid::Uuid;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const TEMPLATE_NAME_PREFIX: &str = "eventbook_template";
const BOOTSTRAP_RETRIES: usize = 3;
const BOOTSTRAP_RETRY_DELAY: Duration = Duration::from_millis(500);
const STABLE_PASSWORD: &str = "eventbook_embedded_test";

static BOOTSTRAP_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn lock(cell: &'static OnceLock<Mutex<()>>) -> std::sync::MutexGuard<'static, ()> {
    cell.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner())
}

fn pg_embed_dir() -> PathBuf {
    std::env::var_os("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("target"))
        .join("pg-embed")
        .join(format!("eventbook-{}", std::process::id()))
}

/// Returns the process-wide cluster, bootstrapping it on first use.
///
/// `PG_RUNTIME_DIR`, `PG_DATA_DIR` and `PG_PASSWORD` are pointed at
/// workspace-local values for the bootstrap call when the caller has not
/// set them.
pub fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    let _bootstrap = lock(&BOOTSTRAP_LOCK);
    let base = pg_embed_dir();
    let mut overrides = Vec::new();
    if std::env::var_os("PG_RUNTIME_DIR").is_none() || std::env::var_os("PG_DATA_DIR").is_none() {
        let runtime_dir = base.join("install");
        let data_dir = base.join("data");
        std::fs::create_dir_all(&runtime_dir).map_err(|err| err.to_string())?;
        std::fs::create_dir_all(&data_dir).map_err(|err| err.to_string())?;
        overrides.push(("PG_RUNTIME_DIR", Some(runtime_dir.to_string_lossy().into_owned())));
        overrides.push(("PG_DATA_DIR", Some(data_dir.to_string_lossy().into_owned())));
    }
    if std::env::var_os("PG_PASSWORD").is_none() {
        overrides.push(("PG_PASSWORD", Some(STABLE_PASSWORD.to_owned())));
    }
    let _env = env_lock::lock_env(overrides);

    let mut attempt = 1;
    loop {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(err) if attempt >= BOOTSTRAP_RETRIES => return Err(format!("{err:?}")),
            Err(_) => {
                std::thread::sleep(BOOTSTRAP_RETRY_DELAY);
                attempt += 1;
            }
        }
    }
}

fn template_database_name() -> Result<String, String> {
    let migrations = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let hash = hash_directory(migrations).map_err(|err| format!("hash migrations: {err}"))?;
    let short_hash = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_NAME_PREFIX}_{short_hash}"))
}

/// Creates or reuses a template database with every migration applied.
fn ensure_template_database(cluster: &ClusterHandle) -> Result<String, String> {
    let template_name = template_database_name()?;
    let _template = lock(&TEMPLATE_LOCK);

    let exists = cluster
        .database_exists(template_name.as_str())
        .map_err(|err| format!("template check: {err:?}"))?;
    if !exists {
        cluster
            .create_database(template_name.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        migrate_schema(&cluster.connection().database_url(&template_name))?;
    }
    Ok(template_name)
}

/// Clones a fresh database from the migration template.
pub fn provision_database(cluster: &ClusterHandle) -> Result<TemporaryDatabase, String> {
    let template_name = ensure_template_database(cluster)?;
    let db_name = format!("test_{}", Uuid::new_v4().simple());
    cluster
        .temporary_database_from_template(db_name.as_str(), template_name.as_str())
        .map_err(|err| format!("create database from template: {err:?}"))
}

fn migrate_schema(url: &str) -> Result<(), String> {
    let mut conn = PgConnection::establish(url).map_err(|err| format!("connect: {err}"))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| format!("migration: {err}"))?;
    Ok(())
}

fn cluster_required() -> bool {
    std::env::var("EVENTBOOK_REQUIRE_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skips the calling test unless the cluster is required.
pub fn handle_cluster_setup_failure<T>(reason: impl Display) -> Option<T> {
    if cluster_required() {
        panic!("test cluster setup failed: {reason}");
    }
    eprintln!("SKIP-TEST-CLUSTER: {reason}");
    None
}
