//! Fill free event slots from waitlists, oldest entry first.
//!
//! Runs one reconciliation pass against the booking database for a single
//! event (`--event-id`) or for every event that currently has waitlist
//! entries. `EVENTBOOK_DATABASE_URL` must be set.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use eventbook::config::BookingSettings;
use eventbook::domain::ports::WaitlistPromotion;
use eventbook::domain::{EventId, PromotionEngine, ReconciliationReport};
use eventbook::outbound::persistence::{
    DbPool, DieselAdmissionLedger, DieselEventRepository, DieselUserRepository,
    DieselWaitlistRepository, PoolConfig,
};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

/// `reconcile-waitlists` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "reconcile-waitlists",
    about = "Promote waitlisted users into free event slots",
    version
)]
struct CliArgs {
    /// Reconcile only this event. Omit to reconcile every event with a
    /// non-empty waitlist.
    #[arg(long = "event-id", value_name = "uuid")]
    event_id: Option<Uuid>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let settings = BookingSettings::load_from_iter([OsString::from("reconcile-waitlists")])
        .map_err(|error| eyre!("failed to load configuration: {error}"))?;
    let pool_config = require_pool_config(&settings)?;
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build Tokio runtime")?;

    let target = args.event_id.map(EventId::from_uuid);
    let reports = runtime.block_on(reconcile_database(pool_config, target))?;
    write_reports(&mut io::stdout().lock(), &reports).wrap_err("failed to write report")
}

fn require_pool_config(settings: &BookingSettings) -> Result<PoolConfig> {
    settings
        .pool_config()
        .ok_or_else(|| eyre!("EVENTBOOK_DATABASE_URL must point at the booking database"))
}

async fn reconcile_database(
    config: PoolConfig,
    target: Option<EventId>,
) -> Result<Vec<ReconciliationReport>> {
    let pool = DbPool::new(config)
        .await
        .wrap_err("failed to create database pool")?;
    let engine = PromotionEngine::new(
        Arc::new(DieselEventRepository::new(pool.clone())),
        Arc::new(DieselWaitlistRepository::new(pool.clone())),
        Arc::new(DieselAdmissionLedger::new(pool.clone())),
        Arc::new(DieselUserRepository::new(pool)),
    );
    reconcile(&engine, target).await
}

async fn reconcile(
    engine: &impl WaitlistPromotion,
    target: Option<EventId>,
) -> Result<Vec<ReconciliationReport>> {
    let reports = match target {
        Some(event_id) => vec![engine.reconcile(event_id).await?],
        None => engine.reconcile_all().await?,
    };
    let promoted: usize = reports.iter().map(|report| report.promoted.len()).sum();
    info!(events = reports.len(), promoted, "reconciliation finished");
    Ok(reports)
}

fn write_reports(out: &mut impl Write, reports: &[ReconciliationReport]) -> io::Result<()> {
    for report in reports {
        writeln!(out, "event_id={}", report.event_id)?;
        for promoted in &report.promoted {
            writeln!(out, "promoted_user={}", promoted.registration.user_id)?;
        }
        match &report.stopped_by {
            Some(failure) => writeln!(out, "stopped_by={failure}")?,
            None => writeln!(out, "stopped_by=none")?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use env_lock::lock_env;
    use eventbook::domain::{
        Capacity, EmailAddress, Event, EventDraft, PromotionFailure, User, UserId, UserRole,
    };
    use eventbook::outbound::memory::InMemoryBookingStore;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn missing_database_url_is_an_error() {
        let _guard = lock_env([("EVENTBOOK_DATABASE_URL", None::<String>)]);
        let settings = BookingSettings::load_from_iter([OsString::from("reconcile-waitlists")])
            .expect("config should load");

        let err = require_pool_config(&settings).expect_err("database is required");
        assert!(err.to_string().contains("EVENTBOOK_DATABASE_URL"));
    }

    #[rstest]
    fn report_lists_promotions_and_stop_reason() {
        let report = ReconciliationReport {
            stopped_by: Some(PromotionFailure::SlotTaken),
            ..ReconciliationReport::new(EventId::from_uuid(Uuid::nil()))
        };
        let mut out = Vec::new();

        write_reports(&mut out, &[report]).expect("write to buffer");

        let text = String::from_utf8(out).expect("utf-8 output");
        assert_eq!(
            text,
            concat!(
                "event_id=00000000-0000-0000-0000-000000000000\n",
                "stopped_by=the freed slot was taken before the oldest entry could use it\n",
            )
        );
    }

    #[rstest]
    #[tokio::test]
    async fn targeted_reconcile_promotes_into_free_slots() {
        let store = Arc::new(InMemoryBookingStore::default());
        let event_id = EventId::random();
        store.insert_event(Event::new(EventDraft {
            id: event_id,
            owner_id: UserId::random(),
            category: "talk".to_owned(),
            capacity: Capacity::limited(1),
            average_rating: 0.0,
        }));
        let user_id = UserId::random();
        let email = EmailAddress::new("waiting@example.test").expect("valid email");
        store.insert_user(User::new(user_id, email, UserRole::User));
        let _entry = store.force_waitlist_entry(event_id, user_id);
        let engine = PromotionEngine::new(store.clone(), store.clone(), store.clone(), store);

        let reports = reconcile(&engine, Some(event_id)).await.expect("reconciled");

        let promoted: Vec<UserId> = reports
            .iter()
            .flat_map(|report| report.promoted.iter())
            .map(|promoted| promoted.registration.user_id)
            .collect();
        assert_eq!(promoted, vec![user_id]);
    }
}
