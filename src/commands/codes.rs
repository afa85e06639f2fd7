//! Codes command - verification code maintenance.
//!
//! Expired codes are normally discarded when someone tries to redeem them.
//! `purge` clears the ones nobody came back for.

use chrono::Utc;

use crate::cli::args::{CodesAction, CodesArgs};
use crate::config::Config;
use crate::domain::VerificationPolicy;
use crate::errors::{AppError, AppResult};
use crate::infra::{Database, Persistence, UnitOfWork};

pub async fn execute(args: CodesArgs, config: Config) -> AppResult<()> {
    let db = Database::connect_without_migrations(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;

    match args.action {
        CodesAction::Purge => {
            let policy = VerificationPolicy::from_config(&config);
            let uow = Persistence::new(db.get_connection());
            let removed = purge_expired_codes(&uow, &policy).await?;
            println!("Removed {} expired verification code(s)", removed);
        }
    }

    Ok(())
}

/// Delete every code whose lifetime under `policy` has run out.
pub async fn purge_expired_codes<U: UnitOfWork>(
    uow: &U,
    policy: &VerificationPolicy,
) -> AppResult<u64> {
    let cutoff = Utc::now() - policy.ttl;
    let removed = uow.verification_codes().purge_expired(cutoff).await?;
    tracing::info!(removed, %cutoff, "Purged expired verification codes");
    Ok(removed)
}
