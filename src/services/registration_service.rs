//! Registration and email verification.
//!
//! Registering creates (or refreshes) a pending user and replaces their
//! verification code in one transaction, then mails the plaintext code.
//! Verifying locks the code row, checks it, and either consumes it and
//! activates the user, counts the failure, or discards the record.
//!
//! Every verification failure reports the same
//! [`AppError::VerificationFailed`], whatever the cause, and costs the same
//! hash check.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::credentials::{AuthenticatedUser, CredentialIssuer};
use crate::config::VERIFICATION_EMAIL_SUBJECT;
use crate::domain::{
    normalize_email, AttemptOutcome, OtpCode, Password, User, VerificationCode,
    VerificationPolicy,
};
use crate::errors::{AppError, AppResult};
use crate::infra::{EmailMessage, Mailer, UnitOfWork};
use crate::with_transaction;

#[async_trait]
pub trait RegistrationService: Send + Sync {
    /// Create a pending account and send it a verification code.
    async fn register(&self, email: String, password: String) -> AppResult<User>;

    /// Redeem a verification code. On success the account is active and a
    /// credential is issued.
    async fn verify(&self, email: String, code: String) -> AppResult<AuthenticatedUser>;
}

pub struct Registrar<U: UnitOfWork> {
    uow: Arc<U>,
    mailer: Arc<dyn Mailer>,
    credentials: Arc<dyn CredentialIssuer>,
    policy: VerificationPolicy,
}

impl<U: UnitOfWork> Registrar<U> {
    pub fn new(
        uow: Arc<U>,
        mailer: Arc<dyn Mailer>,
        credentials: Arc<dyn CredentialIssuer>,
        policy: VerificationPolicy,
    ) -> Self {
        Self {
            uow,
            mailer,
            credentials,
            policy,
        }
    }

    /// Mail the code. Delivery problems are logged, never returned.
    async fn send_code(&self, user: &User, code: &OtpCode) {
        let message = EmailMessage::new(
            user.email.clone(),
            VERIFICATION_EMAIL_SUBJECT,
            verification_email_body(code, &self.policy),
        );

        if let Err(e) = self.mailer.send(message).await {
            tracing::error!(user_id = %user.id, error = %e, "Failed to send verification email");
        }
    }
}

pub(crate) fn verification_email_body(code: &OtpCode, policy: &VerificationPolicy) -> String {
    format!(
        "Your verification code is: {}\nExpires in {} minutes.",
        code.as_str(),
        policy.ttl_minutes()
    )
}

#[async_trait]
impl<U: UnitOfWork> RegistrationService for Registrar<U> {
    async fn register(&self, email: String, password: String) -> AppResult<User> {
        let email = normalize_email(&email);
        let password_hash = Password::new(&password)?.into_string();
        let code = OtpCode::generate();
        let code_hash = code.hash()?;

        let user = with_transaction!(self.uow, |ctx| {
            let users = ctx.users();

            // Locked so concurrent registrations of one email replace the
            // code one after the other
            let user = match users.find_by_email_for_update(&email).await? {
                Some(existing) if existing.is_active => return Err(AppError::duplicate_email()),
                Some(mut existing) => {
                    users
                        .update_password(existing.id, password_hash.clone())
                        .await?;
                    existing.password_hash = password_hash;
                    existing
                }
                None => users.create(email, password_hash, false).await?,
            };

            ctx.verification_codes()
                .replace(&VerificationCode::new(user.id, code_hash))
                .await?;

            Ok(user)
        })?;

        tracing::info!(user_id = %user.id, "Verification code issued");
        self.send_code(&user, &code).await;

        Ok(user)
    }

    async fn verify(&self, email: String, code: String) -> AppResult<AuthenticatedUser> {
        let email = normalize_email(&email);
        let policy = self.policy;
        let submitted = code.clone();

        let attempt = with_transaction!(self.uow, |ctx| {
            let Some(user) = ctx.users().find_pending_by_email(&email).await? else {
                return Ok(None);
            };

            let codes = ctx.verification_codes();
            let Some(record) = codes.find_by_user_for_update(user.id).await? else {
                return Ok(None);
            };

            let outcome = record.evaluate(&submitted, Utc::now(), &policy);
            match outcome {
                AttemptOutcome::Verified => {
                    ctx.users().activate(user.id).await?;
                    codes.delete_by_user(user.id).await?;
                }
                AttemptOutcome::Rejected { .. } => {
                    codes.record_failed_attempt(record.id).await?;
                }
                AttemptOutcome::Exhausted | AttemptOutcome::Expired => {
                    codes.delete_by_user(user.id).await?;
                }
            }

            Ok(Some((user, outcome)))
        })?;

        let Some((mut user, outcome)) = attempt else {
            // Same Argon2 cost as a real check, so timing does not reveal
            // which emails have a pending registration
            Password::dummy().verify(&code);
            tracing::info!("Verification failed: no pending registration or code");
            return Err(AppError::VerificationFailed);
        };

        match outcome {
            AttemptOutcome::Verified => {
                user.activate();
                tracing::info!(user_id = %user.id, "Email verified");
                let credential = self.credentials.issue(&user)?;
                Ok(AuthenticatedUser { user, credential })
            }
            AttemptOutcome::Rejected { attempts } => {
                tracing::info!(user_id = %user.id, attempts, "Wrong verification code");
                Err(AppError::VerificationFailed)
            }
            AttemptOutcome::Exhausted => {
                tracing::warn!(user_id = %user.id, "Verification attempts exhausted, code discarded");
                Err(AppError::VerificationFailed)
            }
            AttemptOutcome::Expired => {
                tracing::info!(user_id = %user.id, "Verification code expired, code discarded");
                Err(AppError::VerificationFailed)
            }
        }
    }
}
