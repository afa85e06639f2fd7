//! Unit of Work pattern implementation.
//!
//! Gives services one place to reach every repository, and a closure-based
//! transaction API whose repositories all share the same database
//! transaction. Registration (user + code) and verification (lock, check,
//! count or consume) each run as one unit.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    AccessMode, ActiveModelTrait, ColumnTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, IsolationLevel, QueryFilter, QuerySelect, Set,
    SqlErr, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use super::repositories::entities::{user, verification_code};
use super::repositories::{
    ContactRepository, ContactStore, UserRepository, UserStore, VerificationCodeRepository,
    VerificationCodeStore,
};
use crate::domain::{User, VerificationCode};
use crate::errors::{AppError, AppResult};

/// Unit of Work trait for dependency injection.
///
/// Provides centralized access to all repositories and transaction management.
/// Note: This trait is not mockable directly due to generic methods.
/// For testing, mock the repositories it hands out or use integration tests.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn verification_codes(&self) -> Arc<dyn VerificationCodeRepository>;

    fn contacts(&self) -> Arc<dyn ContactRepository>;

    /// Execute a closure within a transaction.
    ///
    /// Committed when the closure returns `Ok`, rolled back on `Err`.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send;
}

/// Transaction context providing repository access within a transaction.
///
/// Borrows the transaction, so repositories cannot outlive it.
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionContext<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    pub fn users(&self) -> TxUserRepository<'_> {
        TxUserRepository::new(self.txn)
    }

    pub fn verification_codes(&self) -> TxVerificationCodeRepository<'_> {
        TxVerificationCodeRepository::new(self.txn)
    }
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    user_repo: Arc<UserStore>,
    code_repo: Arc<VerificationCodeStore>,
    contact_repo: Arc<ContactStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            user_repo: Arc::new(UserStore::new(db.clone())),
            code_repo: Arc::new(VerificationCodeStore::new(db.clone())),
            contact_repo: Arc::new(ContactStore::new(db.clone())),
            db,
        }
    }

    async fn execute_transaction<F, T>(&self, isolation: IsolationLevel, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        let txn = self
            .db
            .begin_with_config(Some(isolation), Some(AccessMode::ReadWrite))
            .await?;

        let ctx = TransactionContext::new(&txn);

        match f(ctx).await {
            Ok(result) => {
                txn.commit().await?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn verification_codes(&self) -> Arc<dyn VerificationCodeRepository> {
        self.code_repo.clone()
    }

    fn contacts(&self) -> Arc<dyn ContactRepository> {
        self.contact_repo.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        self.execute_transaction(IsolationLevel::ReadCommitted, f).await
    }
}

/// Transaction-aware user repository.
pub struct TxUserRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxUserRepository<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.txn)
            .await?;
        Ok(model.map(User::from))
    }

    /// Load the user with a row lock held until the transaction ends.
    /// Concurrent writers for the same email queue up behind it.
    pub async fn find_by_email_for_update(&self, email: &str) -> AppResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .lock_exclusive()
            .one(self.txn)
            .await?;
        Ok(model.map(User::from))
    }

    /// Only matches users that have not been verified yet.
    pub async fn find_pending_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::IsActive.eq(false))
            .one(self.txn)
            .await?;
        Ok(model.map(User::from))
    }

    /// Insert a user. A unique-key collision on email surfaces as the
    /// duplicate email field error.
    pub async fn create(
        &self,
        email: String,
        password_hash: String,
        is_active: bool,
    ) -> AppResult<User> {
        let now = Utc::now();
        let active_model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(password_hash),
            is_active: Set(is_active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match active_model.insert(self.txn).await {
            Ok(model) => Ok(User::from(model)),
            Err(e) if is_unique_violation(&e) => Err(AppError::duplicate_email()),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert unless the email is already taken, then return whichever row
    /// now owns the email, locked. A concurrent insert of the same email is
    /// waited out instead of failing.
    pub async fn create_if_absent(
        &self,
        email: String,
        password_hash: String,
        is_active: bool,
    ) -> AppResult<User> {
        let now = Utc::now();
        let active_model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.clone()),
            password_hash: Set(password_hash),
            is_active: Set(is_active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user::Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(user::Column::Email)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.txn)
            .await?;

        self.find_by_email_for_update(&email)
            .await?
            .ok_or_else(|| AppError::internal("User row missing after insert"))
    }

    pub async fn update_password(&self, id: Uuid, password_hash: String) -> AppResult<()> {
        user::Entity::update_many()
            .col_expr(user::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec(self.txn)
            .await?;
        Ok(())
    }

    pub async fn activate(&self, id: Uuid) -> AppResult<()> {
        user::Entity::update_many()
            .col_expr(user::Column::IsActive, Expr::value(true))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec(self.txn)
            .await?;
        Ok(())
    }
}

/// Transaction-aware verification code repository.
pub struct TxVerificationCodeRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxVerificationCodeRepository<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Load the user's code with a row lock held until the transaction ends.
    pub async fn find_by_user_for_update(
        &self,
        user_id: Uuid,
    ) -> AppResult<Option<VerificationCode>> {
        let model = verification_code::Entity::find()
            .filter(verification_code::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(self.txn)
            .await?;
        Ok(model.map(VerificationCode::from))
    }

    /// Drop whatever code the user had and store `code` in its place.
    pub async fn replace(&self, code: &VerificationCode) -> AppResult<()> {
        self.delete_by_user(code.user_id).await?;

        verification_code::ActiveModel {
            id: Set(code.id),
            user_id: Set(code.user_id),
            code_hash: Set(code.code_hash.clone()),
            attempts: Set(i32::try_from(code.attempts).unwrap_or(i32::MAX)),
            created_at: Set(code.created_at),
        }
        .insert(self.txn)
        .await?;

        Ok(())
    }

    /// `attempts = attempts + 1`, evaluated by the database.
    pub async fn record_failed_attempt(&self, id: Uuid) -> AppResult<()> {
        verification_code::Entity::update_many()
            .col_expr(
                verification_code::Column::Attempts,
                Expr::col(verification_code::Column::Attempts).add(1),
            )
            .filter(verification_code::Column::Id.eq(id))
            .exec(self.txn)
            .await?;
        Ok(())
    }

    pub async fn delete_by_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = verification_code::Entity::delete_many()
            .filter(verification_code::Column::UserId.eq(user_id))
            .exec(self.txn)
            .await?;
        Ok(result.rows_affected)
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Simpler API for executing transactional operations.
///
/// Values used in the body are moved into the transaction future, so clone
/// anything borrowed before invoking it.
#[macro_export]
macro_rules! with_transaction {
    ($uow:expr, |$ctx:ident| $body:expr) => {
        $uow.transaction(|$ctx| Box::pin(async move { $body })).await
    };
}
