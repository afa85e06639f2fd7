//! Verification code repository - reads and maintenance.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use super::entities::verification_code::{self, Entity as VerificationCodeEntity};
use crate::domain::VerificationCode;
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait VerificationCodeRepository: Send + Sync {
    /// The code currently issued to `user_id`, if any.
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<VerificationCode>>;

    /// Delete every record created before `cutoff`. Returns the number removed.
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

pub struct VerificationCodeStore {
    db: DatabaseConnection,
}

impl VerificationCodeStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VerificationCodeRepository for VerificationCodeStore {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<VerificationCode>> {
        let model = VerificationCodeEntity::find()
            .filter(verification_code::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(model.map(VerificationCode::from))
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = VerificationCodeEntity::delete_many()
            .filter(verification_code::Column::CreatedAt.lt(cutoff))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
