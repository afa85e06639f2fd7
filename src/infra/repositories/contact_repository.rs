//! Contact submission repository.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use super::entities::contact_submission::ActiveModel;
use crate::domain::ContactSubmission;
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(&self, submission: ContactSubmission) -> AppResult<ContactSubmission>;
}

pub struct ContactStore {
    db: DatabaseConnection,
}

impl ContactStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContactRepository for ContactStore {
    async fn create(&self, submission: ContactSubmission) -> AppResult<ContactSubmission> {
        let model = ActiveModel {
            id: Set(submission.id),
            name: Set(submission.name),
            email: Set(submission.email),
            subject: Set(submission.subject),
            message: Set(submission.message),
            created_at: Set(submission.created_at),
        }
        .insert(&self.db)
        .await?;

        Ok(ContactSubmission::from(model))
    }
}
