//! Contact service - stores messages left through the contact form.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::ContactSubmission;
use crate::errors::AppResult;
use crate::infra::UnitOfWork;

#[async_trait]
pub trait ContactService: Send + Sync {
    async fn submit(&self, submission: ContactSubmission) -> AppResult<ContactSubmission>;
}

/// Concrete implementation of ContactService using Unit of Work.
pub struct ContactDesk<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> ContactDesk<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> ContactService for ContactDesk<U> {
    async fn submit(&self, submission: ContactSubmission) -> AppResult<ContactSubmission> {
        let saved = self.uow.contacts().create(submission).await?;
        tracing::info!(submission_id = %saved.id, "Contact form submitted");
        Ok(saved)
    }
}
