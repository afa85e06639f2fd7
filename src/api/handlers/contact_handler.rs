//! Contact form handler.

use axum::{extract::State, routing::post, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::ContactSubmission;
use crate::errors::AppResult;
use crate::types::{Created, MessageResponse};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ContactRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name is required (max 100 characters)"
    ), custom(function = "not_blank"))]
    #[schema(example = "Ada Lovelace", max_length = 100)]
    pub name: String,
    #[validate(email(message = "Enter a valid email address."))]
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Subject is required (max 100 characters)"
    ), custom(function = "not_blank"))]
    #[schema(example = "Partnership", max_length = 100)]
    pub subject: String,
    #[validate(
        length(min = 1, message = "Message is required"),
        custom(function = "not_blank")
    )]
    #[schema(example = "Hello there")]
    pub message: String,
}

/// Fields are stored trimmed, so whitespace alone counts as empty.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank").with_message("This field may not be blank.".into()))
    } else {
        Ok(())
    }
}

pub fn contact_routes() -> Router<AppState> {
    Router::new().route("/contact", post(submit_contact))
}

/// Leave a message through the contact form
#[utoipa::path(
    post,
    path = "/contact",
    tag = "Contact",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Message stored", body = MessageResponse),
        (status = 400, description = "Validation error")
    )
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ContactRequest>,
) -> AppResult<Created<MessageResponse>> {
    let submission = ContactSubmission::new(
        &payload.name,
        &payload.email,
        &payload.subject,
        &payload.message,
    );
    state.contact_service.submit(submission).await?;

    Ok(Created(MessageResponse::new(
        "Your Message Has Been Sent Successfully!",
    )))
}
