//! Validated JSON extractor - Combines deserialization with validation.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::errors::{AppError, FieldErrors};

/// Validated JSON extractor that automatically validates requests.
///
/// Malformed bodies become [`AppError::Validation`]; rule violations become
/// [`AppError::InvalidFields`] keyed by field name.
///
/// # Example
///
/// ```rust,ignore
/// use serde::Deserialize;
/// use validator::Validate;
/// use otp_auth_service::api::extractors::ValidatedJson;
///
/// #[derive(Deserialize, Validate)]
/// struct VerifyRequest {
///     #[validate(email)]
///     email: String,
///     #[validate(length(equal = 6))]
///     code: String,
/// }
///
/// async fn verify(ValidatedJson(payload): ValidatedJson<VerifyRequest>) {
///     // payload is already validated
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::InvalidFields(field_errors(&e)))?;

        Ok(ValidatedJson(value))
    }
}

/// Collect validator output into per-field messages.
fn field_errors(errors: &validator::ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}
