//! JSON body extractor whose rejection uses the API error shape.
//!
//! `axum::Json` rejects bad bodies with plain-text responses and a mix of
//! 400/415/422 statuses. [`ApiJson`] turns every rejection into a 422
//! `{"detail": ...}` body instead.

use axum::extract::FromRequest;

use crate::http::error::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
