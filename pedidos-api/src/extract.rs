use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// `Json` that reports malformed or incomplete bodies as `AppError`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Path` that reports unparseable segments as `AppError`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
