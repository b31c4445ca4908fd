//! Request extractors whose rejections use the crate's error envelope.

use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::Json;

use crate::error::AppError;

/// JSON procedure input. Malformed bodies never reach the handler.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct RpcInput<T>(pub T);

/// Query-string input with the same rejection shape as [`RpcInput`].
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ValidQuery<T>(pub T);
