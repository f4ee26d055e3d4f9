//! Request body reading module

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use std::error::Error;

/// Why a body could not be read
#[derive(Debug, PartialEq, Eq)]
pub enum BodyError {
    /// Larger than `http.max_body_size`
    TooLarge,
    /// Transport failure while receiving
    Unreadable(String),
}

/// Collect a request body, refusing more than `limit` bytes
pub async fn read_body<B>(body: B, limit: u64) -> Result<Bytes, BodyError>
where
    B: Body,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(BodyError::TooLarge),
        Err(e) => Err(BodyError::Unreadable(e.to_string())),
    }
}
