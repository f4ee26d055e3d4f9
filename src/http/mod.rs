//! HTTP protocol layer module
//!
//! Response builders and request body reading, decoupled from the issue API.

pub mod body;
pub mod response;

// Re-export commonly used types
pub use body::{read_body, BodyError};
pub use response::{
    build_404_response, build_405_response, build_413_response, build_options_response,
    json_response,
};
