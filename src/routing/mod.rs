//! Routing module
//!
//! Path templates with `:name` parameters, e.g. `/api/issues/:project`.

mod matcher;

pub use matcher::{PathParams, PathPattern};
