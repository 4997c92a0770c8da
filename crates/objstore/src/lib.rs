//! Object storage used by the pipeline: bucket listing, downloads, uploads.

mod error;
mod storage;
mod mirror;

pub use error::*;
pub use storage::*;
pub use mirror::*;
