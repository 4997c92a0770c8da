pub mod schema;
pub mod manifest;
pub mod store;

pub use schema::*;
pub use manifest::*;
pub use store::*;
