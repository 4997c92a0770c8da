pub mod layout;
pub mod annotation;
pub mod schema;
pub mod log;
pub mod validator;
pub mod report;

pub use layout::*;
pub use annotation::*;
pub use schema::*;
pub use log::*;
pub use validator::*;
pub use report::*;
