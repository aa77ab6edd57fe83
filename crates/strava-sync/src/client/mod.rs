pub mod api;
pub mod tokens;

pub use api::{StravaClient, PAGE_SIZE};
pub use tokens::{Credentials, TokenProvider};
