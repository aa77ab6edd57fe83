pub mod auth;
pub mod prepare;
pub mod sync;

pub use auth::{refresh as auth_refresh, status as auth_status};
pub use prepare::run as prepare_run;
pub use sync::{all as sync_all, new as sync_new, status as sync_status};
