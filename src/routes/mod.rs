pub mod auth;
mod health_check;
mod user;

pub use auth::{login, logout, refresh, register, REFRESH_COOKIE};
pub use health_check::health_check;
pub use user::{delete_me, me, update_me};
