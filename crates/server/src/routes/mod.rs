pub mod auth;
pub mod health;
pub mod recordings;
pub mod session;
