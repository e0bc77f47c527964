pub mod accounts;
pub mod pool;
pub mod recordings;
