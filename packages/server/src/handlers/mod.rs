pub mod account;
pub mod auth;
pub mod backup;
pub mod work;
