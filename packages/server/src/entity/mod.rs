pub mod user;
pub mod work;
