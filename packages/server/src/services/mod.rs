pub mod backup;
pub mod lifecycle;
pub mod locks;
pub mod ownership;
pub mod quota;
