mod common;

mod account;
mod backups;
mod works;
