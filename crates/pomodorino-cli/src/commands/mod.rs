pub mod config;
pub mod notify;
pub mod timer;

mod common;
