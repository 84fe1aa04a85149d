pub mod config;
pub mod universe;
