pub mod command;
pub mod format;
pub mod handler;
pub mod keyboard;
pub mod session;
pub mod telegram;
