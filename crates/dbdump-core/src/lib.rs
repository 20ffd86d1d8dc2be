pub mod config;
pub mod logging;

pub mod command;
pub mod discovery;
pub mod dump;
pub mod error;
pub mod jobs;
pub mod report;
pub mod retry;
pub mod scheduler;
pub mod session;
pub mod target;
