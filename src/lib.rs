pub mod config;
pub mod logger;
pub mod output;
pub mod prompt;
pub mod scoring;
pub mod source;
pub mod standings;
