pub mod batch;
pub mod config;
pub mod content;
pub mod error;
pub mod locate;
pub mod logging;
pub mod output;
pub mod scoring;
