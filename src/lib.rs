pub mod config;
pub mod core;
pub mod domain;
pub mod parse;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};
pub use config::ProfileConfig;

pub use core::{engine::ScrapeEngine, pipeline::MoodlePipeline};
pub use domain::model::{Course, CourseRef, ScrapeDump};
pub use utils::error::{Result, ScrapeError};
