pub mod download;
pub mod engine;
pub mod pipeline;

pub use crate::domain::model::{
    Activity, AssignMeta, Course, CourseRef, ScrapeDump, ScrapeResult, Section, Webinar,
    WebinarPlatform,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
