use crate::domain::model::{CourseRef, ScrapeResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn session_cookie(&self) -> &str;
    fn output_path(&self) -> &str;
    fn download_root(&self) -> &str;
    fn concurrent_requests(&self) -> usize;
    fn request_delay_ms(&self) -> u64;
    fn skip_downloads(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Checks the session and lists the enrolled courses from the dashboard.
    async fn extract(&self) -> Result<Vec<CourseRef>>;
    /// Walks every course, parses sections/activities and downloads files.
    async fn transform(&self, courses: Vec<CourseRef>) -> Result<ScrapeResult>;
    /// Writes the JSON dump and returns its path.
    async fn load(&self, result: ScrapeResult) -> Result<String>;
}
