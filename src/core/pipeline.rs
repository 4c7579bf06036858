use crate::core::download::Downloader;
use crate::domain::model::{Course, CourseRef, ScrapeDump, ScrapeResult};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::parse::assign::parse_assign_page;
use crate::parse::course::parse_course_page;
use crate::parse::dashboard::parse_dashboard_courses;
use crate::parse::files::{self, PLUGINFILE_MARKER};
use crate::utils::error::{Result, ScrapeError};
use chrono::Utc;
use reqwest::header;
use reqwest::Client;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);
const DUMP_FILENAME: &str = "moodle_dump.json";
const SESSION_COOKIE_NAME: &str = "MoodleSession";

pub struct MoodlePipeline<S, C> {
    storage: S,
    config: C,
    client: Client,
    downloader: Downloader<S>,
    base: Url,
}

impl<S: Storage + Clone + 'static, C: ConfigProvider> MoodlePipeline<S, C> {
    /// `storage` receives the JSON dump, `file_storage` the downloaded
    /// course files (rooted at the download directory).
    pub fn new(storage: S, file_storage: S, config: C) -> Result<Self> {
        let base = Url::parse(config.base_url())?;
        let client = build_client(&config)?;
        let downloader = Downloader::new(
            client.clone(),
            file_storage,
            config.download_root().trim_end_matches('/').to_string(),
            config.concurrent_requests(),
        );

        Ok(Self {
            storage,
            config,
            client,
            downloader,
            base,
        })
    }

    fn dashboard_url(&self) -> Result<Url> {
        Ok(self.base.join("my/")?)
    }

    /// GETs a page with the politeness delay; returns the final URL (after
    /// redirects) and the body.
    async fn fetch_page(&self, url: &str) -> Result<(String, String)> {
        let delay = self.config.request_delay_ms();
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        let final_url = response.url().to_string();
        let html = response.text().await?;
        Ok((final_url, html))
    }

    async fn scrape_course(&self, course_ref: &CourseRef) -> Result<(Course, usize)> {
        let (_, html) = self.fetch_page(&course_ref.url).await?;
        let mut course = parse_course_page(&html, &course_ref.url, &self.base);
        let course_title = course.title.clone();
        let mut downloaded_total = 0;

        for (sec_index, section) in course.sections.iter_mut().enumerate() {
            let sec_index = sec_index + 1;
            let section_name = section.name.clone();

            for (act_index, activity) in section.activities.iter_mut().enumerate() {
                let act_index = act_index + 1;

                let queued = match activity.kind.as_str() {
                    "assign" => {
                        tracing::info!("    [assign] fetching details → {}", activity.url);
                        match self.fetch_page(&activity.url).await {
                            Ok((_, page)) => {
                                let meta = parse_assign_page(&page, &self.base);
                                let files = meta.files.clone();
                                activity.meta = Some(meta);
                                files
                            }
                            Err(e) => {
                                tracing::warn!(
                                    "    [!] could not open assign {}: {}",
                                    activity.url,
                                    e
                                );
                                Vec::new()
                            }
                        }
                    }
                    "resource" | "folder" => {
                        let files = if activity.files.is_empty() {
                            self.collect_activity_files(&activity.url).await
                        } else {
                            tracing::info!(
                                "    [folder-inline] found {} files",
                                activity.files.len()
                            );
                            activity.files.clone()
                        };
                        activity.files = files.clone();
                        files
                    }
                    _ => Vec::new(),
                };

                if !queued.is_empty() && !self.config.skip_downloads() {
                    let saved = self
                        .downloader
                        .download_activity_files(
                            &queued,
                            &course_title,
                            sec_index,
                            &section_name,
                            act_index,
                            &activity.name,
                        )
                        .await;
                    downloaded_total += saved.len();
                    activity.downloaded_files = saved;
                }
            }
        }

        Ok((course, downloaded_total))
    }

    /// Visits a resource/folder page and collects its file URLs. Mirrors
    /// the precedence in `parse::files`, with two shortcuts: a direct
    /// `pluginfile.php` URL is returned as-is, and a page that yields
    /// nothing falls back to the activity URL itself.
    async fn collect_activity_files(&self, activity_url: &str) -> Vec<String> {
        if activity_url.is_empty() || activity_url == "#" || !activity_url.starts_with("http") {
            return Vec::new();
        }
        if activity_url.contains(PLUGINFILE_MARKER) {
            return vec![activity_url.to_string()];
        }

        tracing::info!("    [activity] opening page: {}", activity_url);
        match self.fetch_page(activity_url).await {
            Ok((_, html)) => {
                let urls = files::collect_activity_files(&html, &self.base);
                if urls.is_empty() {
                    vec![activity_url.to_string()]
                } else {
                    urls
                }
            }
            Err(e) => {
                tracing::warn!("    [!] failed to open activity {}: {}", activity_url, e);
                Vec::new()
            }
        }
    }
}

fn build_client<C: ConfigProvider>(config: &C) -> Result<Client> {
    let cookie = format!("{}={}", SESSION_COOKIE_NAME, config.session_cookie());
    let cookie = header::HeaderValue::from_str(&cookie).map_err(|_| {
        ScrapeError::InvalidConfigValueError {
            field: "session".to_string(),
            value: "<hidden>".to_string(),
            reason: "session cookie is not a valid header value".to_string(),
        }
    })?;

    let mut headers = header::HeaderMap::new();
    headers.insert(header::COOKIE, cookie);

    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(PAGE_TIMEOUT)
        .build()?)
}

#[async_trait::async_trait]
impl<S: Storage + Clone + 'static, C: ConfigProvider> Pipeline for MoodlePipeline<S, C> {
    async fn extract(&self) -> Result<Vec<CourseRef>> {
        let dashboard_url = self.dashboard_url()?;
        tracing::info!("🔐 Checking session against {}", dashboard_url);

        let (final_url, html) = self.fetch_page(dashboard_url.as_str()).await?;
        if final_url.contains("/login/") {
            return Err(ScrapeError::AuthError {
                reason: format!("dashboard redirected to {}", final_url),
            });
        }

        let courses = parse_dashboard_courses(&html, &self.base);
        if courses.is_empty() {
            tracing::warn!("[!] 'Мої курси' block not found or empty on the dashboard");
        }
        for course in &courses {
            tracing::info!("    - {} → {}", course.title, course.url);
        }
        Ok(courses)
    }

    async fn transform(&self, course_refs: Vec<CourseRef>) -> Result<ScrapeResult> {
        let mut dump = ScrapeDump {
            dashboard_url: self.dashboard_url()?.to_string(),
            scraped_at: Utc::now(),
            courses: Vec::new(),
        };
        let mut files_downloaded = 0;
        let mut courses_failed = 0;

        let total = course_refs.len();
        for (index, course_ref) in course_refs.iter().enumerate() {
            tracing::info!("📘 [{}/{}] Scraping course: {}", index + 1, total, course_ref.title);
            match self.scrape_course(course_ref).await {
                Ok((course, downloaded)) => {
                    files_downloaded += downloaded;
                    dump.courses.push(course);
                }
                Err(e) => {
                    courses_failed += 1;
                    tracing::warn!(
                        "[!] Failed to scrape course {} ({}): {}",
                        course_ref.title,
                        course_ref.url,
                        e
                    );
                }
            }
        }

        Ok(ScrapeResult {
            dump,
            files_downloaded,
            courses_failed,
        })
    }

    async fn load(&self, result: ScrapeResult) -> Result<String> {
        let json = serde_json::to_string_pretty(&result.dump)?;
        self.storage.write_file(DUMP_FILENAME, json.as_bytes()).await?;

        let output_path = format!(
            "{}/{}",
            self.config.output_path().trim_end_matches('/'),
            DUMP_FILENAME
        );
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                ScrapeError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn exists(&self, path: &str) -> bool {
            let files = self.files.lock().await;
            files.contains_key(path)
        }
    }

    struct MockConfig {
        base_url: String,
        skip_downloads: bool,
    }

    impl MockConfig {
        fn new(base_url: String) -> Self {
            Self {
                base_url,
                skip_downloads: false,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn base_url(&self) -> &str {
            &self.base_url
        }

        fn session_cookie(&self) -> &str {
            "testsession"
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn download_root(&self) -> &str {
            "downloads"
        }

        fn concurrent_requests(&self) -> usize {
            2
        }

        fn request_delay_ms(&self) -> u64 {
            0
        }

        fn skip_downloads(&self) -> bool {
            self.skip_downloads
        }
    }

    fn pipeline(
        server: &MockServer,
        storage: MockStorage,
    ) -> MoodlePipeline<MockStorage, MockConfig> {
        let config = MockConfig::new(server.base_url());
        MoodlePipeline::new(storage.clone(), storage, config).unwrap()
    }

    const DASHBOARD_HTML: &str = r#"
        <section>
            <h2>Мої курси</h2>
            <ul class="unlist">
                <li><a href="/course/view.php?id=101">Системне програмування</a></li>
            </ul>
        </section>
    "#;

    #[tokio::test]
    async fn test_extract_lists_courses_and_sends_session_cookie() {
        let server = MockServer::start();
        let dashboard_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/my/")
                .header("Cookie", "MoodleSession=testsession");
            then.status(200)
                .header("Content-Type", "text/html")
                .body(DASHBOARD_HTML);
        });

        let storage = MockStorage::default();
        let courses = pipeline(&server, storage).extract().await.unwrap();

        dashboard_mock.assert();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].title, "Системне програмування");
        assert_eq!(
            courses[0].url,
            format!("{}/course/view.php?id=101", server.base_url())
        );
    }

    #[tokio::test]
    async fn test_extract_detects_login_redirect() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/my/");
            then.status(302)
                .header("Location", server.url("/login/index.php?loginredirect=1"));
        });
        server.mock(|when, then| {
            when.method(GET).path("/login/index.php");
            then.status(200).body("<form id=\"login\"></form>");
        });

        let storage = MockStorage::default();
        let err = pipeline(&server, storage).extract().await.unwrap_err();

        assert!(matches!(err, ScrapeError::AuthError { .. }));
    }

    #[tokio::test]
    async fn test_extract_empty_dashboard_is_not_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/my/");
            then.status(200).body("<html><body><h2>Інше</h2></body></html>");
        });

        let storage = MockStorage::default();
        let courses = pipeline(&server, storage).extract().await.unwrap();
        assert!(courses.is_empty());
    }

    #[tokio::test]
    async fn test_transform_skips_broken_course_and_keeps_going() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/course/view.php").query_param("id", "1");
            then.status(500);
        });
        server.mock(|when, then| {
            when.method(GET).path("/course/view.php").query_param("id", "2");
            then.status(200)
                .body("<h1>Вцілілий курс</h1><ul><li class=\"section main\"><h3>Тема</h3></li></ul>");
        });

        let storage = MockStorage::default();
        let refs = vec![
            CourseRef {
                title: "Зламаний".to_string(),
                url: server.url("/course/view.php?id=1"),
            },
            CourseRef {
                title: "Вцілілий".to_string(),
                url: server.url("/course/view.php?id=2"),
            },
        ];

        let result = pipeline(&server, storage).transform(refs).await.unwrap();
        assert_eq!(result.courses_failed, 1);
        assert_eq!(result.dump.courses.len(), 1);
        assert_eq!(result.dump.courses[0].title, "Вцілілий курс");
    }

    #[tokio::test]
    async fn test_transform_parses_assign_and_downloads_attachment() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/course/view.php");
            then.status(200).body(
                r#"<h1>Курс</h1>
                   <ul><li class="section main"><h3 class="sectionname">Лабораторні</h3>
                   <ul><li class="activity modtype_assign">
                     <a href="/mod/assign/view.php?id=12"><span class="instancename">Лаб 1</span></a>
                   </li></ul></li></ul>"#,
            );
        });
        server.mock(|when, then| {
            when.method(GET).path("/mod/assign/view.php");
            then.status(200).body(
                r#"<table class="feedbacktable"><tr><th>Оцінка</th><td>9,00 / 10,00</td></tr></table>
                   <a href="/pluginfile.php/55/lab1.pdf">lab1.pdf</a>"#,
            );
        });
        server.mock(|when, then| {
            when.method(GET).path("/pluginfile.php/55/lab1.pdf");
            then.status(200).body("pdf");
        });

        let storage = MockStorage::default();
        let refs = vec![CourseRef {
            title: "Курс".to_string(),
            url: server.url("/course/view.php?id=101"),
        }];

        let result = pipeline(&server, storage.clone()).transform(refs).await.unwrap();

        assert_eq!(result.files_downloaded, 1);
        let activity = &result.dump.courses[0].sections[0].activities[0];
        let meta = activity.meta.as_ref().unwrap();
        assert_eq!(meta.grade_raw, Some(9.0));
        assert_eq!(meta.grade_max, Some(10.0));
        assert_eq!(
            activity.downloaded_files,
            vec!["downloads/Курс/01_Лабораторні/01_Лаб 1/lab1.pdf"]
        );
        assert!(storage
            .get_file("Курс/01_Лабораторні/01_Лаб 1/lab1.pdf")
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_transform_skip_downloads_flag() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/course/view.php");
            then.status(200).body(
                r#"<h1>Курс</h1>
                   <ul><li class="section main"><h3 class="sectionname">Тема</h3>
                   <ul><li class="activity modtype_resource">
                     <a href="/mod/resource/view.php?id=7"><span class="instancename">Лекція</span></a>
                   </li></ul></li></ul>"#,
            );
        });
        server.mock(|when, then| {
            when.method(GET).path("/mod/resource/view.php");
            then.status(200)
                .body(r#"<a href="/pluginfile.php/7/lecture.pdf">lecture.pdf</a>"#);
        });
        let file_mock = server.mock(|when, then| {
            when.method(GET).path("/pluginfile.php/7/lecture.pdf");
            then.status(200).body("pdf");
        });

        let storage = MockStorage::default();
        let mut config = MockConfig::new(server.base_url());
        config.skip_downloads = true;
        let pipeline = MoodlePipeline::new(storage.clone(), storage, config).unwrap();

        let refs = vec![CourseRef {
            title: "Курс".to_string(),
            url: server.url("/course/view.php?id=101"),
        }];
        let result = pipeline.transform(refs).await.unwrap();

        file_mock.assert_hits(0);
        assert_eq!(result.files_downloaded, 0);
        let activity = &result.dump.courses[0].sections[0].activities[0];
        assert_eq!(
            activity.files,
            vec![server.url("/pluginfile.php/7/lecture.pdf")]
        );
        assert!(activity.downloaded_files.is_empty());
    }

    #[tokio::test]
    async fn test_load_writes_pretty_json_dump() {
        let server = MockServer::start();
        let storage = MockStorage::default();
        let pipeline = pipeline(&server, storage.clone());

        let result = ScrapeResult {
            dump: ScrapeDump {
                dashboard_url: format!("{}/my/", server.base_url()),
                scraped_at: Utc::now(),
                courses: vec![],
            },
            files_downloaded: 0,
            courses_failed: 0,
        };

        let path = pipeline.load(result).await.unwrap();
        assert_eq!(path, "test_output/moodle_dump.json");

        let data = storage.get_file("moodle_dump.json").await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert!(json["dashboard_url"].as_str().unwrap().ends_with("/my/"));
        assert!(json["courses"].as_array().unwrap().is_empty());
    }
}
