use crate::config::toml_config::ProfileConfig;
use crate::core::{ConfigProvider, Storage};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_required_field,
    validate_url, Validate,
};
use clap::Parser;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Parser)]
#[command(name = "moodle-grab")]
#[command(about = "Scrape courses, assignment metadata and attached files from a Moodle instance")]
pub struct CliConfig {
    #[arg(long, default_value = "https://moodle.elct.lnu.edu.ua")]
    pub base_url: String,

    /// Value of the MoodleSession cookie from a logged-in browser session.
    #[arg(long, env = "MOODLE_SESSION", hide_env_values = true)]
    pub session: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "moodle_downloads")]
    pub download_root: String,

    #[arg(long, default_value = "5")]
    pub concurrent_requests: usize,

    /// Delay between page fetches, to stay polite to the server.
    #[arg(long, default_value = "1000")]
    pub request_delay_ms: u64,

    /// Optional TOML profile; set fields override the flags.
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, help = "Collect metadata only, do not download files")]
    pub skip_downloads: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Enable system monitoring")]
    pub monitor: bool,
}

impl CliConfig {
    pub fn apply_profile(&mut self, profile: ProfileConfig) {
        if let Some(site) = profile.site {
            if let Some(base_url) = site.base_url {
                self.base_url = base_url;
            }
            if let Some(session) = site.session {
                self.session = Some(session);
            }
        }
        if let Some(scrape) = profile.scrape {
            if let Some(concurrent) = scrape.concurrent_requests {
                self.concurrent_requests = concurrent;
            }
            if let Some(delay) = scrape.request_delay_ms {
                self.request_delay_ms = delay;
            }
            if let Some(skip) = scrape.skip_downloads {
                self.skip_downloads = skip;
            }
        }
        if let Some(output) = profile.output {
            if let Some(path) = output.path {
                self.output_path = path;
            }
            if let Some(root) = output.download_root {
                self.download_root = root;
            }
        }
    }
}

impl ConfigProvider for CliConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn session_cookie(&self) -> &str {
        self.session.as_deref().unwrap_or("")
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn download_root(&self) -> &str {
        &self.download_root
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }

    fn request_delay_ms(&self) -> u64 {
        self.request_delay_ms
    }

    fn skip_downloads(&self) -> bool {
        self.skip_downloads
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("base_url", &self.base_url)?;
        let session = validate_required_field("session", &self.session)?;
        validate_non_empty_string("session", session)?;
        validate_path("output_path", &self.output_path)?;
        validate_path("download_root", &self.download_root)?;
        validate_positive_number("concurrent_requests", self.concurrent_requests, 1)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        Path::new(&self.base_path).join(path).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> CliConfig {
        CliConfig {
            base_url: "https://moodle.example.edu".to_string(),
            session: Some("abc123".to_string()),
            output_path: "./output".to_string(),
            download_root: "moodle_downloads".to_string(),
            concurrent_requests: 5,
            request_delay_ms: 1000,
            config: None,
            skip_downloads: false,
            verbose: false,
            monitor: false,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_session_fails() {
        let mut config = valid_config();
        config.session = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_base_url_fails() {
        let mut config = valid_config();
        config.base_url = "not-a-url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_concurrency_fails() {
        let mut config = valid_config();
        config.concurrent_requests = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_profile_overrides_flags() {
        let toml_content = r#"
[site]
base_url = "https://other.example.edu"

[scrape]
request_delay_ms = 250
skip_downloads = true

[output]
download_root = "archive"
"#;
        let profile = ProfileConfig::from_toml_str(toml_content).unwrap();
        let mut config = valid_config();
        config.apply_profile(profile);

        assert_eq!(config.base_url, "https://other.example.edu");
        assert_eq!(config.request_delay_ms, 250);
        assert!(config.skip_downloads);
        assert_eq!(config.download_root, "archive");
        // Untouched fields keep their CLI values.
        assert_eq!(config.session.as_deref(), Some("abc123"));
        assert_eq!(config.output_path, "./output");
    }
}
