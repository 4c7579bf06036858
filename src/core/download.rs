//! File downloads into the on-disk course tree:
//! `<root>/<course>/<NN_section>/<NN_activity>/<file>`.

use crate::domain::ports::Storage;
use crate::utils::error::{Result, ScrapeError};
use crate::utils::fsname::{
    filename_from_content_disposition, filename_from_url, fix_mojibake, numbered_variant,
    safe_name,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

pub struct Downloader<S> {
    client: Client,
    storage: S,
    root_label: String,
    concurrency: usize,
}

impl<S: Storage + Clone + 'static> Downloader<S> {
    pub fn new(
        client: Client,
        storage: S,
        root_label: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            storage,
            root_label: root_label.into(),
            concurrency: concurrency.max(1),
        }
    }

    /// Downloads all `file_urls` for one activity. Failures are logged and
    /// skipped; the returned paths are the files that actually landed.
    #[allow(clippy::too_many_arguments)]
    pub async fn download_activity_files(
        &self,
        file_urls: &[String],
        course_title: &str,
        section_index: usize,
        section_name: &str,
        activity_index: usize,
        activity_name: &str,
    ) -> Vec<String> {
        if file_urls.is_empty() {
            return Vec::new();
        }

        let section_label = if section_name.trim().is_empty() {
            format!("Section {}", section_index)
        } else {
            section_name.to_string()
        };
        let activity_label = if activity_name.trim().is_empty() {
            format!("Activity {}", activity_index)
        } else {
            activity_name.to_string()
        };
        let dest_dir = format!(
            "{}/{:02}_{}/{:02}_{}",
            safe_name(course_title),
            section_index,
            safe_name(&section_label),
            activity_index,
            safe_name(&activity_label)
        );

        // Fetch concurrently, but resolve names and write sequentially so
        // collision suffixes stay deterministic.
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for (index, url) in file_urls.iter().cloned().enumerate() {
            let client = self.client.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = fetch_file(&client, &url).await;
                (index, url, outcome)
            });
        }

        let mut fetched = Vec::with_capacity(file_urls.len());
        while let Some(joined) = tasks.join_next().await {
            if let Ok(entry) = joined {
                fetched.push(entry);
            }
        }
        fetched.sort_by_key(|(index, ..)| *index);

        let mut saved = Vec::new();
        for (_, url, outcome) in fetched {
            match outcome {
                Ok((cd, bytes)) => {
                    let name = filename_from_content_disposition(cd.as_deref())
                        .unwrap_or_else(|| filename_from_url(&url));
                    let name = safe_name(&fix_mojibake(&name));
                    let path = self.unique_path(&dest_dir, &name).await;

                    match self.storage.write_file(&path, &bytes).await {
                        Ok(()) => saved.push(format!("{}/{}", self.root_label, path)),
                        Err(e) => tracing::warn!("            [!] failed to save {}: {}", url, e),
                    }
                }
                Err(e) => tracing::warn!("            [!] failed to download {}: {}", url, e),
            }
        }
        saved
    }

    async fn unique_path(&self, dir: &str, name: &str) -> String {
        let candidate = format!("{}/{}", dir, name);
        if !self.storage.exists(&candidate).await {
            return candidate;
        }
        let mut index = 2;
        loop {
            let variant = format!("{}/{}", dir, numbered_variant(name, index));
            if !self.storage.exists(&variant).await {
                return variant;
            }
            index += 1;
        }
    }
}

async fn fetch_file(client: &Client, url: &str) -> Result<(Option<String>, Vec<u8>)> {
    tracing::debug!("            ↳ downloading: {}", url);
    let response = client.get(url).timeout(DOWNLOAD_TIMEOUT).send().await?;
    let response = response
        .error_for_status()
        .map_err(|e| ScrapeError::DownloadError {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    // Not `to_str`: Moodle puts raw UTF-8 into this header.
    let content_disposition = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
    let bytes = response.bytes().await?.to_vec();
    Ok((content_disposition, bytes))
}
