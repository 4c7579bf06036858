use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry under the dashboard's "Мої курси" block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRef {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    pub url: String,
    pub sections: Vec<Section>,
    pub webinars: Vec<Webinar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    /// The `modtype_*` class suffix: `assign`, `resource`, `folder`,
    /// `bigbluebuttonbn`, `googlemeet`, ... Empty when the class is absent.
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<AssignMeta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub downloaded_files: Vec<String>,
}

/// Metadata scraped from a `mod/assign` page. Date and status fields keep
/// the raw page text; only the grade is parsed into numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignMeta {
    pub start_at: Option<String>,
    pub due_at: Option<String>,
    pub cutoff_at: Option<String>,
    pub attempt: Option<String>,
    pub submission_status: Option<String>,
    pub grading_status: Option<String>,
    pub time_remaining: Option<String>,
    pub last_modified: Option<String>,
    pub files: Vec<String>,
    pub grade_text: Option<String>,
    pub grade_raw: Option<f64>,
    pub grade_max: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebinarPlatform {
    Bigbluebutton,
    GoogleMeet,
}

impl WebinarPlatform {
    /// Maps a `modtype_*` suffix to a webinar platform, if it is one.
    pub fn from_activity_kind(kind: &str) -> Option<Self> {
        match kind {
            "bigbluebuttonbn" => Some(Self::Bigbluebutton),
            "googlemeet" => Some(Self::GoogleMeet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webinar {
    pub name: String,
    pub platform: WebinarPlatform,
    pub moodle_url: String,
    pub section_name: String,
    pub section_index: usize,
}

/// The complete result of one run, serialized to `moodle_dump.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeDump {
    pub dashboard_url: String,
    pub scraped_at: DateTime<Utc>,
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone)]
pub struct ScrapeResult {
    pub dump: ScrapeDump,
    pub files_downloaded: usize,
    pub courses_failed: usize,
}
