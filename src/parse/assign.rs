//! Parsing of `mod/assign` pages: dates, submission status, attachments
//! and the grade. Labels exist in Ukrainian and English variants depending
//! on the course language.

use crate::domain::model::AssignMeta;
use crate::parse::{absolutize, element_text};
use scraper::{ElementRef, Html, Selector};
use url::Url;

pub fn parse_assign_page(html: &str, base: &Url) -> AssignMeta {
    let doc = Html::parse_document(html);
    let mut meta = AssignMeta::default();

    parse_activity_dates(&doc, &mut meta);
    parse_date_rows(&doc, &mut meta);
    parse_submission_table(&doc, &mut meta);
    parse_attachments(&doc, base, &mut meta);
    parse_grade(&doc, &mut meta);

    meta
}

/// The activity header block: `<div class="activity-dates">` with one div
/// per date, each carrying a `<strong>` label.
fn parse_activity_dates(doc: &Html, meta: &mut AssignMeta) {
    let block_sel = Selector::parse(".activity-dates").unwrap();
    let strong_sel = Selector::parse("strong").unwrap();

    let Some(block) = doc.select(&block_sel).next() else {
        return;
    };

    for div in block
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "div")
    {
        let Some(strong) = div.select(&strong_sel).next() else {
            continue;
        };
        let label_raw = element_text(&strong);
        let label = label_raw.to_lowercase();
        let full_text = element_text(&div);
        let date_text = full_text
            .replacen(&label_raw, "", 1)
            .trim_matches([' ', ':'])
            .to_string();

        if date_text.is_empty() {
            continue;
        }

        if label.contains("початок приймання") && meta.start_at.is_none() {
            meta.start_at = Some(date_text);
        } else if label.contains("термін спливає") && meta.due_at.is_none() {
            meta.due_at = Some(date_text);
        }
    }
}

/// `.dates` divs and submission-table rows, matched on label substrings.
/// These keep the whole row text and never overwrite a slot set earlier.
fn parse_date_rows(doc: &Html, meta: &mut AssignMeta) {
    let dates_sel = Selector::parse(".dates div").unwrap();
    let row_sel = Selector::parse(".submissionstatustable tr").unwrap();

    let rows = doc.select(&dates_sel).chain(doc.select(&row_sel));
    for row in rows {
        let text_raw = element_text(&row);
        let text = text_raw.to_lowercase();

        if (text.contains("доступно з")
            || text.contains("доступне з")
            || text.contains("available from"))
            && meta.start_at.is_none()
        {
            meta.start_at = Some(text_raw.clone());
        }
        if (text.contains("термін здачі") || text.contains("due date")) && meta.due_at.is_none()
        {
            meta.due_at = Some(text_raw.clone());
        }
        if (text.contains("остання можливість здачі") || text.contains("cut-off"))
            && meta.cutoff_at.is_none()
        {
            meta.cutoff_at = Some(text_raw.clone());
        }
    }
}

fn parse_submission_table(doc: &Html, meta: &mut AssignMeta) {
    let row_sel = Selector::parse(".submissionstatustable tr").unwrap();
    let th_sel = Selector::parse("th").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    for row in doc.select(&row_sel) {
        let (Some(th), Some(td)) = (row.select(&th_sel).next(), row.select(&td_sel).next()) else {
            continue;
        };
        let label = element_text(&th).to_lowercase();
        let value = element_text(&td);

        if label.contains("спроба номер") {
            meta.attempt = Some(value);
        } else if label.contains("статус роботи") {
            meta.submission_status = Some(value);
        } else if label.contains("статус оцінення") {
            meta.grading_status = Some(value);
        } else if label.contains("залишилося часу") {
            meta.time_remaining = Some(value);
        } else if label.contains("востаннє змінено") {
            meta.last_modified = Some(value);
        }
    }
}

/// Attachment URLs. Deliberately restricted to `pluginfile.php` anchors so
/// comment-area links (`mod/assign/view.php?...comment_area=...`) are never
/// picked up.
fn parse_attachments(doc: &Html, base: &Url, meta: &mut AssignMeta) {
    let link_sel = Selector::parse(r#"a[href*="pluginfile.php"]"#).unwrap();

    for a in doc.select(&link_sel) {
        if let Some(url) = a.value().attr("href").and_then(|h| absolutize(base, h)) {
            if !meta.files.contains(&url) {
                meta.files.push(url);
            }
        }
    }
}

/// The feedback table row labelled "Оцінка", e.g. "7,00 / 10,00".
fn parse_grade(doc: &Html, meta: &mut AssignMeta) {
    let row_sel = Selector::parse(".feedbacktable tr").unwrap();
    let th_sel = Selector::parse("th").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    for row in doc.select(&row_sel) {
        let (Some(th), Some(td)) = (row.select(&th_sel).next(), row.select(&td_sel).next()) else {
            continue;
        };
        if !element_text(&th).to_lowercase().contains("оцінка") {
            continue;
        }

        let grade_text = element_text(&td);
        let parts: Vec<&str> = grade_text.split('/').collect();
        if parts.len() == 2 {
            meta.grade_raw = normalize_number(parts[0]);
            meta.grade_max = normalize_number(parts[1]);
        }
        meta.grade_text = Some(grade_text);
        break;
    }
}

/// Turns '7,00' into 7.0 and '10.5' into 10.5; `None` when unparseable.
pub fn normalize_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .replace('\u{a0}', " ")
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned.parse().ok()
}
