//! Page-specific HTML parsers.
//!
//! Each submodule reads one kind of Moodle page and nothing else: where the
//! data lives in the markup and how to extract it tolerantly. All functions
//! are pure (HTML in, model out) so they can be tested offline against
//! captured fixtures; fetching and downloading live in `core`.

pub mod assign;
pub mod course;
pub mod dashboard;
pub mod files;

use scraper::ElementRef;
use url::Url;

/// Joined, whitespace-normalized text content of an element.
pub(crate) fn element_text(el: &ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves a possibly relative href against the instance base URL.
pub(crate) fn absolutize(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        Some(href.to_string())
    } else {
        base.join(href).ok().map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn test_element_text_normalizes_whitespace() {
        let html = Html::parse_fragment("<p>  Мої \n  курси \u{a0} </p>");
        let sel = Selector::parse("p").unwrap();
        let p = html.select(&sel).next().unwrap();
        assert_eq!(element_text(&p), "Мої курси");
    }

    #[test]
    fn test_absolutize() {
        let base = Url::parse("https://moodle.example.edu").unwrap();
        assert_eq!(
            absolutize(&base, "/course/view.php?id=1").as_deref(),
            Some("https://moodle.example.edu/course/view.php?id=1")
        );
        assert_eq!(
            absolutize(&base, "https://other.example.edu/x").as_deref(),
            Some("https://other.example.edu/x")
        );
        assert_eq!(absolutize(&base, ""), None);
    }
}
