//! Attachment (`pluginfile.php`) collection from resource and folder pages.

use crate::parse::absolutize;
use scraper::{ElementRef, Html, Selector};
use url::Url;

pub const PLUGINFILE_MARKER: &str = "pluginfile.php";

/// Collects file URLs from an activity page, in precedence order:
/// the `mod_folder` tree, then `pluginfile.php` references in links and
/// embedded media, then the first usable resource link. The caller supplies
/// the final fallback (the activity URL itself).
pub fn collect_activity_files(html: &str, base: &Url) -> Vec<String> {
    let doc = Html::parse_document(html);

    let tree_sel = Selector::parse(".foldertree").unwrap();
    if doc.select(&tree_sel).next().is_some() {
        let urls = parse_folder_tree(&doc, base);
        if !urls.is_empty() {
            return urls;
        }
    }

    let urls = collect_pluginfile_urls(&doc, base);
    if !urls.is_empty() {
        return urls;
    }

    fallback_resource_link(&doc, base).into_iter().collect()
}

/// Walks the `mod_folder` YUI tree (`foldertree` / `ygtvitem`) and returns
/// every `pluginfile.php` link, deduplicated, in document order.
pub fn parse_folder_tree(doc: &Html, base: &Url) -> Vec<String> {
    let tree_sel = Selector::parse(".foldertree").unwrap();
    let item_sel = Selector::parse(".ygtvitem").unwrap();

    let mut files = Vec::new();
    for tree in doc.select(&tree_sel) {
        // Roots are the direct ygtvitem children; some themes nest them one
        // level deeper, so fall back to any descendant.
        let roots: Vec<ElementRef> = tree
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().classes().any(|c| c == "ygtvitem"))
            .collect();

        if roots.is_empty() {
            for item in tree.select(&item_sel) {
                collect_tree_item(&item, base, &mut files);
            }
        } else {
            for root in &roots {
                collect_tree_item(root, base, &mut files);
            }
        }
    }
    files
}

fn collect_tree_item(node: &ElementRef, base: &Url, files: &mut Vec<String>) {
    let link_sel = Selector::parse(r#"a[href*="pluginfile.php"]"#).unwrap();
    let child_sel = Selector::parse(".ygtvchildren > .ygtvitem").unwrap();

    for a in node.select(&link_sel) {
        if let Some(url) = a.value().attr("href").and_then(|h| absolutize(base, h)) {
            if !files.contains(&url) {
                files.push(url);
            }
        }
    }

    for child in node.select(&child_sel) {
        collect_tree_item(&child, base, files);
    }
}

/// Scans `a[href]` plus `iframe`/`img`/`source`/`video`/`audio` `src`
/// attributes for `pluginfile.php` URLs.
pub fn collect_pluginfile_urls(doc: &Html, base: &Url) -> Vec<String> {
    let a_sel = Selector::parse("a[href]").unwrap();
    let media_sel =
        Selector::parse("iframe[src], img[src], source[src], video[src], audio[src]").unwrap();

    let mut urls = Vec::new();
    for el in doc.select(&a_sel) {
        add_if_pluginfile(el.value().attr("href"), base, &mut urls);
    }
    for el in doc.select(&media_sel) {
        add_if_pluginfile(el.value().attr("src"), base, &mut urls);
    }
    urls
}

fn add_if_pluginfile(raw: Option<&str>, base: &Url, urls: &mut Vec<String>) {
    let Some(raw) = raw else { return };
    let candidate = raw.trim();
    if candidate.is_empty()
        || candidate.starts_with('#')
        || candidate.to_lowercase().starts_with("javascript:")
    {
        return;
    }
    let Some(url) = absolutize(base, candidate) else {
        return;
    };
    if url.contains(PLUGINFILE_MARKER) && !urls.contains(&url) {
        urls.push(url);
    }
}

fn fallback_resource_link(doc: &Html, base: &Url) -> Option<String> {
    let candidate_sel =
        Selector::parse(".resourceworkaround a, .activityinstance a, .region-main a").unwrap();

    for a in doc.select(&candidate_sel) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.to_lowercase().starts_with("javascript:")
        {
            continue;
        }
        return absolutize(base, href);
    }
    None
}
