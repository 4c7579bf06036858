//! Course page parsing: sections, activities and webinar links.

use crate::domain::model::{Activity, Course, Section, Webinar, WebinarPlatform};
use crate::parse::files::parse_folder_tree;
use crate::parse::{absolutize, element_text};
use scraper::{ElementRef, Html, Selector};
use url::Url;

const WEBINARS_SECTION: &str = "вебінари";

/// Parses a course page into sections with activities. Folder activities
/// whose file tree is rendered inline get their files resolved here; other
/// activity kinds are left for the pipeline to visit.
pub fn parse_course_page(html: &str, url: &str, base: &Url) -> Course {
    let doc = Html::parse_document(html);

    let h1_sel = Selector::parse("h1").unwrap();
    let title = doc
        .select(&h1_sel)
        .next()
        .map(|h| element_text(&h))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| url.to_string());

    let mut course = Course {
        title,
        url: url.to_string(),
        sections: Vec::new(),
        webinars: Vec::new(),
    };

    let main_sel = Selector::parse("li.section.main").unwrap();
    let any_sel = Selector::parse("li.section").unwrap();
    let sections: Vec<ElementRef> = {
        let main: Vec<ElementRef> = doc.select(&main_sel).collect();
        if main.is_empty() {
            doc.select(&any_sel).collect()
        } else {
            main
        }
    };

    for (sec_index, sec) in sections.iter().enumerate() {
        let sec_index = sec_index + 1;
        let section_name = section_name(sec);
        let data_name = sec
            .value()
            .attr("data-sectionname")
            .unwrap_or("")
            .trim()
            .to_string();
        let is_webinars_section = section_name.to_lowercase() == WEBINARS_SECTION
            || data_name.to_lowercase() == WEBINARS_SECTION;

        let mut section = Section {
            name: section_name.clone(),
            activities: Vec::new(),
        };

        for act in activity_elements(sec) {
            let Some(activity) = parse_activity(&act, base) else {
                continue;
            };

            if is_webinars_section {
                if let Some(platform) = WebinarPlatform::from_activity_kind(&activity.kind) {
                    course.webinars.push(Webinar {
                        name: activity.name.clone(),
                        platform,
                        moodle_url: activity.url.clone(),
                        section_name: section_name.clone(),
                        section_index: sec_index,
                    });
                }
            }

            section.activities.push(activity);
        }

        if !section.name.is_empty() || !section.activities.is_empty() {
            course.sections.push(section);
        }
    }

    course
}

fn section_name(sec: &ElementRef) -> String {
    let name_sel = Selector::parse(".sectionname, h3.sectionname, h3").unwrap();
    sec.select(&name_sel)
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_default()
}

fn activity_elements<'a>(sec: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let act_sel = Selector::parse(r#"li.activity, li[class*="modtype_"]"#).unwrap();
    sec.select(&act_sel).collect()
}

fn parse_activity(act: &ElementRef, base: &Url) -> Option<Activity> {
    let link_sel = Selector::parse("a").unwrap();
    let link = act.select(&link_sel).next()?;

    let url = link
        .value()
        .attr("href")
        .and_then(|h| absolutize(base, h))
        .unwrap_or_default();

    let name = activity_name(act, &link);
    let kind = act
        .value()
        .classes()
        .find_map(|c| c.strip_prefix("modtype_"))
        .unwrap_or("")
        .to_string();

    // mod_folder sometimes renders its file tree inline in the course page;
    // grab those links right away so the folder page need not be visited.
    let files = if kind == "folder" {
        let fragment = Html::parse_fragment(&act.html());
        parse_folder_tree(&fragment, base)
    } else {
        Vec::new()
    };

    Some(Activity {
        name,
        kind,
        url,
        meta: None,
        files,
        downloaded_files: Vec::new(),
    })
}

/// Activity name precedence: `.instancename` text, then the
/// `data-activityname` attribute on `.activity-item`, then the link text.
fn activity_name(act: &ElementRef, link: &ElementRef) -> String {
    let instance_sel = Selector::parse(".instancename").unwrap();
    if let Some(el) = act.select(&instance_sel).next() {
        return element_text(&el);
    }

    let item_sel = Selector::parse(".activity-item").unwrap();
    if let Some(name) = act
        .select(&item_sel)
        .next()
        .and_then(|el| el.value().attr("data-activityname"))
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        return name.to_string();
    }

    element_text(link)
}
