use crate::domain::model::CourseRef;
use crate::parse::{absolutize, element_text};
use scraper::{ElementRef, Html, Selector};
use url::Url;

const MY_COURSES_HEADING: &str = "мої курси";

/// Extracts the "Мої курси" block from the dashboard HTML and returns the
/// course links found in it. A missing block yields an empty list; the
/// caller decides whether that is worth a warning.
pub fn parse_dashboard_courses(html: &str, base: &Url) -> Vec<CourseRef> {
    let doc = Html::parse_document(html);
    let heading_sel = Selector::parse("h2, h3").unwrap();
    let link_sel = Selector::parse("ul.unlist li a").unwrap();

    let section = doc
        .select(&heading_sel)
        .find(|h| element_text(h).to_lowercase().contains(MY_COURSES_HEADING))
        .and_then(|h| enclosing_section(&h));

    let Some(section) = section else {
        return Vec::new();
    };

    let mut courses = Vec::new();
    for a in section.select(&link_sel) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let Some(url) = absolutize(base, href) else {
            continue;
        };
        courses.push(CourseRef {
            title: element_text(&a),
            url,
        });
    }
    courses
}

fn enclosing_section<'a>(el: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "section")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DASHBOARD_HTML: &str = r#"
        <html><body>
        <section id="news"><h2>Новини</h2></section>
        <section id="courses">
            <h2>Мої курси</h2>
            <ul class="unlist">
                <li><a href="/course/view.php?id=101">Системне програмування</a></li>
                <li><a href="https://moodle.example.edu/course/view.php?id=102">Бази даних</a></li>
                <li><a>без посилання</a></li>
            </ul>
        </section>
        </body></html>
    "#;

    fn base() -> Url {
        Url::parse("https://moodle.example.edu").unwrap()
    }

    #[test]
    fn test_parses_course_links_from_my_courses_section() {
        let courses = parse_dashboard_courses(DASHBOARD_HTML, &base());

        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].title, "Системне програмування");
        assert_eq!(
            courses[0].url,
            "https://moodle.example.edu/course/view.php?id=101"
        );
        assert_eq!(courses[1].title, "Бази даних");
    }

    #[test]
    fn test_heading_match_is_case_insensitive() {
        let html = DASHBOARD_HTML.replace("Мої курси", "МОЇ КУРСИ");
        let courses = parse_dashboard_courses(&html, &base());
        assert_eq!(courses.len(), 2);
    }

    #[test]
    fn test_missing_heading_yields_empty_list() {
        let html = "<html><body><section><h2>Щось інше</h2></section></body></html>";
        assert!(parse_dashboard_courses(html, &base()).is_empty());
    }

    #[test]
    fn test_links_outside_section_are_ignored() {
        let html = r#"
            <section><h3>Мої курси</h3><ul class="unlist"></ul></section>
            <ul class="unlist"><li><a href="/course/view.php?id=9">Чужий</a></li></ul>
        "#;
        assert!(parse_dashboard_courses(html, &base()).is_empty());
    }
}
