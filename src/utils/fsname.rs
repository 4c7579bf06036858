//! Filename and directory-name helpers for the download tree.
//!
//! Moodle serves attachments with names coming from three places: the URL
//! path, the `Content-Disposition` header, and (for directories) course /
//! section / activity titles typed by teachers. All of them need sanitation
//! before they can be used on a filesystem.

use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

const MAX_NAME_LEN: usize = 80;

/// Normalizes an arbitrary title into a usable file or directory name:
/// strips forbidden characters, collapses whitespace and truncates very
/// long strings.
pub fn safe_name(name: &str) -> String {
    let mut out = name.trim().replace('\u{a0}', " ");
    out = out.replace(['\\', '/'], "-");
    out.retain(|c| !matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|'));

    let collapsed: String = out.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut result = collapsed;
    if result.is_empty() {
        result = "untitled".to_string();
    }
    if result.chars().count() > MAX_NAME_LEN {
        result = result.chars().take(MAX_NAME_LEN).collect();
        result = result.trim_end().to_string();
    }
    result
}

/// Takes the last path segment of a URL as a default filename.
pub fn filename_from_url(file_url: &str) -> String {
    let name = Url::parse(file_url)
        .ok()
        .and_then(|url| {
            url.path_segments().and_then(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .last()
                    .map(|s| percent_decode_lossy(s))
            })
        })
        .unwrap_or_default();

    if name.is_empty() {
        "file".to_string()
    } else {
        name
    }
}

/// Repairs the classic mojibake case: UTF-8 bytes that were read as
/// latin-1, leaving artifacts like 'Ð', 'Ñ', 'â', '€' in the name.
pub fn fix_mojibake(name: &str) -> String {
    if !name.chars().any(|c| matches!(c, 'Ð' | 'Ñ' | 'â' | '€')) {
        return name.to_string();
    }

    // Re-encode each char back to the byte it was misread from. '€' is a
    // cp1252 artifact that sits outside latin-1.
    let mut bytes = Vec::with_capacity(name.len());
    for ch in name.chars() {
        let cp = ch as u32;
        if cp <= 0xFF {
            bytes.push(cp as u8);
        } else if ch == '€' {
            bytes.push(0x80);
        } else {
            return name.to_string();
        }
    }

    match String::from_utf8(bytes) {
        Ok(fixed) => fixed,
        Err(_) => name.to_string(),
    }
}

/// Extracts a filename from a `Content-Disposition` header value, if any.
/// Prefers the RFC 5987 `filename*=UTF-8''...` form over plain `filename=`.
pub fn filename_from_content_disposition(cd: Option<&str>) -> Option<String> {
    let cd = cd?.trim();

    let ext_re = Regex::new(r"(?i)filename\*\s*=\s*UTF-8''([^;]+)").unwrap();
    let quoted_re = Regex::new(r#"(?i)filename\s*=\s*"([^"]+)""#).unwrap();
    let bare_re = Regex::new(r"(?i)filename\s*=\s*([^;]+)").unwrap();

    let raw = if let Some(caps) = ext_re.captures(cd) {
        percent_decode_lossy(&caps[1])
    } else if let Some(caps) = quoted_re.captures(cd) {
        caps[1].to_string()
    } else if let Some(caps) = bare_re.captures(cd) {
        caps[1].trim().trim_matches('"').to_string()
    } else {
        return None;
    };

    // Drop any path components smuggled into the header.
    let fname = raw
        .rsplit('/')
        .next()
        .and_then(|s| s.rsplit('\\').next())
        .unwrap_or("")
        .to_string();
    let fname = fix_mojibake(&fname);

    if fname.is_empty() {
        None
    } else {
        Some(fname)
    }
}

/// Produces the `name_2`, `name_3`, ... variant for collision handling,
/// keeping the extension in place.
pub fn numbered_variant(name: &str, index: u32) -> String {
    match name.rfind('.') {
        Some(dot) if dot > 0 => {
            let (stem, suffix) = name.split_at(dot);
            format!("{}_{}{}", stem, index, suffix)
        }
        _ => format!("{}_{}", name, index),
    }
}

fn percent_decode_lossy(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}
