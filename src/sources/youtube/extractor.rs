use serde_json::Value;

/// Keys whose values are playlist entry records.
pub const ENTRY_MARKERS: &[&str] = &["playlistVideoRenderer", "playlistPanelVideoRenderer"];

/// Keys whose values hold a continuation token, with the field carrying it.
pub const CONTINUATION_MARKERS: &[(&str, &str)] = &[
    ("continuationCommand", "token"),
    ("nextContinuationData", "continuation"),
];

/// Placeholder titles upstream uses for entries that cannot be played.
const UNAVAILABLE_TITLES: &[&str] = &[
    "[private video]",
    "[deleted video]",
    "[unavailable video]",
    "[removed video]",
];

/// Depth-first walk over every object member, in document order, regardless
/// of nesting. `visit` sees each `(key, value)` pair before its children.
pub fn walk_tree<'a, F>(value: &'a Value, visit: &mut F)
where
    F: FnMut(&'a str, &'a Value),
{
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                visit(key.as_str(), child);
                walk_tree(child, visit);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_tree(item, visit);
            }
        }
        _ => {}
    }
}

/// Raw results of scanning one page.
#[derive(Debug, Default)]
pub struct PageScan<'a> {
    pub entries: Vec<&'a Value>,
    pub tokens: Vec<String>,
}

pub fn scan_page(page: &Value) -> PageScan<'_> {
    let mut scan = PageScan::default();
    walk_tree(page, &mut |key, value| {
        if ENTRY_MARKERS.contains(&key) {
            scan.entries.push(value);
            return;
        }
        if let Some((_, field)) = CONTINUATION_MARKERS.iter().find(|(marker, _)| *marker == key) {
            if let Some(token) = value.get(*field).and_then(|t| t.as_str()) {
                scan.tokens.push(token.to_string());
            }
        }
    });
    scan
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub media_id: String,
    pub title: String,
    pub duration_seconds: u64,
    pub author: Option<String>,
}

/// Reads an entry record. `None` for records without an id or title and for
/// unavailable placeholders.
pub fn extract_entry(renderer: &Value) -> Option<RawEntry> {
    let media_id = renderer
        .get("videoId")
        .and_then(|v| v.as_str())
        .or_else(|| {
            renderer
                .get("navigationEndpoint")
                .and_then(|n| n.get("watchEndpoint"))
                .and_then(|w| w.get("videoId"))
                .and_then(|v| v.as_str())
        })?;
    if media_id.is_empty() {
        return None;
    }

    let title = renderer.get("title").and_then(get_text)?;
    if is_unavailable_title(&title) {
        return None;
    }

    let duration_seconds = renderer
        .get("lengthSeconds")
        .and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse::<u64>().ok()))
        })
        .or_else(|| {
            renderer
                .get("lengthText")
                .and_then(get_text)
                .and_then(|s| parse_duration(&s))
        })
        .unwrap_or(0);

    let author = ["shortBylineText", "longBylineText", "ownerText"]
        .iter()
        .find_map(|key| renderer.get(*key).and_then(get_text))
        .filter(|a| !a.is_empty());

    Some(RawEntry {
        media_id: media_id.to_string(),
        title,
        duration_seconds,
        author,
    })
}

pub fn is_unavailable_title(title: &str) -> bool {
    let title = title.trim().to_lowercase();
    UNAVAILABLE_TITLES.contains(&title.as_str())
}

/// Listing-level title and author, taken from whichever header shape the
/// page carries.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ListingHeader {
    pub title: Option<String>,
    pub author: Option<String>,
}

pub fn extract_header(page: &Value) -> ListingHeader {
    let mut header = ListingHeader::default();
    walk_tree(page, &mut |key, value| {
        let (title, author) = match key {
            "playlistHeaderRenderer" => (
                value.get("title").and_then(get_text),
                value.get("ownerText").and_then(get_text),
            ),
            "playlistPanelRenderer" => (
                value.get("title").and_then(get_text),
                value.get("ownerName").and_then(get_text),
            ),
            "pageHeaderRenderer" => (value.get("pageTitle").and_then(get_text), None),
            "playlistMetadataRenderer" => (value.get("title").and_then(get_text), None),
            _ => return,
        };
        if header.title.is_none() {
            header.title = title.filter(|t| !t.is_empty());
        }
        if header.author.is_none() {
            header.author = author.filter(|a| !a.is_empty());
        }
    });
    header
}

/// Plain string, `simpleText`, `runs[].text` or `content`.
pub fn get_text(obj: &Value) -> Option<String> {
    if let Some(s) = obj.as_str() {
        return Some(s.to_string());
    }
    if let Some(simple_text) = obj.get("simpleText").and_then(|v| v.as_str()) {
        return Some(simple_text.to_string());
    }
    if let Some(runs) = obj.get("runs").and_then(|v| v.as_array()) {
        let mut text = String::new();
        for run in runs {
            if let Some(t) = run.get("text").and_then(|v| v.as_str()) {
                text.push_str(t);
            }
        }
        return Some(text);
    }
    obj.get("content")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// `H:MM:SS` or `M:SS` into seconds.
pub fn parse_duration(s: &str) -> Option<u64> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let mut seconds = 0u64;
    for part in parts {
        let value = part.trim().parse::<u64>().ok()?;
        seconds = seconds * 60 + value;
    }
    Some(seconds)
}
