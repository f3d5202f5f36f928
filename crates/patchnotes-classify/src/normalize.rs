//! Line normalizer: raw forum post markup → logical lines.
//!
//! Works one physical line at a time, in document order. State carried
//! between lines: the active `[ Section ]` header, the label of the last
//! parent line (prefixed onto nested children), and a pending label line
//! ending in `:` that is only emitted if no nested block consumes it.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::rules::CompiledRules;
use crate::types::{GeneralBucket, LogicalLine};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

static SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bsrc\s*=\s*["']([^"']+)["']"#).unwrap());

static NESTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<div[^>]*\bstyle\s*=\s*["'][^"']*margin-left[^"']*["'][^>]*>"#).unwrap()
});

static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[([^\[\]]*)\]$").unwrap());

/// Remove markup tags.
pub fn strip_tags(s: &str) -> String {
    TAG_RE.replace_all(s, "").into_owned()
}

/// Decode the handful of entities forum bodies actually contain.
pub fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

/// Collapse whitespace runs to single spaces and trim.
fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip tags, decode entities, collapse whitespace, drop one leading `- ` bullet.
pub fn clean_text(raw: &str) -> String {
    let text = normalize_ws(&decode_entities(&strip_tags(raw)));
    match text.strip_prefix("- ") {
        Some(rest) => rest.trim_start().to_string(),
        None if text == "-" => String::new(),
        None => text,
    }
}

/// Inner text of a `[ Header ]` line.
pub fn header_text(stripped: &str) -> Option<String> {
    HEADER_RE
        .captures(stripped)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Every distinct image source URL referenced by a raw line, in order.
pub fn image_sources(raw: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for cap in SRC_RE.captures_iter(raw) {
        if let Some(m) = cap.get(1) {
            let url = m.as_str().trim().to_string();
            if !url.is_empty() && !urls.contains(&url) {
                urls.push(url);
            }
        }
    }
    urls
}

/// Converts raw content into logical lines.
pub struct LineNormalizer<'r> {
    rules: &'r CompiledRules,
}

impl<'r> LineNormalizer<'r> {
    pub fn new(rules: &'r CompiledRules) -> Self {
        Self { rules }
    }

    /// Normalize one patch body. Empty or markup-only content yields no lines.
    pub fn normalize(&self, content: &str) -> Vec<LogicalLine> {
        let mut state = State::default();
        for raw in content.lines() {
            self.process_line(&mut state, raw);
        }
        state.flush_pending();
        debug!("Normalized content into {} logical lines", state.out.len());
        state.out
    }

    fn process_line(&self, state: &mut State, raw: &str) {
        if NESTED_RE.is_match(raw) && self.process_nested(state, raw) {
            return;
        }

        let stripped = clean_text(raw);

        let sources = image_sources(raw);
        if !sources.is_empty() {
            state.flush_pending();
            for url in sources {
                state.push_forced(url, GeneralBucket::Gallery);
            }
            return;
        }

        if self.rules.is_hidden_media(&stripped) {
            state.flush_pending();
            let file = stripped
                .split_whitespace()
                .last()
                .unwrap_or(stripped.as_str())
                .to_string();
            state.push_forced(file, GeneralBucket::Hidden);
            return;
        }

        if stripped.is_empty() {
            return;
        }

        if let Some(header) = header_text(&stripped) {
            state.flush_pending();
            state.header = if header.is_empty() { None } else { Some(header) };
            state.label = None;
            return;
        }

        state.flush_pending();
        match stripped.strip_suffix(':') {
            Some(label) => {
                let label = label.trim_end();
                if label.is_empty() {
                    return;
                }
                state.label = Some(label.to_string());
                state.pending = Some(LogicalLine::normal(label, state.header.clone()));
            }
            None => {
                state.label = Some(stripped.clone());
                state.out.push(LogicalLine::normal(stripped, state.header.clone()));
            }
        }
    }

    /// Emit the children of an indentation block. Returns `false` when the
    /// block holds no text, so the caller treats the line normally.
    fn process_nested(&self, state: &mut State, raw: &str) -> bool {
        let mut parts = NESTED_RE.split(raw);
        let lead = parts.next().map(clean_text).unwrap_or_default();
        let children: Vec<String> = parts.map(clean_text).filter(|c| !c.is_empty()).collect();
        if children.is_empty() {
            return false;
        }

        if lead.is_empty() {
            // The pending label (if any) becomes the prefix instead of a line.
            state.pending = None;
        } else {
            state.flush_pending();
            let label = lead.trim_end_matches(':').trim_end();
            if !label.is_empty() {
                state.label = Some(label.to_string());
            }
        }

        for child in children {
            let text = match &state.label {
                Some(label) => format!("{}: {}", label, child),
                None => child,
            };
            state.push_forced(text, GeneralBucket::Uncategorized);
        }
        true
    }
}

#[derive(Default)]
struct State {
    header: Option<String>,
    label: Option<String>,
    pending: Option<LogicalLine>,
    out: Vec<LogicalLine>,
}

impl State {
    fn flush_pending(&mut self) {
        if let Some(line) = self.pending.take() {
            self.out.push(line);
        }
    }

    fn push_forced(&mut self, text: String, bucket: GeneralBucket) {
        self.out
            .push(LogicalLine::forced(text, bucket, self.header.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(content: &str) -> Vec<LogicalLine> {
        let rules = CompiledRules::default();
        LineNormalizer::new(&rules).normalize(content)
    }

    fn texts(lines: &[LogicalLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_strips_markup_and_bullets() {
        let lines = normalize("- Abrams: Increased health<br/>\n<b>- Bebop</b> &amp; friends<br />");
        assert_eq!(texts(&lines), vec!["Abrams: Increased health", "Bebop & friends"]);
        assert!(lines.iter().all(|l| l.forced_bucket.is_none()));
    }

    #[test]
    fn test_only_one_bullet_removed() {
        let lines = normalize("- Range changed from 10 - 15 to 12 - 18");
        assert_eq!(texts(&lines), vec!["Range changed from 10 - 15 to 12 - 18"]);
    }

    #[test]
    fn test_empty_content() {
        assert!(normalize("").is_empty());
        assert!(normalize("<br/>\n   \n<p></p>").is_empty());
    }

    #[test]
    fn test_header_carried_as_context() {
        let lines = normalize("[ Hero Changes ]<br/>\n- Abrams: Increased health\n[ Misc ]\n- Walkers: something");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].source_header.as_deref(), Some("Hero Changes"));
        assert_eq!(lines[1].source_header.as_deref(), Some("Misc"));
    }

    #[test]
    fn test_media_routing() {
        let lines = normalize(
            "<img src=\"https://cdn.example.com/patch/map.png\" alt=\"\" /><br/>\n- trailer_clip.mp4",
        );
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "https://cdn.example.com/patch/map.png");
        assert_eq!(lines[0].forced_bucket, Some(GeneralBucket::Gallery));
        assert_eq!(lines[1].text, "trailer_clip.mp4");
        assert_eq!(lines[1].forced_bucket, Some(GeneralBucket::Hidden));
    }

    #[test]
    fn test_nested_children_inherit_label() {
        let content = "- Abrams:<br/>\n<div style=\"margin-left: 20px\">- Health increased</div><div style=\"margin-left: 20px\">- Regen reduced</div>";
        let lines = normalize(content);
        assert_eq!(texts(&lines), vec!["Abrams: Health increased", "Abrams: Regen reduced"]);
        assert!(lines
            .iter()
            .all(|l| l.forced_bucket == Some(GeneralBucket::Uncategorized)));
    }

    #[test]
    fn test_nested_children_use_plain_previous_line() {
        let content = "- Seismic Impact changes\n<div style=\"margin-left: 40px\">- Radius up</div>";
        let lines = normalize(content);
        assert_eq!(
            texts(&lines),
            vec!["Seismic Impact changes", "Seismic Impact changes: Radius up"]
        );
        assert_eq!(lines[0].forced_bucket, None);
    }

    #[test]
    fn test_lead_text_before_marker_is_label() {
        let content = "Haze:<div style=\"margin-left: 20px\">- Smoke Bomb duration up</div>";
        let lines = normalize(content);
        assert_eq!(texts(&lines), vec!["Haze: Smoke Bomb duration up"]);
    }

    #[test]
    fn test_orphan_label_is_emitted_without_colon() {
        let lines = normalize("- Bebop:\n- Fixed a crash\n- Trailing label:");
        assert_eq!(texts(&lines), vec!["Bebop", "Fixed a crash", "Trailing label"]);
        assert!(lines.iter().all(|l| l.forced_bucket.is_none()));
    }

    #[test]
    fn test_header_resets_label_and_flushes_pending() {
        let content = "- Abrams:\n[ Items ]\n<div style=\"margin-left: 20px\">- Orphan child</div>";
        let lines = normalize(content);
        assert_eq!(texts(&lines), vec!["Abrams", "Orphan child"]);
        assert_eq!(lines[1].source_header.as_deref(), Some("Items"));
    }

    #[test]
    fn test_normalize_is_restartable() {
        let rules = CompiledRules::default();
        let normalizer = LineNormalizer::new(&rules);
        let content = "[ A ]\n- x:\n<div style=\"margin-left: 20px\">- y</div>\n- z";
        assert_eq!(normalizer.normalize(content), normalizer.normalize(content));
    }
}
