//! Hand-curated classification vocabularies, kept as data.
//!
//! [`RuleSet`] is the serializable form (every field optional in
//! `rules.json`); [`CompiledRules`] holds the precompiled matchers used
//! while classifying.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use patchnotes_core::{Error, Result};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Term lists driving entity resolution, polarity and fallback buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Phrases that contain an entity name but mean something else.
    pub ignore_phrases: Vec<String>,
    /// Visual/audio terms; a line containing one is never a buff or nerf.
    pub presentation_terms: Vec<String>,
    pub buff_terms: Vec<String>,
    pub nerf_terms: Vec<String>,
    /// Matched at the start of a line only.
    pub fix_prefixes: Vec<String>,
    pub gameplay_terms: Vec<String>,
    pub new_terms: Vec<String>,
    /// A line ending in one of these is a bare media file reference.
    pub hidden_extensions: Vec<String>,
    /// Variant spelling → canonical spelling, applied before entity matching.
    pub aliases: BTreeMap<String, String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert("knock down".to_string(), "knockdown".to_string());

        Self {
            ignore_phrases: strings(&["long range", "hero labs"]),
            presentation_terms: strings(&["vfx", "sfx", "sound", "audio", "animation", "visual"]),
            buff_terms: strings(&["increase", "improve", "now grant", "now has", "now gain"]),
            nerf_terms: strings(&[
                "reduce",
                "decrease",
                "no longer grant",
                "no longer has",
                "remove",
                "lower",
            ]),
            fix_prefixes: strings(&["fixed", "fixes", "fix"]),
            gameplay_terms: strings(&[
                "gameplay",
                "map",
                "objective",
                "terrain",
                "lane",
                "walker",
                "guardian",
                "patron",
                "shrine",
                "urn",
                "jungle",
                "trooper",
                "zipline",
                "mid boss",
                "rejuvenator",
                "soul orb",
            ]),
            new_terms: strings(&["added", "new", "introduced", "updated"]),
            hidden_extensions: strings(&[
                "mp4", "webm", "mov", "m4v", "png", "jpg", "jpeg", "gif", "webp",
            ]),
            aliases,
        }
    }
}

impl RuleSet {
    /// Parse a rules file. Missing fields take their built-in defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("invalid rules file {}: {}", path.display(), e)))
    }

    /// Load `path` if it exists, otherwise fall back to [`RuleSet::default`].
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let rules = Self::load(path)?;
            info!("Loaded classification rules from {}", path.display());
            Ok(rules)
        } else {
            info!("No rules file at {}, using built-in rules", path.display());
            Ok(Self::default())
        }
    }

    /// Precompile the term lists into matchers.
    pub fn compile(&self) -> Result<CompiledRules> {
        let mut aliases: Vec<(String, String)> = self
            .aliases
            .iter()
            .filter(|(from, _)| !from.trim().is_empty())
            .map(|(from, to)| (from.to_lowercase(), to.to_lowercase()))
            .collect();
        // Longest variant first so overlapping variants rewrite deterministically.
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        Ok(CompiledRules {
            ignore_phrases: lowered(&self.ignore_phrases),
            aliases,
            presentation: TermSet::word_start(&self.presentation_terms)?,
            buff: TermSet::word_start(&self.buff_terms)?,
            nerf: TermSet::word_start(&self.nerf_terms)?,
            fixes: TermSet::line_start(&self.fix_prefixes)?,
            fix_words: TermSet::word_start(&self.fix_prefixes)?,
            gameplay: TermSet::word_start(&self.gameplay_terms)?,
            new: TermSet::word_start(&self.new_terms)?,
            hidden_extensions: self
                .hidden_extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .map(|e| format!(".{}", e))
                .collect(),
        })
    }
}

fn lowered(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// A case-insensitive alternation over a list of terms.
#[derive(Debug, Clone)]
pub struct TermSet {
    regex: Option<Regex>,
}

impl TermSet {
    /// Matches any term starting at a word boundary (`increase` hits `increased`).
    pub fn word_start(terms: &[String]) -> Result<Self> {
        Self::build(terms, r"(?i)\b(?:", ")")
    }

    /// Matches any term as the first word of the text.
    pub fn line_start(terms: &[String]) -> Result<Self> {
        Self::build(terms, r"(?i)^\s*(?:", r")\b")
    }

    fn build(terms: &[String], prefix: &str, suffix: &str) -> Result<Self> {
        let mut escaped: Vec<String> = lowered(terms).iter().map(|t| regex::escape(t)).collect();
        if escaped.is_empty() {
            return Ok(Self { regex: None });
        }
        escaped.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        escaped.dedup();

        let pattern = format!("{}{}{}", prefix, escaped.join("|"), suffix);
        let regex = Regex::new(&pattern)
            .map_err(|e| Error::Config(format!("invalid term list: {}", e)))?;
        Ok(Self { regex: Some(regex) })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(text))
    }
}

/// Matchers built from a [`RuleSet`], shared read-only across classifications.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    ignore_phrases: Vec<String>,
    aliases: Vec<(String, String)>,
    pub presentation: TermSet,
    pub buff: TermSet,
    pub nerf: TermSet,
    pub fixes: TermSet,
    /// Fix terms anywhere in the text; used for section headers.
    pub fix_words: TermSet,
    pub gameplay: TermSet,
    pub new: TermSet,
    hidden_extensions: Vec<String>,
}

impl Default for CompiledRules {
    fn default() -> Self {
        RuleSet::default()
            .compile()
            .expect("built-in rules are valid")
    }
}

impl CompiledRules {
    /// Whether a lower-cased line contains an ignore-list phrase.
    pub fn is_ignored(&self, text_lower: &str) -> bool {
        self.ignore_phrases.iter().any(|p| text_lower.contains(p.as_str()))
    }

    /// Rewrite variant spellings in a lower-cased line.
    pub fn apply_aliases(&self, text_lower: &str) -> String {
        let mut out = text_lower.to_string();
        for (from, to) in &self.aliases {
            if out.contains(from.as_str()) {
                out = out.replace(from.as_str(), to);
            }
        }
        out
    }

    /// Whether the text ends with a bare media file extension.
    pub fn is_hidden_media(&self, text: &str) -> bool {
        let lower = text.trim_end().to_lowercase();
        self.hidden_extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_start_matching() {
        let set = TermSet::word_start(&strings(&["increase", "now grant"])).unwrap();
        assert!(set.is_match("Increased bullet damage"));
        assert!(set.is_match("Item now grants +5 armor"));
        assert!(!set.is_match("reincrease"));
    }

    #[test]
    fn test_line_start_matching() {
        let set = TermSet::line_start(&strings(&["fixed", "fix"])).unwrap();
        assert!(set.is_match("Fixed a crash on load"));
        assert!(set.is_match("fix for stuck ropes"));
        assert!(!set.is_match("Fixation now deals more damage"));
        assert!(!set.is_match("Hotfix applied"));
    }

    #[test]
    fn test_empty_term_list_never_matches() {
        let set = TermSet::word_start(&[]).unwrap();
        assert!(!set.is_match("anything"));
    }

    #[test]
    fn test_aliases_and_ignore() {
        let rules = CompiledRules::default();
        assert_eq!(rules.apply_aliases("knock down duration"), "knockdown duration");
        assert!(rules.is_ignored("long range hero labs change"));
        assert!(!rules.is_ignored("extra health"));
    }

    #[test]
    fn test_hidden_media_extensions() {
        let rules = CompiledRules::default();
        assert!(rules.is_hidden_media("patch_trailer.MP4"));
        assert!(rules.is_hidden_media("preview.webm "));
        assert!(!rules.is_hidden_media("mp4 files"));
    }

    #[test]
    fn test_partial_rules_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, r#"{ "ignore_phrases": ["spirit power shop"] }"#).unwrap();
        let rules = RuleSet::load(&path).unwrap();
        assert_eq!(rules.ignore_phrases, vec!["spirit power shop"]);
        assert_eq!(rules.buff_terms, RuleSet::default().buff_terms);
    }

    #[test]
    fn test_missing_rules_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let rules = RuleSet::load_or_default(dir.path().join("absent.json")).unwrap();
        assert_eq!(rules, RuleSet::default());
    }

    #[test]
    fn test_malformed_rules_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(RuleSet::load(&path), Err(Error::Config(_))));
    }
}
