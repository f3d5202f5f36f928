//! Polarity classifier: buff, nerf or other for a single line.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::rules::CompiledRules;
use crate::types::Polarity;

static COOLDOWN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)cooldown|\bcd\b").unwrap());

static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d+(?:\.\d+)?)(ms|s)?\b").unwrap());

/// Duration-like numbers in textual order, in seconds.
///
/// When any number carries a time unit only the unit-bearing ones are
/// returned, so `Ability 2 cooldown from 30s to 20s` compares 30 and 20.
pub fn duration_values(text: &str) -> Vec<f64> {
    let mut with_unit = Vec::new();
    let mut all = Vec::new();

    for cap in DURATION_RE.captures_iter(text) {
        let Some(value) = cap.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) else {
            continue;
        };
        match cap.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
            Some(unit) => {
                let secs = match unit.as_str() {
                    "ms" => value / 1000.0,
                    _ => value,
                };
                with_unit.push(secs);
                all.push(secs);
            }
            None => all.push(value),
        }
    }

    if with_unit.is_empty() {
        all
    } else {
        with_unit
    }
}

/// Whether the line talks about a cooldown.
pub fn mentions_cooldown(text: &str) -> bool {
    COOLDOWN_RE.is_match(text)
}

/// Classifies change direction. Total: every line gets a polarity.
pub struct PolarityClassifier<'r> {
    rules: &'r CompiledRules,
}

impl<'r> PolarityClassifier<'r> {
    pub fn new(rules: &'r CompiledRules) -> Self {
        Self { rules }
    }

    pub fn classify(&self, text: &str) -> Polarity {
        if self.rules.presentation.is_match(text) {
            return Polarity::Other;
        }

        if mentions_cooldown(text) {
            // "from X to Y": read in textual order, not by magnitude.
            return match duration_values(text).as_slice() {
                [first, second, ..] if first < second => Polarity::Nerf,
                [_, _, ..] => Polarity::Buff,
                _ => Polarity::Other,
            };
        }

        if self.rules.buff.is_match(text) {
            Polarity::Buff
        } else if self.rules.nerf.is_match(text) {
            Polarity::Nerf
        } else {
            Polarity::Other
        }
    }
}
