//! Entity resolver: decides which hero or item a line is about.
//!
//! Rules are tried in a fixed order and the first match wins:
//! `Item:` prefix, `Hero:` prefix, item mention, hero mention, ability name.
//! All comparisons run on a lower-cased, alias-rewritten copy of the line.

use crate::rules::CompiledRules;
use crate::vocabulary::{Hero, Item, Vocabulary};

const QUOTES: &[char] = &['"', '\'', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}'];
const APOSTROPHES: &[char] = &['\'', '\u{2019}'];

/// Which precedence rule produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    ExplicitItem,
    ExplicitHero,
    ItemMention,
    HeroMention,
    Ability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity<'v> {
    Hero(&'v Hero),
    Item(&'v Item),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'v> {
    pub entity: Entity<'v>,
    pub rule: MatchRule,
}

impl<'v> Resolution<'v> {
    fn hero(hero: &'v Hero, rule: MatchRule) -> Self {
        Self {
            entity: Entity::Hero(hero),
            rule,
        }
    }

    fn item(item: &'v Item, rule: MatchRule) -> Self {
        Self {
            entity: Entity::Item(item),
            rule,
        }
    }
}

/// Whether any occurrence of `key` in `text` touches a quote character.
/// A trailing apostrophe followed by a lone `s` is a possessive, not a quote.
pub fn quote_adjacent(text: &str, key: &str) -> bool {
    if key.is_empty() {
        return false;
    }
    text.match_indices(key).any(|(start, matched)| {
        let before = text[..start].chars().next_back();
        if before.is_some_and(|c| QUOTES.contains(&c)) {
            return true;
        }

        let mut after = text[start + matched.len()..].chars();
        match after.next() {
            Some(c) if APOSTROPHES.contains(&c) => {
                let possessive = after.next() == Some('s')
                    && after.next().map_or(true, |c| !c.is_alphanumeric());
                !possessive
            }
            Some(c) => QUOTES.contains(&c),
            None => false,
        }
    })
}

/// Resolves lines against a vocabulary snapshot.
pub struct EntityResolver<'a> {
    vocab: &'a Vocabulary,
    rules: &'a CompiledRules,
}

impl<'a> EntityResolver<'a> {
    pub fn new(vocab: &'a Vocabulary, rules: &'a CompiledRules) -> Self {
        Self { vocab, rules }
    }

    /// Resolve one line. `None` means no entity; the line goes to a fallback bucket.
    pub fn resolve(&self, text: &str) -> Option<Resolution<'a>> {
        if self.vocab.is_empty() {
            return None;
        }
        let lower = self.rules.apply_aliases(&text.to_lowercase());

        if let Some(item) = self
            .vocab
            .item_keys()
            .find(|(_, key)| lower.contains(&format!("{}:", key)))
            .map(|(item, _)| item)
        {
            return Some(Resolution::item(item, MatchRule::ExplicitItem));
        }

        if let Some(hero) = self
            .vocab
            .hero_keys()
            .find(|(_, key)| lower.contains(&format!("{}:", key)) && !quote_adjacent(&lower, key))
            .map(|(hero, _)| hero)
        {
            return Some(Resolution::hero(hero, MatchRule::ExplicitHero));
        }

        if !self.rules.is_ignored(&lower) {
            if let Some(item) = self
                .vocab
                .item_keys()
                .find(|(_, key)| lower.contains(*key))
                .map(|(item, _)| item)
            {
                return Some(Resolution::item(item, MatchRule::ItemMention));
            }

            if let Some(hero) = self
                .vocab
                .hero_keys()
                .find(|(_, key)| lower.contains(*key) && !quote_adjacent(&lower, key))
                .map(|(hero, _)| hero)
            {
                return Some(Resolution::hero(hero, MatchRule::HeroMention));
            }
        }

        self.vocab
            .hero_with_ability_in(&lower)
            .map(|hero| Resolution::hero(hero, MatchRule::Ability))
    }
}
