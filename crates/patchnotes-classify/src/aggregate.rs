//! Aggregation: folds per-line placements into a [`ClassificationResult`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::rules::CompiledRules;
use crate::types::{Bucket, GeneralBucket, ItemCategory, Placement, Polarity};
use crate::vocabulary::Vocabulary;

/// Buff, nerf and other lines for one hero or item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default)]
    pub buff: Vec<String>,
    #[serde(default)]
    pub nerf: Vec<String>,
    #[serde(default)]
    pub other: Vec<String>,
}

impl ChangeSet {
    pub fn get(&self, polarity: Polarity) -> &[String] {
        match polarity {
            Polarity::Buff => &self.buff,
            Polarity::Nerf => &self.nerf,
            Polarity::Other => &self.other,
        }
    }

    fn get_mut(&mut self, polarity: Polarity) -> &mut Vec<String> {
        match polarity {
            Polarity::Buff => &mut self.buff,
            Polarity::Nerf => &mut self.nerf,
            Polarity::Other => &mut self.other,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buff.is_empty() && self.nerf.is_empty() && self.other.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buff.len() + self.nerf.len() + self.other.len()
    }

    fn sort(&mut self) {
        sort_numbered_first(&mut self.buff);
        sort_numbered_first(&mut self.nerf);
        sort_numbered_first(&mut self.other);
    }
}

/// The normalized structure for one patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationResult {
    pub heroes: BTreeMap<String, ChangeSet>,
    pub items: BTreeMap<ItemCategory, BTreeMap<String, ChangeSet>>,
    pub new: Vec<String>,
    pub gameplay: Vec<String>,
    pub fixes: Vec<String>,
    pub uncategorized: Vec<String>,
    pub gallery: Vec<String>,
    pub hidden: Vec<String>,
}

impl ClassificationResult {
    pub fn general(&self, bucket: GeneralBucket) -> &[String] {
        match bucket {
            GeneralBucket::New => &self.new,
            GeneralBucket::Gameplay => &self.gameplay,
            GeneralBucket::Fixes => &self.fixes,
            GeneralBucket::Uncategorized => &self.uncategorized,
            GeneralBucket::Gallery => &self.gallery,
            GeneralBucket::Hidden => &self.hidden,
        }
    }

    fn general_mut(&mut self, bucket: GeneralBucket) -> &mut Vec<String> {
        match bucket {
            GeneralBucket::New => &mut self.new,
            GeneralBucket::Gameplay => &mut self.gameplay,
            GeneralBucket::Fixes => &mut self.fixes,
            GeneralBucket::Uncategorized => &mut self.uncategorized,
            GeneralBucket::Gallery => &mut self.gallery,
            GeneralBucket::Hidden => &mut self.hidden,
        }
    }

    /// Every leaf line together with the bucket it sits in.
    pub fn lines(&self) -> Vec<(Bucket, &str)> {
        let mut out: Vec<(Bucket, &str)> = Vec::new();
        let entity_sets = self
            .heroes
            .values()
            .chain(self.items.values().flat_map(|m| m.values()));
        for set in entity_sets {
            for polarity in [Polarity::Buff, Polarity::Nerf, Polarity::Other] {
                out.extend(set.get(polarity).iter().map(|l| (Bucket::from(polarity), l.as_str())));
            }
        }
        for &bucket in GeneralBucket::all() {
            out.extend(self.general(bucket).iter().map(|l| (Bucket::from(bucket), l.as_str())));
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }

    /// Compact JSON; map ordering makes it byte-stable for equal results.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

fn has_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

/// Entries containing a digit first, each group in lexicographic order.
pub fn sort_numbered_first(list: &mut [String]) {
    list.sort_by(|a, b| {
        has_digit(b)
            .cmp(&has_digit(a))
            .then_with(|| a.cmp(b))
    });
}

/// Fallback bucket for a line no entity claimed.
///
/// The line text decides first; the section header is only a hint when
/// the text itself matches nothing.
pub fn fallback_bucket(text: &str, header: Option<&str>, rules: &CompiledRules) -> GeneralBucket {
    if rules.fixes.is_match(text) {
        return GeneralBucket::Fixes;
    }
    if rules.gameplay.is_match(text) {
        return GeneralBucket::Gameplay;
    }
    if rules.new.is_match(text) {
        return GeneralBucket::New;
    }

    match header {
        Some(h) if rules.fix_words.is_match(h) => GeneralBucket::Fixes,
        Some(h) if rules.gameplay.is_match(h) => GeneralBucket::Gameplay,
        Some(h) if rules.new.is_match(h) => GeneralBucket::New,
        _ => GeneralBucket::Uncategorized,
    }
}

/// In-progress result for one classification run.
pub struct Accumulator {
    result: ClassificationResult,
}

impl Accumulator {
    /// Start with an empty change set for every known hero and item.
    pub fn new(vocab: &Vocabulary) -> Self {
        let mut result = ClassificationResult::default();
        for hero in vocab.heroes() {
            result.heroes.insert(hero.name.clone(), ChangeSet::default());
        }
        for category in ItemCategory::all() {
            result.items.insert(*category, BTreeMap::new());
        }
        for item in vocab.items() {
            result
                .items
                .entry(item.category)
                .or_default()
                .insert(item.name.clone(), ChangeSet::default());
        }
        Self { result }
    }

    pub fn record(&mut self, line: String, placement: &Placement) {
        match placement {
            Placement::Hero { name, polarity } => {
                self.result
                    .heroes
                    .entry(name.clone())
                    .or_default()
                    .get_mut(*polarity)
                    .push(line);
            }
            Placement::Item {
                category,
                name,
                polarity,
            } => {
                self.result
                    .items
                    .entry(*category)
                    .or_default()
                    .entry(name.clone())
                    .or_default()
                    .get_mut(*polarity)
                    .push(line);
            }
            Placement::General(bucket) => self.result.general_mut(*bucket).push(line),
        }
    }

    /// Sort every list, then drop untouched heroes, items and categories.
    pub fn finish(mut self) -> ClassificationResult {
        let r = &mut self.result;

        for set in r.heroes.values_mut() {
            set.sort();
        }
        for items in r.items.values_mut() {
            for set in items.values_mut() {
                set.sort();
            }
        }
        for &bucket in GeneralBucket::all() {
            r.general_mut(bucket).sort();
        }

        r.heroes.retain(|_, set| !set.is_empty());
        for items in r.items.values_mut() {
            items.retain(|_, set| !set.is_empty());
        }
        r.items.retain(|_, items| !items.is_empty());

        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::{Hero, Item};

    #[test]
    fn test_sort_numbered_first() {
        let mut list = vec![
            "b change".to_string(),
            "Range 10 to 12".to_string(),
            "a change".to_string(),
            "Damage 5 to 7".to_string(),
        ];
        sort_numbered_first(&mut list);
        assert_eq!(list, vec!["Damage 5 to 7", "Range 10 to 12", "a change", "b change"]);
    }

    #[test]
    fn test_prune_and_partition() {
        let vocab = Vocabulary::new(
            vec![Hero::new("Abrams", Vec::<String>::new()), Hero::new("Bebop", Vec::<String>::new())],
            vec![Item::new("Extra Health", ItemCategory::Vitality)],
        );
        let mut acc = Accumulator::new(&vocab);
        acc.record(
            "Abrams: more health".into(),
            &Placement::Hero {
                name: "Abrams".into(),
                polarity: Polarity::Buff,
            },
        );
        acc.record("Fixed a bug".into(), &Placement::General(GeneralBucket::Fixes));
        let result = acc.finish();

        assert_eq!(result.heroes.len(), 1);
        assert_eq!(result.heroes["Abrams"].buff, vec!["Abrams: more health"]);
        assert!(result.items.is_empty());
        assert_eq!(result.fixes, vec!["Fixed a bug"]);
        assert_eq!(result.lines().len(), 2);
    }

    #[test]
    fn test_fallback_buckets() {
        let rules = CompiledRules::default();
        assert_eq!(fallback_bucket("Fixed a crash on load", None, &rules), GeneralBucket::Fixes);
        assert_eq!(
            fallback_bucket("Walkers now have more health", None, &rules),
            GeneralBucket::Gameplay
        );
        assert_eq!(fallback_bucket("Added a new hero", None, &rules), GeneralBucket::New);
        assert_eq!(
            fallback_bucket("Something changed", Some("Bug Fixes"), &rules),
            GeneralBucket::Fixes
        );
        assert_eq!(
            fallback_bucket("Something changed", Some("Hero Changes"), &rules),
            GeneralBucket::Uncategorized
        );
    }

    #[test]
    fn test_json_shape() {
        let mut result = ClassificationResult::default();
        let mut weapons = BTreeMap::new();
        weapons.insert(
            "Long Range".to_string(),
            ChangeSet {
                nerf: vec!["Long Range: reduced".into()],
                ..Default::default()
            },
        );
        result.items.insert(ItemCategory::Weapon, weapons);
        let value: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(value["items"]["Weapon"]["Long Range"]["nerf"][0], "Long Range: reduced");
        assert!(value["gallery"].is_array());
        assert_eq!(ClassificationResult::from_json(&result.to_json().unwrap()).unwrap(), result);
    }
}
