//! Classification engine: normalize → resolve → polarity → aggregate.

use tracing::{debug, info};

use crate::aggregate::{fallback_bucket, Accumulator, ClassificationResult};
use crate::normalize::LineNormalizer;
use crate::polarity::PolarityClassifier;
use crate::resolve::{Entity, EntityResolver};
use crate::rules::CompiledRules;
use crate::types::{LogicalLine, Placement};
use crate::vocabulary::Vocabulary;

/// Classifies patch bodies against one vocabulary snapshot.
///
/// Holds only shared references, so one classifier (or several) can serve
/// concurrent runs; each call owns its own accumulator.
pub struct Classifier<'a> {
    vocab: &'a Vocabulary,
    rules: &'a CompiledRules,
    normalizer: LineNormalizer<'a>,
    resolver: EntityResolver<'a>,
    polarity: PolarityClassifier<'a>,
}

impl<'a> Classifier<'a> {
    pub fn new(vocab: &'a Vocabulary, rules: &'a CompiledRules) -> Self {
        Self {
            vocab,
            rules,
            normalizer: LineNormalizer::new(rules),
            resolver: EntityResolver::new(vocab, rules),
            polarity: PolarityClassifier::new(rules),
        }
    }

    /// Decide the single bucket a logical line belongs to.
    pub fn place(&self, line: &LogicalLine) -> Placement {
        if let Some(bucket) = line.forced_bucket {
            return Placement::General(bucket);
        }

        match self.resolver.resolve(&line.text) {
            Some(resolution) => {
                let polarity = self.polarity.classify(&line.text);
                debug!(
                    "{:?} match ({:?}) for line: {}",
                    resolution.rule, polarity, line.text
                );
                match resolution.entity {
                    Entity::Hero(hero) => Placement::Hero {
                        name: hero.name.clone(),
                        polarity,
                    },
                    Entity::Item(item) => Placement::Item {
                        category: item.category,
                        name: item.name.clone(),
                        polarity,
                    },
                }
            }
            None => Placement::General(fallback_bucket(
                &line.text,
                line.source_header.as_deref(),
                self.rules,
            )),
        }
    }

    /// Classify one patch body from scratch.
    pub fn classify(&self, content: &str) -> ClassificationResult {
        let lines = self.normalizer.normalize(content);
        let line_count = lines.len();

        let mut acc = Accumulator::new(self.vocab);
        for line in lines {
            let placement = self.place(&line);
            acc.record(line.text, &placement);
        }
        let result = acc.finish();

        info!(
            "Classified {} lines: {} heroes, {} item categories, {} fixes, {} uncategorized",
            line_count,
            result.heroes.len(),
            result.items.len(),
            result.fixes.len(),
            result.uncategorized.len()
        );
        result
    }
}

/// Classify `content` with a throwaway [`Classifier`].
pub fn classify(content: &str, vocab: &Vocabulary, rules: &CompiledRules) -> ClassificationResult {
    Classifier::new(vocab, rules).classify(content)
}
