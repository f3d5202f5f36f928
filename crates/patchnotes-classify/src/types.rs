//! Shared classification types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Item shop category. Partitions the `items` section of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    Weapon,
    Spirit,
    Vitality,
}

impl ItemCategory {
    pub fn all() -> &'static [ItemCategory] {
        &[Self::Weapon, Self::Spirit, Self::Vitality]
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weapon => write!(f, "Weapon"),
            Self::Spirit => write!(f, "Spirit"),
            Self::Vitality => write!(f, "Vitality"),
        }
    }
}

impl FromStr for ItemCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weapon" => Ok(Self::Weapon),
            "spirit" => Ok(Self::Spirit),
            "vitality" => Ok(Self::Vitality),
            other => Err(format!("unknown item category '{}'", other)),
        }
    }
}

/// Direction of a balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Buff,
    Nerf,
    Other,
}

/// Every leaf bucket a line can land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Buff,
    Nerf,
    Other,
    New,
    Gameplay,
    Fixes,
    Uncategorized,
    Gallery,
    Hidden,
}

impl From<Polarity> for Bucket {
    fn from(p: Polarity) -> Self {
        match p {
            Polarity::Buff => Self::Buff,
            Polarity::Nerf => Self::Nerf,
            Polarity::Other => Self::Other,
        }
    }
}

/// Flat (non-entity) buckets a line can be forced or fall back into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneralBucket {
    New,
    Gameplay,
    Fixes,
    Uncategorized,
    Gallery,
    Hidden,
}

impl GeneralBucket {
    pub fn all() -> &'static [GeneralBucket] {
        &[
            Self::New,
            Self::Gameplay,
            Self::Fixes,
            Self::Uncategorized,
            Self::Gallery,
            Self::Hidden,
        ]
    }
}

impl From<GeneralBucket> for Bucket {
    fn from(b: GeneralBucket) -> Self {
        match b {
            GeneralBucket::New => Self::New,
            GeneralBucket::Gameplay => Self::Gameplay,
            GeneralBucket::Fixes => Self::Fixes,
            GeneralBucket::Uncategorized => Self::Uncategorized,
            GeneralBucket::Gallery => Self::Gallery,
            GeneralBucket::Hidden => Self::Hidden,
        }
    }
}

/// One normalized unit of patch text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub text: String,
    /// Set when the bucket is decided structurally (media, nested lines).
    pub forced_bucket: Option<GeneralBucket>,
    /// Inner text of the most recent `[ Section ]` header.
    pub source_header: Option<String>,
}

impl LogicalLine {
    pub fn normal(text: impl Into<String>, source_header: Option<String>) -> Self {
        Self {
            text: text.into(),
            forced_bucket: None,
            source_header,
        }
    }

    pub fn forced(
        text: impl Into<String>,
        bucket: GeneralBucket,
        source_header: Option<String>,
    ) -> Self {
        Self {
            text: text.into(),
            forced_bucket: Some(bucket),
            source_header,
        }
    }
}

/// Where a single line ended up. Each line gets exactly one placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Hero {
        name: String,
        polarity: Polarity,
    },
    Item {
        category: ItemCategory,
        name: String,
        polarity: Polarity,
    },
    General(GeneralBucket),
}
