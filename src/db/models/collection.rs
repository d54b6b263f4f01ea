//! Collection models and the image-list selector used to start a player.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub image_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Which images a player should receive: every image, or one collection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum CollectionSelector {
    #[default]
    All,
    Collection(i64),
}

impl fmt::Display for CollectionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionSelector::All => f.write_str("all"),
            CollectionSelector::Collection(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for CollectionSelector {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") {
            return Ok(CollectionSelector::All);
        }
        value
            .parse::<i64>()
            .map(CollectionSelector::Collection)
            .map_err(|_| format!("expected 'all' or a collection id, got '{value}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_parses_all_and_ids() {
        assert_eq!("all".parse::<CollectionSelector>(), Ok(CollectionSelector::All));
        assert_eq!("ALL".parse::<CollectionSelector>(), Ok(CollectionSelector::All));
        assert_eq!(
            " 12 ".parse::<CollectionSelector>(),
            Ok(CollectionSelector::Collection(12))
        );
        assert!("figures".parse::<CollectionSelector>().is_err());
    }

    #[test]
    fn selector_display_round_trips() {
        for selector in [CollectionSelector::All, CollectionSelector::Collection(3)] {
            assert_eq!(selector.to_string().parse::<CollectionSelector>(), Ok(selector));
        }
    }
}
