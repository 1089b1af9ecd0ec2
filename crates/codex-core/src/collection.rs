//! Collection keys: the fixed set of entity kinds the codex serves.
//!
//! | Key        | Override store key       | Remote endpoint          | Item field   |
//! |------------|--------------------------|--------------------------|--------------|
//! | Ships      | `pirate-ships-db`        | `data/ships.json`        | `ships`      |
//! | Components | `pirate-components-db`   | `data/components.json`   | `components` |
//! | Planets    | `pirate-planets-db`      | `data/planets.json`      | `planets`    |
//! | Systems    | `pirate-systems-db`      | `data/systems.json`      | `systems`    |

use crate::error::CodexError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Enumerated entity kind. Each maps to exactly one override key and one remote document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKey {
    Ships,
    Components,
    Planets,
    Systems,
}

impl CollectionKey {
    /// All collections in resolution order.
    pub fn all() -> [Self; 4] {
        [Self::Ships, Self::Components, Self::Planets, Self::Systems]
    }

    /// Plural name; also the top-level field holding the item array in the remote document.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ships => "ships",
            Self::Components => "components",
            Self::Planets => "planets",
            Self::Systems => "systems",
        }
    }

    /// Key of this collection in the override store.
    #[inline]
    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::Ships => "pirate-ships-db",
            Self::Components => "pirate-components-db",
            Self::Planets => "pirate-planets-db",
            Self::Systems => "pirate-systems-db",
        }
    }

    /// Relative location of the static remote document.
    #[inline]
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Ships => "data/ships.json",
            Self::Components => "data/components.json",
            Self::Planets => "data/planets.json",
            Self::Systems => "data/systems.json",
        }
    }

    #[inline]
    pub fn items_field(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionKey {
    type Err = CodexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ships" => Ok(Self::Ships),
            "components" => Ok(Self::Components),
            "planets" => Ok(Self::Planets),
            "systems" => Ok(Self::Systems),
            _ => Err(CodexError::UnknownCollection(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Ships".parse::<CollectionKey>().unwrap(), CollectionKey::Ships);
        assert_eq!(" planets ".parse::<CollectionKey>().unwrap(), CollectionKey::Planets);
    }

    #[test]
    fn unknown_collection_fails_fast() {
        let err = "missions".parse::<CollectionKey>().unwrap_err();
        assert!(matches!(err, CodexError::UnknownCollection(ref s) if s == "missions"));
    }

    #[test]
    fn every_key_has_distinct_locations() {
        let keys = CollectionKey::all();
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a.storage_key(), b.storage_key());
                assert_ne!(a.endpoint(), b.endpoint());
            }
            assert!(a.endpoint().ends_with(&format!("{}.json", a.items_field())));
        }
    }
}
