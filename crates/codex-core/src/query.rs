//! Query facade: read-only lookups, filters and comparisons over resolved collections.
//!
//! Every operation resolves through the [`ResolutionCache`] and degrades to an empty
//! collection when the data is unavailable. Results are cloned out; the cached
//! allocation is never mutated.

use crate::cache::ResolutionCache;
use crate::collection::CollectionKey;
use crate::entity::{Entity, EntityId};
use crate::error::{CodexError, CodexResult};
use crate::pricing::UpgradeCost;
use crate::ship::NormalizedShip;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Attribute label and the fields read for it, first present wins.
const COMPARED_ATTRIBUTES: [(&str, &[&str]); 6] = [
    ("hull", &["hull", "armorIndex"]),
    ("speed", &["speed"]),
    ("cargo", &["cargo"]),
    ("energy", &["energy"]),
    ("weaponSlots", &["weaponSlots"]),
    ("shieldSlots", &["shieldSlots"]),
];

/// Filter value meaning "no filter".
const ANY: &str = "all";

/// Optional filters AND-combined after the text match of [`QueryFacade::search`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub system: Option<String>,
    pub class: Option<String>,
    pub min_level: Option<f64>,
    pub max_level: Option<f64>,
    pub tier: Option<i64>,
    pub obtain_method: Option<String>,
}

fn text_filter(value: &str) -> Option<String> {
    let v = value.trim();
    (!v.is_empty() && !v.eq_ignore_ascii_case(ANY)).then(|| v.to_string())
}

fn numeric_filter<T: std::str::FromStr>(name: &str, value: &str) -> Option<T> {
    let v = value.trim();
    if v.is_empty() || v.eq_ignore_ascii_case(ANY) {
        return None;
    }
    match v.parse::<T>() {
        Ok(n) => Some(n),
        Err(_) => {
            debug!(target: "codex::query", filter = name, value = v, "Ignoring non-numeric filter");
            None
        }
    }
}

impl SearchFilters {
    /// Build from loose key/value pairs (query strings). Keys are accepted in camelCase
    /// or snake_case; unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filters = Self::default();
        for (k, v) in pairs {
            let v = v.as_ref();
            match k.as_ref() {
                "system" => filters.system = text_filter(v),
                "class" | "type" => filters.class = text_filter(v),
                "minLevel" | "min_level" => filters.min_level = numeric_filter("minLevel", v),
                "maxLevel" | "max_level" => filters.max_level = numeric_filter("maxLevel", v),
                "tier" => filters.tier = numeric_filter("tier", v),
                "obtainMethod" | "obtain_method" => filters.obtain_method = text_filter(v),
                _ => {}
            }
        }
        filters
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn accepts(&self, e: &Entity) -> bool {
        if let Some(system) = &self.system {
            if e.str_field("system") != Some(system.as_str()) {
                return false;
            }
        }
        if let Some(class) = &self.class {
            let matched = match e.get("classes").and_then(Value::as_array) {
                Some(_) => e.str_list("classes").contains(&class.as_str()),
                None => e.str_field("type") == Some(class.as_str()),
            };
            if !matched {
                return false;
            }
        }
        if let Some(min) = self.min_level {
            if !e.number("level").is_some_and(|l| l >= min) {
                return false;
            }
        }
        if let Some(max) = self.max_level {
            if !e.number("level").is_some_and(|l| l <= max) {
                return false;
            }
        }
        if let Some(tier) = self.tier {
            let actual = e.get("metadata.tier").or_else(|| e.get("tier")).and_then(Value::as_i64);
            if actual != Some(tier) {
                return false;
            }
        }
        if let Some(method) = &self.obtain_method {
            if e.str_field("obtainMethod") != Some(method.as_str()) {
                return false;
            }
        }
        true
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn text_matches(e: &Entity, needle_lower: &str) -> bool {
    contains_ci(e.name(), needle_lower)
        || e.str_field("description").is_some_and(|d| contains_ci(d, needle_lower))
        || e.str_list("classes").iter().any(|c| contains_ci(c, needle_lower))
        || e.str_field("type").is_some_and(|t| contains_ci(t, needle_lower))
        || e.str_field("metadata.class").is_some_and(|c| contains_ci(c, needle_lower))
}

/// Strict equality on primitives; membership for list-valued fields.
fn field_equals(e: &Entity, field: &str, value: &Value) -> bool {
    match e.get(field) {
        Some(Value::Array(items)) => items.contains(value),
        Some(actual) => actual == value,
        None => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    A,
    B,
    Tie,
}

/// One row of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeComparison {
    pub attribute: &'static str,
    pub value_a: f64,
    pub value_b: f64,
    pub difference: f64,
    /// `difference / value_b * 100`, one decimal; 0 when `value_b` is 0.
    pub percentage_of_b: f64,
    pub winner: Winner,
}

impl AttributeComparison {
    fn new(attribute: &'static str, value_a: f64, value_b: f64) -> Self {
        let difference = value_a - value_b;
        let percentage_of_b = if value_b == 0.0 {
            0.0
        } else {
            (difference / value_b * 1000.0).round() / 10.0
        };
        let winner = if difference > 0.0 {
            Winner::A
        } else if difference < 0.0 {
            Winner::B
        } else {
            Winner::Tie
        };
        Self {
            attribute,
            value_a,
            value_b,
            difference,
            percentage_of_b,
            winner,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub a: Entity,
    pub b: Entity,
    pub attributes: Vec<AttributeComparison>,
}

impl ComparisonReport {
    pub fn attribute(&self, name: &str) -> Option<&AttributeComparison> {
        self.attributes.iter().find(|c| c.attribute == name)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub ships: usize,
    pub components: usize,
    pub planets: usize,
    pub systems: usize,
    pub last_sync: DateTime<Utc>,
}

fn facet_key(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    }
}

pub struct QueryFacade {
    cache: Arc<ResolutionCache>,
}

impl QueryFacade {
    pub fn new(cache: Arc<ResolutionCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    /// The whole resolved collection.
    pub async fn all(&self, key: CollectionKey, force_refresh: bool) -> Arc<Vec<Entity>> {
        self.cache.resolve_or_empty(key, force_refresh).await
    }

    async fn filtered<F>(&self, key: CollectionKey, pred: F) -> Vec<Entity>
    where
        F: Fn(&Entity) -> bool,
    {
        self.all(key, false)
            .await
            .iter()
            .filter(|e| pred(*e))
            .cloned()
            .collect()
    }

    /// First entity whose `id` equals `id`, in stored order.
    pub async fn by_id(&self, key: CollectionKey, id: &EntityId) -> Option<Entity> {
        self.all(key, false)
            .await
            .iter()
            .find(|e| e.id().is_some_and(|v| id.matches(v)))
            .cloned()
    }

    pub async fn by_equality(&self, key: CollectionKey, field: &str, value: &Value) -> Vec<Entity> {
        self.filtered(key, |e| field_equals(e, field, value)).await
    }

    /// Inclusive numeric range; `None` bounds are open. Non-numeric values never match.
    pub async fn by_range(&self, key: CollectionKey, field: &str, min: Option<f64>, max: Option<f64>) -> Vec<Entity> {
        self.filtered(key, |e| {
            e.number(field).is_some_and(|n| {
                min.map_or(true, |lo| n >= lo) && max.map_or(true, |hi| n <= hi)
            })
        })
        .await
    }

    /// Case-insensitive substring search, then AND-combined filters.
    /// A blank query matches everything.
    pub async fn search(&self, key: CollectionKey, query: &str, filters: &SearchFilters) -> Vec<Entity> {
        let needle = query.trim().to_lowercase();
        self.filtered(key, |e| (needle.is_empty() || text_matches(e, &needle)) && filters.accepts(e))
            .await
    }

    /// Side-by-side numeric comparison of two entities of one collection.
    pub async fn compare(&self, key: CollectionKey, id_a: &EntityId, id_b: &EntityId) -> CodexResult<ComparisonReport> {
        let a = self.require(key, id_a).await?;
        let b = self.require(key, id_b).await?;

        let read = |e: &Entity, fields: &[&str]| fields.iter().find_map(|f| e.number(f)).unwrap_or(0.0);
        let attributes = COMPARED_ATTRIBUTES
            .iter()
            .map(|&(label, fields)| AttributeComparison::new(label, read(&a, fields), read(&b, fields)))
            .collect();

        Ok(ComparisonReport { a, b, attributes })
    }

    pub async fn upgrade_cost(&self, id: &EntityId) -> CodexResult<UpgradeCost> {
        let ship = self.require(CollectionKey::Ships, id).await?;
        Ok(NormalizedShip::from_entity(&ship).full_upgrade_cost())
    }

    pub async fn stats(&self) -> CollectionStats {
        CollectionStats {
            ships: self.all(CollectionKey::Ships, false).await.len(),
            components: self.all(CollectionKey::Components, false).await.len(),
            planets: self.all(CollectionKey::Planets, false).await.len(),
            systems: self.all(CollectionKey::Systems, false).await.len(),
            last_sync: Utc::now(),
        }
    }

    /// Occurrences per distinct value of `field`.
    pub async fn count_by(&self, key: CollectionKey, field: &str) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for e in self.all(key, false).await.iter() {
            *counts.entry(facet_key(e.get(field))).or_insert(0) += 1;
        }
        counts
    }

    /// Sorted distinct ship systems.
    pub async fn systems_info(&self) -> Vec<String> {
        let ships = self.all(CollectionKey::Ships, false).await;
        let set: BTreeSet<String> = ships
            .iter()
            .filter_map(|s| s.str_field("system"))
            .map(str::to_string)
            .collect();
        set.into_iter().collect()
    }

    /// Sorted distinct ship classes; ships without a class list contribute their `type`.
    pub async fn classes_info(&self) -> Vec<String> {
        let ships = self.all(CollectionKey::Ships, false).await;
        let mut set = BTreeSet::new();
        for ship in ships.iter() {
            if ship.get("classes").is_some_and(Value::is_array) {
                set.extend(ship.str_list("classes").into_iter().map(str::to_string));
            } else if let Some(t) = ship.str_field("type") {
                set.insert(t.to_string());
            }
        }
        set.into_iter().collect()
    }

    pub async fn featured_ships(&self) -> Vec<Entity> {
        self.filtered(CollectionKey::Ships, |s| s.bool_field("metadata.featured")).await
    }

    pub async fn popular_ships(&self) -> Vec<Entity> {
        self.filtered(CollectionKey::Ships, |s| s.bool_field("metadata.popular")).await
    }

    pub async fn hybrid_ships(&self) -> Vec<Entity> {
        self.filtered(CollectionKey::Ships, |s| s.bool_field("metadata.isHybrid")).await
    }

    pub async fn special_ships(&self) -> Vec<Entity> {
        self.filtered(CollectionKey::Ships, |s| {
            s.bool_field("metadata.isSpecial") || s.bool_field("metadata.isElite")
        })
        .await
    }

    async fn require(&self, key: CollectionKey, id: &EntityId) -> CodexResult<Entity> {
        self.by_id(key, id).await.ok_or_else(|| CodexError::EntityNotFound {
            collection: key.to_string(),
            id: id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(v: Value) -> Entity {
        Entity::from_value(v).unwrap()
    }

    #[test]
    fn filters_from_pairs_ignore_unknown_and_all() {
        let f = SearchFilters::from_pairs([
            ("system", "all"),
            ("class", "tank"),
            ("minLevel", "5"),
            ("tier", "x"),
            ("color", "red"),
        ]);
        assert_eq!(f.system, None);
        assert_eq!(f.class.as_deref(), Some("tank"));
        assert_eq!(f.min_level, Some(5.0));
        assert_eq!(f.tier, None);
        assert!(!f.is_empty());
        assert!(SearchFilters::from_pairs(Vec::<(String, String)>::new()).is_empty());
    }

    #[test]
    fn class_filter_falls_back_to_type() {
        let f = SearchFilters::from_pairs([("class", "tank")]);
        assert!(f.accepts(&entity(json!({"id": 1, "name": "A", "type": "tank"}))));
        assert!(f.accepts(&entity(json!({"id": 2, "name": "B", "classes": ["raider", "tank"]}))));
        assert!(!f.accepts(&entity(json!({"id": 3, "name": "C", "classes": [], "type": "tank"}))));
    }

    #[test]
    fn level_filter_excludes_missing_levels() {
        let f = SearchFilters::from_pairs([("maxLevel", "10")]);
        assert!(f.accepts(&entity(json!({"id": 1, "name": "A", "level": 10}))));
        assert!(!f.accepts(&entity(json!({"id": 2, "name": "B"}))));
    }

    #[test]
    fn tier_filter_reads_metadata_first() {
        let f = SearchFilters::from_pairs([("tier", "2")]);
        assert!(f.accepts(&entity(json!({"id": 1, "name": "A", "metadata": {"tier": 2}}))));
        assert!(f.accepts(&entity(json!({"id": 2, "name": "B", "tier": 2}))));
        assert!(!f.accepts(&entity(json!({"id": 3, "name": "C", "metadata": {"tier": 3}, "tier": 2}))));
    }

    #[test]
    fn equality_uses_membership_for_lists() {
        let e = entity(json!({"id": 1, "name": "A", "classes": ["tank", "raider"], "level": 3}));
        assert!(field_equals(&e, "classes", &json!("raider")));
        assert!(field_equals(&e, "level", &json!(3)));
        assert!(!field_equals(&e, "level", &json!("3")));
    }

    #[test]
    fn comparison_math() {
        let c = AttributeComparison::new("speed", 120.0, 100.0);
        assert_eq!(c.difference, 20.0);
        assert_eq!(c.percentage_of_b, 20.0);
        assert_eq!(c.winner, Winner::A);

        let c = AttributeComparison::new("cargo", 10.0, 30.0);
        assert_eq!(c.percentage_of_b, -66.7);
        assert_eq!(c.winner, Winner::B);

        let c = AttributeComparison::new("energy", 5.0, 0.0);
        assert_eq!(c.percentage_of_b, 0.0);

        let c = AttributeComparison::new("hull", 0.0, 0.0);
        assert_eq!(c.winner, Winner::Tie);
    }

    #[test]
    fn facet_keys() {
        assert_eq!(facet_key(Some(&json!("tank"))), "tank");
        assert_eq!(facet_key(Some(&json!(2))), "2");
        assert_eq!(facet_key(None), "unknown");
    }
}
