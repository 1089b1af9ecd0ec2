//! Ship shapes and normalization.
//!
//! Remote ship documents may carry either the legacy flat shape (`type`, `hull`,
//! `credits`, per-kind slot counts) or the nested shape written by the admin surface.
//! The nested shape is recognised by an `armors` array; everything else is a legacy
//! ship and is reshaped by [`normalize_ship`]. Normalizing twice is a no-op.

use crate::entity::Entity;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Field whose presence (as an array) marks a ship as already normalized.
pub const ARMOR_LIST_FIELD: &str = "armors";

const DEFAULT_LEVEL: i64 = 1;
const DEFAULT_SYSTEM: &str = "sol";
const DEFAULT_TIER: i64 = 1;
const DEFAULT_CLASS: &str = "Unknown";
const DEFAULT_OBTAIN_METHOD: &str = "tienda";

/// Accepts integers, floats (truncated) and numeric strings; anything else becomes 0.
fn de_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map(|f| f as i64).unwrap_or(0),
        _ => 0,
    })
}

/// Accepts strings; `null` and other kinds become empty.
fn de_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn de_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        _ => false,
    })
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn or_default_int(value: i64, default: i64) -> i64 {
    if value == 0 {
        default
    } else {
        value
    }
}

fn or_default_str(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// Flat ship shape found in older static documents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyShip {
    #[serde(default)]
    pub id: Value,
    #[serde(default, deserialize_with = "de_string")]
    pub name: String,
    #[serde(default, rename = "type", deserialize_with = "de_string")]
    pub ship_type: String,
    #[serde(default, deserialize_with = "de_int")]
    pub level: i64,
    #[serde(default, deserialize_with = "de_string")]
    pub system: String,
    #[serde(default, deserialize_with = "de_int")]
    pub hull: i64,
    #[serde(default, deserialize_with = "de_int")]
    pub speed: i64,
    #[serde(default, deserialize_with = "de_int")]
    pub weapon_slots: i64,
    #[serde(default, deserialize_with = "de_int")]
    pub shield_slots: i64,
    #[serde(default, deserialize_with = "de_int")]
    pub engine_slots: i64,
    #[serde(default, deserialize_with = "de_int")]
    pub special_slots: i64,
    #[serde(default, deserialize_with = "de_int")]
    pub credits: i64,
    #[serde(default, deserialize_with = "de_string")]
    pub blueprint: String,
    #[serde(default, deserialize_with = "de_string")]
    pub image_url: String,
    #[serde(default, deserialize_with = "de_string")]
    pub description: String,
    #[serde(default, deserialize_with = "de_int")]
    pub tier: i64,
    #[serde(default, deserialize_with = "de_string")]
    pub class: String,
    #[serde(default, deserialize_with = "de_bool")]
    pub featured: bool,
    #[serde(default, deserialize_with = "de_bool")]
    pub popular: bool,
    #[serde(default, deserialize_with = "de_bool")]
    pub is_hybrid: bool,
    #[serde(default, deserialize_with = "de_bool")]
    pub is_special: bool,
}

/// Armor option in the nested shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Armor {
    #[serde(default, deserialize_with = "de_string")]
    pub name: String,
    #[serde(default, deserialize_with = "de_int")]
    pub price: i64,
    #[serde(default, deserialize_with = "de_int")]
    pub sell_price: i64,
}

/// Purchasable cortex or drone slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotPrice {
    #[serde(default, deserialize_with = "de_int")]
    pub slot: i64,
    #[serde(default, deserialize_with = "de_int")]
    pub buy_price: i64,
    #[serde(default, deserialize_with = "de_int")]
    pub sell_price: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipMetadata {
    #[serde(default, deserialize_with = "de_int")]
    pub tier: i64,
    #[serde(default, deserialize_with = "de_string")]
    pub class: String,
    #[serde(default, deserialize_with = "de_bool")]
    pub featured: bool,
    #[serde(default, deserialize_with = "de_bool")]
    pub popular: bool,
    #[serde(default, deserialize_with = "de_bool")]
    pub is_hybrid: bool,
    #[serde(default, deserialize_with = "de_bool")]
    pub is_special: bool,
    #[serde(default, deserialize_with = "de_bool", skip_serializing_if = "is_false")]
    pub is_elite: bool,
    #[serde(default, deserialize_with = "de_string")]
    pub created_at: String,
}

/// Nested ship shape used by the override store and by normalized remote data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedShip {
    #[serde(default)]
    pub id: Value,
    #[serde(default, deserialize_with = "de_string")]
    pub name: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default, deserialize_with = "de_int")]
    pub level: i64,
    #[serde(default, deserialize_with = "de_string")]
    pub system: String,

    #[serde(default, deserialize_with = "de_int")]
    pub armor_index: i64,
    #[serde(default, deserialize_with = "de_int")]
    pub speed: i64,
    #[serde(default, deserialize_with = "de_int")]
    pub performance: i64,

    #[serde(default)]
    pub armors: Vec<Armor>,
    #[serde(default, deserialize_with = "de_int")]
    pub component_slots: i64,
    /// Per-kind counts folded into `component_slots`, kept for comparisons.
    #[serde(default, deserialize_with = "de_int")]
    pub weapon_slots: i64,
    #[serde(default, deserialize_with = "de_int")]
    pub shield_slots: i64,
    #[serde(default)]
    pub slot_components: Vec<Value>,

    #[serde(default, deserialize_with = "de_int")]
    pub crionita: i64,
    #[serde(default, deserialize_with = "de_int")]
    pub oro: i64,
    #[serde(default, deserialize_with = "de_int")]
    pub sell_price: i64,

    #[serde(default)]
    pub cortex_slots: Vec<SlotPrice>,
    #[serde(default)]
    pub drone_slots: Vec<SlotPrice>,

    #[serde(default, deserialize_with = "de_int")]
    pub paint_cost: i64,
    #[serde(default, deserialize_with = "de_int")]
    pub rename_cost: i64,

    #[serde(default, deserialize_with = "de_string")]
    pub obtain_method: String,
    #[serde(default, deserialize_with = "de_string")]
    pub obtain_location: String,
    #[serde(default, deserialize_with = "de_int")]
    pub blueprints_required: i64,
    #[serde(default)]
    pub requirements: Vec<Value>,

    #[serde(default, rename = "image2D")]
    pub image_2d: Option<String>,
    #[serde(default, rename = "model3D")]
    pub model_3d: Option<String>,
    #[serde(default, deserialize_with = "de_string")]
    pub description: String,
    #[serde(default, deserialize_with = "de_string")]
    pub lore: String,

    #[serde(default)]
    pub metadata: ShipMetadata,
}

impl NormalizedShip {
    /// Typed view of a resolved ship entity. Missing or malformed fields take defaults.
    pub fn from_entity(entity: &Entity) -> Self {
        serde_json::from_value(entity.clone().into_value()).unwrap_or_else(|e| {
            tracing::debug!(target: "codex::ship", error = %e, "Ship entity did not fit nested shape");
            Self::default()
        })
    }
}

impl From<LegacyShip> for NormalizedShip {
    fn from(ship: LegacyShip) -> Self {
        let classes = if ship.ship_type.is_empty() {
            Vec::new()
        } else {
            vec![ship.ship_type]
        };
        let component_slots = [ship.engine_slots, ship.special_slots]
            .into_iter()
            .fold(ship.weapon_slots.saturating_add(ship.shield_slots), i64::saturating_add);
        let image_2d = Some(ship.image_url).filter(|s| !s.is_empty());

        Self {
            id: ship.id,
            name: ship.name,
            classes,
            level: or_default_int(ship.level, DEFAULT_LEVEL),
            system: or_default_str(ship.system, DEFAULT_SYSTEM),
            armor_index: ship.hull,
            speed: ship.speed,
            performance: 0,
            armors: Vec::new(),
            component_slots,
            weapon_slots: ship.weapon_slots,
            shield_slots: ship.shield_slots,
            slot_components: Vec::new(),
            crionita: ship.credits,
            oro: 0,
            sell_price: ship.credits.div_euclid(2),
            cortex_slots: Vec::new(),
            drone_slots: Vec::new(),
            paint_cost: 0,
            rename_cost: 0,
            obtain_method: DEFAULT_OBTAIN_METHOD.to_string(),
            obtain_location: ship.blueprint,
            blueprints_required: 0,
            requirements: Vec::new(),
            image_2d,
            model_3d: None,
            description: ship.description,
            lore: String::new(),
            metadata: ShipMetadata {
                tier: or_default_int(ship.tier, DEFAULT_TIER),
                class: or_default_str(ship.class, DEFAULT_CLASS),
                featured: ship.featured,
                popular: ship.popular,
                is_hybrid: ship.is_hybrid,
                is_special: ship.is_special,
                is_elite: false,
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        }
    }
}

/// A raw remote ship, discriminated by the armor-list field.
#[derive(Debug, Clone)]
pub enum ShipRecord {
    Legacy(LegacyShip),
    /// Already in the nested shape; kept verbatim so unknown fields survive.
    Normalized(Value),
}

impl ShipRecord {
    pub fn classify(raw: Value) -> Result<Self, serde_json::Error> {
        if is_normalized(&raw) {
            return Ok(Self::Normalized(raw));
        }
        serde_json::from_value(raw).map(Self::Legacy)
    }

    pub fn into_normalized(self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Normalized(v) => Ok(v),
            Self::Legacy(ship) => serde_json::to_value(NormalizedShip::from(ship)),
        }
    }
}

/// True when `raw` already carries an armor list.
pub fn is_normalized(raw: &Value) -> bool {
    raw.get(ARMOR_LIST_FIELD).map(Value::is_array).unwrap_or(false)
}

/// Reshapes one raw ship into the nested shape. Items that cannot be read as a
/// legacy ship are passed through unchanged.
pub fn normalize_ship(raw: Value) -> Value {
    let fallback = raw.clone();
    match ShipRecord::classify(raw).and_then(ShipRecord::into_normalized) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(target: "codex::ship", error = %e, "Ship could not be normalized; keeping raw item");
            fallback
        }
    }
}

pub fn normalize_ships(raw: Vec<Value>) -> Vec<Value> {
    raw.into_iter().map(normalize_ship).collect()
}
