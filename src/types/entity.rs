//! Canonical entity identifiers

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier of a tracked participant (car / driver number).
///
/// Providers are inconsistent about whether ids arrive as numbers or strings,
/// so every raw id goes through [`EntityId::from_value`] once, at
/// normalization time. `7`, `7.0`, `"7"` and `" 7 "` are the same entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Create an entity id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw numeric id.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Canonicalize a raw JSON id.
    ///
    /// Returns `None` for negative, fractional, non-numeric, boolean or null ids.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => {
                if let Some(id) = number.as_u64() {
                    u32::try_from(id).ok().map(Self)
                } else {
                    number.as_f64().and_then(Self::from_integral_f64)
                }
            }
            Value::String(raw) => {
                let raw = raw.trim();
                raw.parse::<u32>()
                    .ok()
                    .map(Self)
                    .or_else(|| raw.parse::<f64>().ok().and_then(Self::from_integral_f64))
            }
            _ => None,
        }
    }

    fn from_integral_f64(value: f64) -> Option<Self> {
        if value.is_finite() && value.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&value) {
            Some(Self(value as u32))
        } else {
            None
        }
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mixed_representations_canonicalize_to_one_id() {
        let expected = Some(EntityId::new(7));
        assert_eq!(EntityId::from_value(&json!(7)), expected);
        assert_eq!(EntityId::from_value(&json!(7.0)), expected);
        assert_eq!(EntityId::from_value(&json!("7")), expected);
        assert_eq!(EntityId::from_value(&json!(" 7 ")), expected);
        assert_eq!(EntityId::from_value(&json!("7.0")), expected);
    }

    #[test]
    fn rejects_non_integer_ids() {
        assert_eq!(EntityId::from_value(&json!(-1)), None);
        assert_eq!(EntityId::from_value(&json!(7.5)), None);
        assert_eq!(EntityId::from_value(&json!("VER")), None);
        assert_eq!(EntityId::from_value(&json!("")), None);
        assert_eq!(EntityId::from_value(&json!(null)), None);
        assert_eq!(EntityId::from_value(&json!(true)), None);
        assert_eq!(EntityId::from_value(&json!(u64::from(u32::MAX) + 1)), None);
    }

    #[test]
    fn serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&EntityId::new(44)).unwrap(), "44");
    }
}
