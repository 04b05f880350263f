//! Structural check for untrusted save documents.
//!
//! Only the top level is inspected: required fields must exist with the right
//! coarse JSON type, and the five `gameState` scalars must be present. Element
//! records inside `habits` and `completions` are not looked at, and value
//! ranges are not enforced (negative coins pass).

use serde_json::{Map, Value};

/// First structural problem found in a candidate save
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveShapeError {
    #[error("save must be a JSON object")]
    NotAnObject,
    #[error("`{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// Top-level fields in the order they are checked
const TOP_LEVEL_FIELDS: [(&str, JsonKind); 7] = [
    ("version", JsonKind::Number),
    ("exportedAt", JsonKind::String),
    ("gameState", JsonKind::Object),
    ("habits", JsonKind::Array),
    ("completions", JsonKind::Array),
    ("purchasedUpgrades", JsonKind::Array),
    ("claimedStreakRewards", JsonKind::Object),
];

const GAME_STATE_FIELDS: [(&str, JsonKind); 5] = [
    ("gameState.coins", JsonKind::Number),
    ("gameState.lifetimeCoins", JsonKind::Number),
    ("gameState.clientsSeen", JsonKind::Number),
    ("gameState.lastIdleTick", JsonKind::String),
    ("gameState.createdAt", JsonKind::String),
];

#[derive(Debug, Clone, Copy)]
enum JsonKind {
    Number,
    String,
    Object,
    Array,
}

impl JsonKind {
    fn matches(self, value: Option<&Value>) -> bool {
        match (self, value) {
            (JsonKind::Number, Some(v)) => v.is_number(),
            (JsonKind::String, Some(v)) => v.is_string(),
            (JsonKind::Object, Some(v)) => v.is_object(),
            (JsonKind::Array, Some(v)) => v.is_array(),
            (_, None) => false,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            JsonKind::Number => "a number",
            JsonKind::String => "a string",
            JsonKind::Object => "an object",
            JsonKind::Array => "an array",
        }
    }
}

fn check_fields(
    object: &Map<String, Value>,
    fields: &[(&'static str, JsonKind)],
) -> Result<(), SaveShapeError> {
    for &(field, kind) in fields {
        let key = field.rsplit('.').next().unwrap_or(field);
        if !kind.matches(object.get(key)) {
            return Err(SaveShapeError::WrongType {
                field,
                expected: kind.describe(),
            });
        }
    }
    Ok(())
}

/// Check a candidate save's shape, reporting the first problem found
pub fn check_save_shape(candidate: &Value) -> Result<(), SaveShapeError> {
    let save = candidate.as_object().ok_or(SaveShapeError::NotAnObject)?;
    check_fields(save, &TOP_LEVEL_FIELDS)?;

    let game_state = save
        .get("gameState")
        .and_then(Value::as_object)
        .ok_or(SaveShapeError::WrongType {
            field: "gameState",
            expected: "an object",
        })?;
    check_fields(game_state, &GAME_STATE_FIELDS)
}

/// True when `candidate` has the coarse shape of a save document
pub fn validate_save(candidate: &Value) -> bool {
    check_save_shape(candidate).is_ok()
}
