//! Menu item model and form coercion

use crate::core::error::{FieldValidationError, ValidationError};
use crate::core::field::{non_blank, parse_flag};
use crate::core::{Document, ids};
use crate::entities::lenient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A dish on the menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub image_public_id: String,
    #[serde(default)]
    pub is_vegetarian: bool,
    #[serde(default, deserialize_with = "lenient::int")]
    pub spice_level: i64,
}

impl Document for MenuItem {
    fn collection_name() -> &'static str {
        "menuitems"
    }

    fn type_name() -> &'static str {
        "menu item"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Keys that clients may send but that never reach the stored document
const IGNORED_KEYS: [&str; 2] = ["_id", "__v"];

impl MenuItem {
    /// Build a menu item from submitted form or JSON fields
    ///
    /// Form values arrive as strings, so `price`, `spiceLevel` and
    /// `isVegetarian` are coerced. A missing id gets a timestamp id.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut errors = Vec::new();

        let name = non_blank(fields.get("name"));
        if name.is_none() {
            errors.push(field_error("name", "name is required"));
        }

        let price = match fields.get("price") {
            None | Some(Value::Null) => {
                errors.push(field_error("price", "price is required"));
                None
            }
            Some(value) => {
                let parsed = lenient::to_float(value);
                if parsed.is_none() {
                    errors.push(field_error("price", "price must be a number"));
                }
                parsed
            }
        };

        let spice_level = match fields.get("spiceLevel") {
            None | Some(Value::Null) => 0,
            Some(Value::String(s)) if s.trim().is_empty() => 0,
            Some(value) => match lenient::to_int(value) {
                Some(level) => level,
                None => {
                    errors.push(field_error("spiceLevel", "spiceLevel must be a number"));
                    0
                }
            },
        };

        let (Some(name), Some(price)) = (name, price) else {
            return Err(ValidationError::FieldErrors(errors));
        };
        if !errors.is_empty() {
            return Err(ValidationError::FieldErrors(errors));
        }

        Ok(MenuItem {
            id: non_blank(fields.get("id")).unwrap_or_else(ids::timestamp_id),
            name,
            description: text(fields, "description"),
            price,
            category: text(fields, "category"),
            image: text(fields, "image"),
            image_public_id: text(fields, "imagePublicId"),
            is_vegetarian: fields.get("isVegetarian").is_some_and(parse_flag),
            spice_level,
        })
    }

    /// Apply a replacement body over this item
    ///
    /// Fields in `body` win over the stored ones. The id always stays the
    /// stored id.
    pub fn merged_with(&self, body: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut fields = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for (key, value) in body {
            if key == "id" || IGNORED_KEYS.contains(&key.as_str()) {
                continue;
            }
            fields.insert(key.clone(), value.clone());
        }
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        Self::from_fields(&fields)
    }
}

fn field_error(field: &str, message: &str) -> FieldValidationError {
    FieldValidationError {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn text(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
