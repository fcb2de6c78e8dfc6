//! Orders, their status and the menu item snapshot they carry

use crate::core::error::{FieldValidationError, ValidationError};
use crate::core::field::{is_valid_mobile, non_blank, normalize_phone};
use crate::core::{Document, ids};
use crate::entities::lenient;
use crate::entities::menu_item::MenuItem;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Order lifecycle. Moves freely in both directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(ValidationError::InvalidStatus {
                value: other.to_string(),
            }),
        }
    }
}

/// Copy of a menu item's display fields taken when the order was placed
///
/// Never synced with the menu: editing or deleting the dish later leaves
/// existing orders untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemSnapshot {
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_float",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_vegetarian: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub spice_level: Option<i64>,
}

impl From<&MenuItem> for MenuItemSnapshot {
    fn from(item: &MenuItem) -> Self {
        MenuItemSnapshot {
            id: Some(item.id.clone()),
            name: Some(item.name.clone()),
            description: Some(item.description.clone()),
            price: Some(item.price),
            category: Some(item.category.clone()),
            image: Some(item.image.clone()),
            is_vegetarian: Some(item.is_vegetarian),
            spice_level: Some(item.spice_level),
        }
    }
}

fn default_quantity() -> i64 {
    1
}

/// A customer order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub menu_item: MenuItemSnapshot,
    pub customer_name: String,
    pub phone: String,
    pub room_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_quantity", deserialize_with = "lenient::int")]
    pub quantity: i64,
    #[serde(default)]
    pub special_instructions: String,
    pub total: f64,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: String,
}

impl Document for Order {
    fn collection_name() -> &'static str {
        "orders"
    }

    fn type_name() -> &'static str {
        "order"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Order {
    /// Validate a flat order submission and build the document to store
    ///
    /// Checks run in a fixed order: delivery location first, then the
    /// phone number, then the remaining required fields together.
    pub fn from_submission(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let room_number = non_blank(fields.get("roomNumber"))
            .or_else(|| non_blank(fields.get("address")))
            .ok_or_else(|| ValidationError::MissingField {
                field: "roomNumber".to_string(),
            })?;

        let raw_phone = match fields.get("phone") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let phone = normalize_phone(&raw_phone);
        if !is_valid_mobile(&phone) {
            return Err(ValidationError::InvalidPhone { value: raw_phone });
        }

        let mut errors = Vec::new();

        let customer_name = non_blank(fields.get("customerName"));
        if customer_name.is_none() {
            errors.push(required("customerName"));
        }

        let menu_item = match fields.get("menuItem") {
            Some(value @ Value::Object(_)) => {
                match serde_json::from_value::<MenuItemSnapshot>(value.clone()) {
                    Ok(snapshot) => Some(snapshot),
                    Err(e) => {
                        errors.push(FieldValidationError {
                            field: "menuItem".to_string(),
                            message: e.to_string(),
                        });
                        None
                    }
                }
            }
            _ => {
                errors.push(required("menuItem"));
                None
            }
        };

        let total = match fields.get("total") {
            None | Some(Value::Null) => {
                errors.push(required("total"));
                None
            }
            Some(value) => {
                let parsed = lenient::to_float(value);
                if parsed.is_none() {
                    errors.push(FieldValidationError {
                        field: "total".to_string(),
                        message: "total must be a number".to_string(),
                    });
                }
                parsed
            }
        };

        let status = match fields.get("status") {
            None | Some(Value::Null) => OrderStatus::default(),
            Some(Value::String(s)) => match s.parse::<OrderStatus>() {
                Ok(status) => status,
                Err(e) => {
                    errors.push(FieldValidationError {
                        field: "status".to_string(),
                        message: e.to_string(),
                    });
                    OrderStatus::default()
                }
            },
            Some(_) => {
                errors.push(FieldValidationError {
                    field: "status".to_string(),
                    message: "Invalid status".to_string(),
                });
                OrderStatus::default()
            }
        };

        let (Some(customer_name), Some(menu_item), Some(total)) = (customer_name, menu_item, total)
        else {
            return Err(ValidationError::FieldErrors(errors));
        };
        if !errors.is_empty() {
            return Err(ValidationError::FieldErrors(errors));
        }

        Ok(Order {
            id: non_blank(fields.get("id")).unwrap_or_else(ids::timestamp_id),
            menu_item,
            customer_name,
            phone,
            room_number,
            address: text(fields, "address"),
            quantity: fields
                .get("quantity")
                .and_then(lenient::to_int)
                .unwrap_or_else(default_quantity),
            special_instructions: text(fields, "specialInstructions"),
            total,
            status,
            created_at: non_blank(fields.get("createdAt"))
                .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        })
    }
}

fn required(field: &str) -> FieldValidationError {
    FieldValidationError {
        field: field.to_string(),
        message: format!("{field} is required"),
    }
}

fn text(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}
