//! Logistics line item owned by one event.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable logistics identifier.
pub type LogisticsId = Uuid;

/// Reservable resource line item (price x quantity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logistics {
    pub id: LogisticsId,
    pub description: String,
    /// Only reserved items are listed by date queries and counted in costs.
    pub reserved: bool,
    pub unit_price: f64,
    pub quantity: i32,
}

impl Logistics {
    /// Creates an unreserved line item with a generated stable ID.
    pub fn new(description: impl Into<String>, unit_price: f64, quantity: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            reserved: false,
            unit_price,
            quantity,
        }
    }

    /// Builder-style helper to set the reserved flag.
    pub fn reserved(mut self, reserved: bool) -> Self {
        self.reserved = reserved;
        self
    }

    /// `unit_price * quantity`.
    pub fn line_cost(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }

    /// Validates price and quantity before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.unit_price.is_finite() || self.unit_price < 0.0 {
            return Err(ValidationError::InvalidUnitPrice(self.unit_price));
        }
        if self.quantity < 0 {
            return Err(ValidationError::NegativeQuantity(self.quantity));
        }
        Ok(())
    }
}
