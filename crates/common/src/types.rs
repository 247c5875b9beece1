use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identifier of an inventory record. Unique within an inventory.
pub type RecordId = i32;

/// One inventory line item: identifier, name, quantity on hand, unit price.
///
/// Fields are read-only after construction. The only mutation is
/// [`Record::set_quantity`], which refuses negative values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    name: String,
    quantity: i32,
    unit_price: f64,
}

impl Record {
    /// Build a record. No validation happens here; the inventory enforces its
    /// own invariants when the record is inserted.
    pub fn new(id: RecordId, name: impl Into<String>, quantity: i32, unit_price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            quantity,
            unit_price,
        }
    }

    /// Unique identifier of this record.
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Display name, free-form UTF-8.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Units on hand.
    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    /// Price of a single unit.
    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }

    /// Replace the quantity on hand. Negative quantities are rejected and leave
    /// the record untouched.
    pub fn set_quantity(&mut self, quantity: i32) -> Result<(), ValidationError> {
        if quantity < 0 {
            return Err(ValidationError::NegativeQuantity {
                id: self.id,
                quantity,
            });
        }
        self.quantity = quantity;
        Ok(())
    }

    /// Stock value of this line: quantity times unit price.
    pub fn value(&self) -> f64 {
        f64::from(self.quantity) * self.unit_price
    }

    /// Check the invariants a record must satisfy to live in an inventory.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.quantity < 0 {
            return Err(ValidationError::NegativeQuantity {
                id: self.id,
                quantity: self.quantity,
            });
        }
        if !self.unit_price.is_finite() {
            return Err(ValidationError::NonFinitePrice { id: self.id });
        }
        Ok(())
    }
}
