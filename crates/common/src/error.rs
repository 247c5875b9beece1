use crate::types::RecordId;

/// Recoverable rejections of an inventory operation.
///
/// Whenever one of these is returned the inventory is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("record id {0} already exists")]
    DuplicateId(RecordId),
    #[error("record id {0} not found")]
    NotFound(RecordId),
    #[error("negative quantity {quantity} for record {id}")]
    NegativeQuantity { id: RecordId, quantity: i32 },
    #[error("unit price of record {id} is not a finite number")]
    NonFinitePrice { id: RecordId },
}
