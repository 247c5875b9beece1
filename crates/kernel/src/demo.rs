use stockledger_common::{Record, ValidationError};

use crate::event::LedgerEvent;
use crate::inventory::Inventory;

/// The fixed starter dataset used when no persisted data is available.
pub fn demo_records() -> Vec<Record> {
    vec![
        Record::new(1, "Surub M6", 120, 0.15),
        Record::new(2, "Motor 5kW", 2, 12500.0),
        Record::new(3, "Cablu YKY", 4, 12.5),
        Record::new(4, "Invertor", 1, 22000.0),
    ]
}

/// Add the demo dataset to `inventory` and make the result the only history
/// baseline, so the seeding itself cannot be undone.
pub fn seed_demo(inventory: &mut Inventory) -> Result<(), ValidationError> {
    for record in demo_records() {
        inventory.add(record)?;
    }
    inventory.reset_history();
    inventory.record_event(&LedgerEvent::DemoSeeded {
        count: inventory.len(),
    });
    Ok(())
}
