use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use stockledger_common::{Record, RecordId, ValidationError};

use crate::event::{LedgerEvent, NoopObserver, Observer, SortKey};
use crate::history::History;

/// Default threshold for [`Inventory::low_stock`].
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;

/// Default price floor for [`Inventory::expensive`].
pub const DEFAULT_EXPENSIVE_FLOOR: f64 = 10_000.0;

/// The authoritative inventory state.
///
/// Records are kept in insertion order and ids are unique. Every mutation is
/// validated first, then checkpointed into the [`History`], then applied, then
/// reported to the observer. Queries return fresh vectors and never touch the
/// live sequence.
pub struct Inventory {
    records: Vec<Record>,
    history: History,
    observer: Box<dyn Observer>,
}

impl Inventory {
    /// Create an empty inventory that reports to nobody.
    pub fn new() -> Self {
        Self::with_observer(NoopObserver)
    }

    /// Create an empty inventory reporting events to `observer`.
    pub fn with_observer(observer: impl Observer + 'static) -> Self {
        Self {
            records: Vec::new(),
            history: History::new(),
            observer: Box::new(observer),
        }
    }

    /// Swap the observer for a new one.
    pub fn set_observer(&mut self, observer: impl Observer + 'static) {
        self.observer = Box::new(observer);
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the inventory holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read-only view of all records in insertion order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Iterate over records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Look up a record by id.
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Whether a record with `id` is present.
    pub fn exists(&self, id: RecordId) -> bool {
        self.get(id).is_some()
    }

    /// Undo/redo history backing this inventory.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Append a record. Rejects duplicate ids, negative quantities and
    /// non-finite prices without touching state.
    pub fn add(&mut self, record: Record) -> Result<(), ValidationError> {
        if self.exists(record.id()) {
            return Err(ValidationError::DuplicateId(record.id()));
        }
        record.validate()?;

        self.history.checkpoint(&self.records);
        let event = LedgerEvent::Added {
            id: record.id(),
            name: record.name().to_string(),
            quantity: record.quantity(),
            unit_price: record.unit_price(),
        };
        self.records.push(record);
        self.emit(&event);
        Ok(())
    }

    /// Remove every record carrying `id` (at most one while the uniqueness
    /// invariant holds).
    pub fn remove(&mut self, id: RecordId) -> Result<(), ValidationError> {
        if !self.exists(id) {
            return Err(ValidationError::NotFound(id));
        }
        self.history.checkpoint(&self.records);
        self.records.retain(|r| r.id() != id);
        self.emit(&LedgerEvent::Removed { id });
        Ok(())
    }

    /// Set the quantity on hand of record `id`.
    ///
    /// A negative quantity is rejected before any checkpoint is taken.
    pub fn update_quantity(&mut self, id: RecordId, quantity: i32) -> Result<(), ValidationError> {
        let index = self
            .records
            .iter()
            .position(|r| r.id() == id)
            .ok_or(ValidationError::NotFound(id))?;
        if quantity < 0 {
            return Err(ValidationError::NegativeQuantity { id, quantity });
        }

        self.history.checkpoint(&self.records);
        self.records[index].set_quantity(quantity)?;
        self.emit(&LedgerEvent::QuantityUpdated { id, quantity });
        Ok(())
    }

    /// Apply a batch of records in one step.
    ///
    /// The whole batch is validated up front against the target contents (empty
    /// when `replace_existing` is set) and against itself. On any failure
    /// nothing is applied and no checkpoint is taken. On success a single
    /// checkpoint covers the whole batch, so one undo reverts it.
    pub fn import_bulk(
        &mut self,
        records: Vec<Record>,
        replace_existing: bool,
    ) -> Result<usize, ValidationError> {
        let mut taken: HashSet<RecordId> = if replace_existing {
            HashSet::new()
        } else {
            self.records.iter().map(Record::id).collect()
        };
        for record in &records {
            if !taken.insert(record.id()) {
                return Err(ValidationError::DuplicateId(record.id()));
            }
            record.validate()?;
        }

        self.history.checkpoint(&self.records);
        if replace_existing {
            self.records.clear();
        }
        let count = records.len();
        self.records.extend(records);
        tracing::info!(count, replace_existing, "bulk import applied");
        self.emit(&LedgerEvent::Imported {
            count,
            replaced: replace_existing,
        });
        Ok(count)
    }

    /// Restore the state before the last mutation. Returns `false` when there
    /// is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo(&self.records) else {
            return false;
        };
        self.records = previous;
        self.emit(&LedgerEvent::Undone);
        true
    }

    /// Re-apply the last undone state. Returns `false` when there is nothing
    /// to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo(&self.records) else {
            return false;
        };
        self.records = next;
        self.emit(&LedgerEvent::Redone);
        true
    }

    /// Replace all contents with freshly loaded records and make them the
    /// sole history baseline.
    ///
    /// The caller is responsible for the records satisfying the inventory
    /// invariants (the persistence layer checks ids before calling this).
    pub fn replace_loaded(&mut self, records: Vec<Record>) {
        self.records = records;
        self.reset_history();
    }

    /// Empty the inventory without recording history. Used before a load.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Forget all history and push the current state as the only baseline.
    pub fn reset_history(&mut self) {
        self.history.reset(&self.records);
    }

    /// Records with quantity at or below `threshold`, in original order.
    pub fn low_stock(&self, threshold: i32) -> Vec<Record> {
        let out = self.filtered(|r| r.quantity() <= threshold);
        self.emit(&LedgerEvent::LowStockQueried { threshold });
        out
    }

    /// Records with zero quantity, in original order.
    pub fn out_of_stock(&self) -> Vec<Record> {
        let out = self.filtered(|r| r.quantity() == 0);
        self.emit(&LedgerEvent::OutOfStockQueried);
        out
    }

    /// Records priced strictly above `floor`, in original order.
    pub fn expensive(&self, floor: f64) -> Vec<Record> {
        let out = self.filtered(|r| r.unit_price() > floor);
        self.emit(&LedgerEvent::ExpensiveQueried { floor });
        out
    }

    /// Case-insensitive substring search on the name. An empty query matches
    /// everything.
    pub fn search(&self, query: &str) -> Vec<Record> {
        let needle = query.to_lowercase();
        let out = self.filtered(|r| r.name().to_lowercase().contains(&needle));
        self.emit(&LedgerEvent::Searched {
            query: query.to_string(),
        });
        out
    }

    /// Copy of the records ordered by unit price. Stable: equal prices keep
    /// their original relative order.
    pub fn sort_by_price(&self, ascending: bool) -> Vec<Record> {
        let mut out = self.records.clone();
        // -0.0 and 0.0 must tie; stored prices are never NaN
        if ascending {
            out.sort_by(|a, b| price_order(a, b));
        } else {
            out.sort_by(|a, b| price_order(b, a));
        }
        self.emit(&LedgerEvent::Sorted {
            key: SortKey::Price,
            ascending,
        });
        out
    }

    /// Copy of the records ordered by quantity. Stable like
    /// [`Inventory::sort_by_price`].
    pub fn sort_by_quantity(&self, ascending: bool) -> Vec<Record> {
        let mut out = self.records.clone();
        if ascending {
            out.sort_by_key(Record::quantity);
        } else {
            out.sort_by(|a, b| b.quantity().cmp(&a.quantity()));
        }
        self.emit(&LedgerEvent::Sorted {
            key: SortKey::Quantity,
            ascending,
        });
        out
    }

    /// Sum of every record's stock value.
    pub fn total_value(&self) -> f64 {
        let total: f64 = self.records.iter().map(Record::value).sum();
        self.emit(&LedgerEvent::TotalValueComputed { total });
        total
    }

    /// Report an event raised outside the inventory (load, save, export).
    pub fn record_event(&self, event: &LedgerEvent) {
        self.emit(event);
    }

    fn filtered(&self, keep: impl Fn(&Record) -> bool) -> Vec<Record> {
        self.records.iter().filter(|r| keep(r)).cloned().collect()
    }

    fn emit(&self, event: &LedgerEvent) {
        if let Err(e) = self.observer.notify(event) {
            tracing::warn!(error = %e, %event, "observer failed; operation kept");
        }
    }
}

fn price_order(a: &Record, b: &Record) -> Ordering {
    a.unit_price()
        .partial_cmp(&b.unit_price())
        .unwrap_or(Ordering::Equal)
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inventory")
            .field("records", &self.records)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ObserverError;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<LedgerEvent>>);

    impl Observer for Recorder {
        fn notify(&self, event: &LedgerEvent) -> Result<(), ObserverError> {
            self.0.borrow_mut().push(event.clone());
            Ok(())
        }
    }

    struct Broken;

    impl Observer for Broken {
        fn notify(&self, _event: &LedgerEvent) -> Result<(), ObserverError> {
            Err(ObserverError::Io(std::io::Error::other("disk full")))
        }
    }

    fn demo() -> Inventory {
        let mut inv = Inventory::new();
        inv.add(Record::new(1, "Surub M6", 120, 0.15)).unwrap();
        inv.add(Record::new(2, "Motor 5kW", 2, 12500.0)).unwrap();
        inv.add(Record::new(3, "Cablu YKY", 4, 12.5)).unwrap();
        inv.add(Record::new(4, "Invertor", 1, 22000.0)).unwrap();
        inv
    }

    fn ids(records: &[Record]) -> Vec<RecordId> {
        records.iter().map(Record::id).collect()
    }

    #[test]
    fn add_and_exists() {
        let mut inv = Inventory::new();
        assert!(!inv.exists(1));
        inv.add(Record::new(1, "A", 1, 1.0)).unwrap();
        assert!(inv.exists(1));
        assert_eq!(inv.len(), 1);
    }

    #[test]
    fn duplicate_add_is_rejected_and_unchanged() {
        let mut inv = demo();
        let before = inv.records().to_vec();
        let depth = inv.history().undo_depth();

        let err = inv.add(Record::new(2, "Other", 9, 9.0)).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateId(2));
        assert_eq!(inv.records(), before.as_slice());
        assert_eq!(inv.history().undo_depth(), depth);
    }

    #[test]
    fn add_rejects_negative_quantity_and_nan_price() {
        let mut inv = Inventory::new();
        assert!(matches!(
            inv.add(Record::new(1, "A", -3, 1.0)),
            Err(ValidationError::NegativeQuantity { id: 1, quantity: -3 })
        ));
        assert!(matches!(
            inv.add(Record::new(1, "A", 3, f64::INFINITY)),
            Err(ValidationError::NonFinitePrice { id: 1 })
        ));
        assert!(inv.is_empty());
        assert!(!inv.history().can_undo());
    }

    #[test]
    fn remove_missing_is_not_found() {
        let mut inv = demo();
        assert_eq!(inv.remove(42), Err(ValidationError::NotFound(42)));
        assert_eq!(inv.len(), 4);
    }

    #[test]
    fn membership_tracks_mutations() {
        let mut inv = demo();
        inv.remove(2).unwrap();
        assert!(!inv.exists(2));
        inv.update_quantity(3, 10).unwrap();
        assert!(inv.exists(3));
        inv.add(Record::new(2, "Motor 7kW", 1, 15000.0)).unwrap();
        assert!(inv.exists(2));
        assert_eq!(ids(inv.records()), vec![1, 3, 4, 2]);
    }

    #[test]
    fn update_quantity_negative_leaves_state_and_history() {
        let mut inv = demo();
        let before = inv.records().to_vec();
        let depth = inv.history().undo_depth();

        let err = inv.update_quantity(1, -5).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NegativeQuantity {
                id: 1,
                quantity: -5
            }
        );
        assert_eq!(inv.records(), before.as_slice());
        assert_eq!(inv.history().undo_depth(), depth);
    }

    #[test]
    fn update_quantity_missing_is_not_found() {
        let mut inv = demo();
        assert_eq!(inv.update_quantity(99, 1), Err(ValidationError::NotFound(99)));
    }

    #[test]
    fn undo_restores_pre_add_and_redo_reapplies() {
        let mut inv = demo();
        let before = inv.records().to_vec();

        inv.add(Record::new(5, "Releu", 7, 45.0)).unwrap();
        let after = inv.records().to_vec();

        assert!(inv.undo());
        assert_eq!(inv.records(), before.as_slice());
        assert!(inv.redo());
        assert_eq!(inv.records(), after.as_slice());
        assert!(!inv.redo());
    }

    #[test]
    fn mutation_after_undo_discards_redo() {
        let mut inv = demo();
        inv.remove(1).unwrap();
        inv.undo();
        inv.update_quantity(2, 0).unwrap();
        assert!(!inv.redo());
        assert_eq!(inv.get(1).map(Record::quantity), Some(120));
    }

    #[test]
    fn history_bound_makes_oldest_state_unreachable() {
        let mut inv = Inventory::new();
        inv.reset_history();
        for id in 1..=21 {
            inv.add(Record::new(id, format!("item {id}"), id, 1.0)).unwrap();
        }
        let mut undos = 0;
        while inv.undo() {
            undos += 1;
        }
        assert_eq!(undos, 20);
        // the empty starting state is gone; the earliest reachable has one record
        assert_eq!(ids(inv.records()), vec![1]);
    }

    #[test]
    fn low_stock_keeps_order() {
        let mut inv = Inventory::new();
        for (id, q) in [(1, 0), (2, 2), (3, 4), (4, 5), (5, 120)] {
            inv.add(Record::new(id, "x", q, 1.0)).unwrap();
        }
        assert_eq!(ids(&inv.low_stock(4)), vec![1, 2, 3]);
        assert_eq!(ids(&inv.low_stock(DEFAULT_LOW_STOCK_THRESHOLD)), vec![1, 2, 3, 4]);
        assert_eq!(ids(&inv.out_of_stock()), vec![1]);
    }

    #[test]
    fn expensive_is_strictly_above_floor() {
        let mut inv = demo();
        inv.add(Record::new(9, "Exact", 1, 10_000.0)).unwrap();
        assert_eq!(ids(&inv.expensive(DEFAULT_EXPENSIVE_FLOOR)), vec![2, 4]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let mut inv = Inventory::new();
        inv.add(Record::new(1, "Surub M6", 1, 1.0)).unwrap();
        inv.add(Record::new(2, "Motor 5kW", 1, 1.0)).unwrap();

        assert_eq!(ids(&inv.search("motor")), vec![2]);
        assert_eq!(ids(&inv.search("MOTOR")), vec![2]);
        assert_eq!(ids(&inv.search("")), vec![1, 2]);
        assert!(inv.search("pompa").is_empty());
    }

    #[test]
    fn sort_by_price_descending() {
        let inv = demo();
        let prices: Vec<f64> = inv
            .sort_by_price(false)
            .iter()
            .map(Record::unit_price)
            .collect();
        assert_eq!(prices, vec![22000.0, 12500.0, 12.5, 0.15]);
        // live order untouched
        assert_eq!(ids(inv.records()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn sorts_are_stable() {
        let mut inv = Inventory::new();
        inv.add(Record::new(1, "a", 5, 2.0)).unwrap();
        inv.add(Record::new(2, "b", 1, 1.0)).unwrap();
        inv.add(Record::new(3, "c", 5, 2.0)).unwrap();
        inv.add(Record::new(4, "d", 1, 1.0)).unwrap();

        assert_eq!(ids(&inv.sort_by_price(true)), vec![2, 4, 1, 3]);
        assert_eq!(ids(&inv.sort_by_price(false)), vec![1, 3, 2, 4]);
        assert_eq!(ids(&inv.sort_by_quantity(true)), vec![2, 4, 1, 3]);
        assert_eq!(ids(&inv.sort_by_quantity(false)), vec![1, 3, 2, 4]);
    }

    #[test]
    fn signed_zero_prices_tie_in_price_sort() {
        let mut inv = Inventory::new();
        inv.add(Record::new(1, "a", 1, 0.0)).unwrap();
        inv.add(Record::new(2, "b", 1, -0.0)).unwrap();
        inv.add(Record::new(3, "c", 1, -1.0)).unwrap();

        assert_eq!(ids(&inv.sort_by_price(true)), vec![3, 1, 2]);
        assert_eq!(ids(&inv.sort_by_price(false)), vec![1, 2, 3]);
    }

    #[test]
    fn total_value_sums_lines() {
        let inv = demo();
        let expected = 120.0 * 0.15 + 2.0 * 12500.0 + 4.0 * 12.5 + 22000.0;
        assert!((inv.total_value() - expected).abs() < 1e-9);
    }

    #[test]
    fn import_bulk_is_all_or_nothing() {
        let mut inv = demo();
        let before = inv.records().to_vec();
        let batch = vec![
            Record::new(10, "New", 1, 1.0),
            Record::new(3, "Clash", 1, 1.0),
        ];
        assert_eq!(
            inv.import_bulk(batch, false),
            Err(ValidationError::DuplicateId(3))
        );
        assert_eq!(inv.records(), before.as_slice());
    }

    #[test]
    fn import_bulk_rejects_duplicates_within_batch() {
        let mut inv = Inventory::new();
        let batch = vec![Record::new(1, "a", 1, 1.0), Record::new(1, "b", 1, 1.0)];
        assert_eq!(
            inv.import_bulk(batch, true),
            Err(ValidationError::DuplicateId(1))
        );
        assert!(inv.is_empty());
    }

    #[test]
    fn import_bulk_replace_then_single_undo() {
        let mut inv = demo();
        let before = inv.records().to_vec();
        let batch = vec![Record::new(1, "Fresh", 3, 3.0), Record::new(7, "Other", 0, 9.0)];

        assert_eq!(inv.import_bulk(batch, true).unwrap(), 2);
        assert_eq!(ids(inv.records()), vec![1, 7]);

        assert!(inv.undo());
        assert_eq!(inv.records(), before.as_slice());
    }

    #[test]
    fn replace_loaded_resets_history() {
        let mut inv = demo();
        inv.remove(1).unwrap();
        inv.replace_loaded(vec![Record::new(8, "Loaded", 1, 1.0)]);
        assert_eq!(inv.history().undo_depth(), 1);
        assert!(!inv.history().can_redo());
        // undoing to the baseline is a no-op on contents
        assert!(inv.undo());
        assert_eq!(ids(inv.records()), vec![8]);
    }

    #[test]
    fn observer_sees_mutations_and_queries() {
        let rec = Rc::new(Recorder::default());
        let mut inv = Inventory::with_observer(Rc::clone(&rec));
        inv.add(Record::new(1, "Motor", 2, 10.0)).unwrap();
        inv.search("mot");
        assert!(inv.add(Record::new(1, "dup", 1, 1.0)).is_err());

        let events = rec.0.borrow();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LedgerEvent::Added { id: 1, .. }));
        assert!(matches!(events[1], LedgerEvent::Searched { .. }));
    }

    #[test]
    fn failing_observer_does_not_abort() {
        let mut inv = Inventory::with_observer(Broken);
        inv.add(Record::new(1, "A", 1, 1.0)).unwrap();
        assert!(inv.exists(1));
        assert!(inv.undo());
        assert!(inv.is_empty());
    }

    #[test]
    fn iterates_natively() {
        let inv = demo();
        let names: Vec<&str> = (&inv).into_iter().map(Record::name).collect();
        assert_eq!(names, vec!["Surub M6", "Motor 5kW", "Cablu YKY", "Invertor"]);
        assert_eq!(inv.iter().count(), 4);
    }
}
