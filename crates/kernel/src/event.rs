use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use stockledger_common::RecordId;

/// An event emitted by the inventory after every successful operation.
///
/// Mutations carry enough detail to audit the change; queries carry their
/// parameters. The `Display` form is the one-line journal message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Added {
        id: RecordId,
        name: String,
        quantity: i32,
        unit_price: f64,
    },
    Removed {
        id: RecordId,
    },
    QuantityUpdated {
        id: RecordId,
        quantity: i32,
    },
    Imported {
        count: usize,
        replaced: bool,
    },
    Undone,
    Redone,
    LowStockQueried {
        threshold: i32,
    },
    OutOfStockQueried,
    ExpensiveQueried {
        floor: f64,
    },
    Searched {
        query: String,
    },
    Sorted {
        key: SortKey,
        ascending: bool,
    },
    TotalValueComputed {
        total: f64,
    },
    Loaded {
        source: String,
        count: usize,
    },
    LoadSkipped {
        source: String,
    },
    Saved {
        target: String,
        count: usize,
    },
    Exported {
        target: String,
        format: String,
    },
    DemoSeeded {
        count: usize,
    },
}

/// Field a sorted view is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Price,
    Quantity,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Price => f.write_str("price"),
            Self::Quantity => f.write_str("quantity"),
        }
    }
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added {
                id,
                name,
                quantity,
                unit_price,
            } => write!(
                f,
                "ADD ID={id} NAME={name} QTY={quantity} PRICE={unit_price:.6}"
            ),
            Self::Removed { id } => write!(f, "DELETE material ID={id}"),
            Self::QuantityUpdated { id, quantity } => {
                write!(f, "UPDATE QTY ID={id} NEW_QTY={quantity}")
            }
            Self::Imported { count, replaced } => write!(
                f,
                "IMPORT rows={count} {}",
                if *replaced { "REPLACE" } else { "APPEND" }
            ),
            Self::Undone => f.write_str("UNDO"),
            Self::Redone => f.write_str("REDO"),
            Self::LowStockQueried { threshold } => {
                write!(f, "FILTER lowStock <= {threshold}")
            }
            Self::OutOfStockQueried => f.write_str("FILTER outOfStock"),
            Self::ExpensiveQueried { floor } => write!(f, "FILTER expensive > {floor:.6}"),
            Self::Searched { query } => write!(f, "SEARCH query=\"{query}\""),
            Self::Sorted { key, ascending } => write!(
                f,
                "SORT {key} {}",
                if *ascending { "ASC" } else { "DESC" }
            ),
            Self::TotalValueComputed { total } => write!(f, "STATS totalValue={total:.6}"),
            Self::Loaded { source, count } => {
                write!(f, "LOAD from file={source} records={count}")
            }
            Self::LoadSkipped { source } => write!(f, "LOAD skipped (file missing) file={source}"),
            Self::Saved { target, count } => write!(f, "SAVE to file={target} records={count}"),
            Self::Exported { target, format } => write!(f, "EXPORT {format} file={target}"),
            Self::DemoSeeded { count } => write!(f, "DEMO data loaded records={count}"),
        }
    }
}

/// Errors an observer may report. The inventory logs them and carries on.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    #[error("observer I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("observer rejected event: {0}")]
    Rejected(String),
}

/// Side-effecting sink for ledger events.
///
/// Called after the operation has already taken effect; a failure here never
/// rolls the operation back.
pub trait Observer {
    fn notify(&self, event: &LedgerEvent) -> Result<(), ObserverError>;
}

impl<T: Observer + ?Sized> Observer for Rc<T> {
    fn notify(&self, event: &LedgerEvent) -> Result<(), ObserverError> {
        (**self).notify(event)
    }
}

impl<T: Observer + ?Sized> Observer for Box<T> {
    fn notify(&self, event: &LedgerEvent) -> Result<(), ObserverError> {
        (**self).notify(event)
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn notify(&self, _event: &LedgerEvent) -> Result<(), ObserverError> {
        Ok(())
    }
}

/// Forwards events to `tracing` at info level under the `ledger` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn notify(&self, event: &LedgerEvent) -> Result<(), ObserverError> {
        tracing::info!(target: "ledger", event = ?event, "{event}");
        Ok(())
    }
}

/// Fans one event out to several observers. Every observer is called even if
/// an earlier one fails; the first failure is returned.
#[derive(Default)]
pub struct ObserverSet {
    observers: Vec<Box<dyn Observer>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: impl Observer + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Observer for ObserverSet {
    fn notify(&self, event: &LedgerEvent) -> Result<(), ObserverError> {
        let mut first_err = None;
        for observer in &self.observers {
            if let Err(e) = observer.notify(event) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
