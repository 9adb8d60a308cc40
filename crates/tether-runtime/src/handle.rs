//! Library handles
//!
//! A `LibraryHandle` owns one native library and the allocation ledger for
//! every object handed back through it. It is neither `Send` nor `Sync`;
//! sharing across threads needs a caller-supplied lock.
//!
//! Dropping a handle (or detaching it from a binding set) discards the ledger
//! but leaves a `DynamicLibrary` loaded until the process exits.

use crate::error::{BindingError, BindingResult};
use crate::ledger::{AllocationLedger, LeakReport};
use crate::loader::NativeLibrary;
use crate::marshal::Marshalled;
use std::fmt;

pub struct LibraryHandle {
    library: Box<dyn NativeLibrary>,
    ledger: AllocationLedger,
}

impl LibraryHandle {
    /// Wrap a library with a fresh ledger
    pub fn new(library: impl NativeLibrary + 'static) -> Self {
        Self {
            library: Box::new(library),
            ledger: AllocationLedger::new(),
        }
    }

    pub fn describe(&self) -> &str {
        self.library.describe()
    }

    /// Resolve an exported function by exact name
    pub fn resolve(&self, symbol: &str) -> BindingResult<*const ()> {
        self.library
            .resolve(symbol)
            .ok_or_else(|| BindingError::symbol_not_found(self.library.describe(), symbol))
    }

    pub fn ledger(&self) -> &AllocationLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut AllocationLedger {
        &mut self.ledger
    }

    /// Deregister an owned value once its native destructor has run
    pub fn release(&mut self, value: &Marshalled) -> BindingResult<()> {
        let id = value.allocation_id().ok_or_else(|| BindingError::NotOwned {
            tag: value.type_tag().to_string(),
        })?;
        self.ledger.deregister(id)?;
        Ok(())
    }

    /// Report outstanding allocations
    ///
    /// Advisory only: the library stays loaded and the ledger is unchanged, so
    /// calling this twice gives the same report.
    pub fn cleanup(&self) -> LeakReport {
        let report = self.ledger.report();
        if report.is_clean() {
            tracing::info!(library = self.describe(), "all native objects released");
        } else {
            tracing::warn!(
                library = self.describe(),
                outstanding = report.outstanding,
                "native objects not released:\n{}",
                report
            );
        }
        report
    }
}

impl fmt::Debug for LibraryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryHandle")
            .field("library", &self.describe())
            .field("ledger", &self.ledger)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::SymbolTable;
    use crate::ledger::AllocationId;

    fn handle() -> LibraryHandle {
        LibraryHandle::new(SymbolTable::new("empty"))
    }

    #[test]
    fn test_missing_symbol() {
        let error = handle().resolve("add").unwrap_err();
        assert_eq!(error.to_string(), "symbol 'add' not found in empty");
    }

    #[test]
    fn test_release_requires_owned_value() {
        let mut handle = handle();
        let value = Marshalled::int(1);
        assert!(matches!(
            handle.release(&value),
            Err(BindingError::NotOwned { .. })
        ));
    }

    #[test]
    fn test_release_deregisters() {
        let mut handle = handle();
        let mut value = Marshalled::pointer("widget*");
        value.mark_owned(handle.ledger_mut().register("make_widget"));

        handle.release(&value).unwrap();
        assert!(handle.ledger().is_empty());
        assert!(matches!(
            handle.release(&value),
            Err(BindingError::AllocationNotFound(id)) if id == AllocationId::from_raw(1)
        ));
    }

    #[test]
    fn test_cleanup_does_not_mutate() {
        let mut handle = handle();
        handle.ledger_mut().register("make_widget");
        let first = handle.cleanup();
        let second = handle.cleanup();
        assert_eq!(first, second);
        assert_eq!(first.outstanding, 1);
    }
}
