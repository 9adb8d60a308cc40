//! Binding errors
//!
//! Per-call errors (`TypeMismatch`, `SymbolNotFound`, `NotAttached`) abort the
//! call before dispatch and leave the ledger unchanged. `LibraryLoad` aborts
//! session setup.

use crate::ledger::AllocationId;
use crate::loader::LoadError;
use crate::native::MarshalError;
use std::os::raw::c_int;
use thiserror::Error;

pub type BindingResult<T> = Result<T, BindingError>;

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("{function}: parameter '{param}' expects '{expected}', got '{got}'")]
    TypeMismatch {
        function: String,
        param: String,
        expected: String,
        got: String,
    },

    #[error(transparent)]
    LibraryLoad(#[from] LoadError),

    #[error("symbol '{symbol}' not found in {library}")]
    SymbolNotFound { library: String, symbol: String },

    #[error("{container} has not been allocated")]
    NotAllocated { container: &'static str },

    #[error("allocation {0} is not registered")]
    AllocationNotFound(AllocationId),

    #[error("no native library attached")]
    NotAttached,

    #[error("{function} failed with status {status}")]
    NativeStatus {
        function: &'static str,
        status: c_int,
    },

    #[error("'{tag}' value is not ledger-owned")]
    NotOwned { tag: String },

    #[error(transparent)]
    Marshal(#[from] MarshalError),
}

impl BindingError {
    /// Create a symbol not found error
    pub fn symbol_not_found(library: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::SymbolNotFound {
            library: library.into(),
            symbol: symbol.into(),
        }
    }
}
