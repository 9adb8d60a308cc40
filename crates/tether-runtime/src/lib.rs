//! Tether native binding runtime
//!
//! Provides everything generated binding stubs call into:
//! - Marshallers for scalars, text, opaque pointers and array views
//! - Library loading with `.so` / `.dll` fallback
//! - Per-handle allocation ledger and leak reports
//! - Typed containers built on generated stubs
//!
//! # Example
//!
//! ```no_run
//! use tether_runtime::{IntVector, IntVectorBindings, LibraryLoader};
//!
//! let mut bindings = IntVectorBindings::new();
//! bindings.attach(LibraryLoader::new().open("build/libvector")?);
//!
//! let mut vector = IntVector::from_slice(&mut bindings, &[1, 2, 3, 4])?;
//! assert_eq!(vector.len(&mut bindings)?, 4);
//! vector.delete(&mut bindings)?;
//!
//! assert!(bindings.library()?.cleanup().is_clean());
//! # Ok::<(), tether_runtime::BindingError>(())
//! ```

pub mod bindings;
pub mod containers;
pub mod error;
pub mod handle;
pub mod ledger;
pub mod loader;
pub mod marshal;
pub mod native;

// Re-export main types
pub use bindings::IntVectorBindings;
pub use containers::{IntVector, VECTOR_TYPE};
pub use error::{BindingError, BindingResult};
pub use handle::LibraryHandle;
pub use ledger::{AllocationId, AllocationLedger, AllocationRecord, LeakReport, LEAK_SAMPLE_LIMIT};
pub use loader::{
    DynamicLibrary, LibraryLoader, LoadAttempt, LoadError, NamingConvention, NativeLibrary,
    SymbolTable,
};
pub use marshal::{
    expect_tag, ArrayView, Marshal, Marshalled, Ownership, Pointer, Repr, Scalar, Text, Void,
};
pub use native::{MarshalError, MarshalResult, NativeValue};

// Re-export the tag vocabulary for convenience
pub use tether_contracts::{ScalarKind, TypeTag};
