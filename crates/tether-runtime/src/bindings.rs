//! Binding sets generated at build time from the bundled native contracts

/// Wrappers for `native/int_vector.hpp`
pub mod int_vector {
    include!(concat!(env!("OUT_DIR"), "/int_vector_bindings.rs"));
}

pub use int_vector::IntVectorBindings;
