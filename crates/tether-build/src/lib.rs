//! Tether binding generator
//!
//! Turns annotated native sources into a Rust module of typed wrapper stubs:
//! - Contract extraction (via `tether-contracts`)
//! - Stub rendering with statically known native signatures
//! - Atomic artifact output
//!
//! Meant to run from a `build.rs`:
//!
//! ```no_run
//! let out = std::path::PathBuf::from(std::env::var("OUT_DIR").unwrap());
//! let report = tether_build::BindingsBuilder::new(out.join("bindings.rs"))
//!     .source("native/api.h")
//!     .generate()
//!     .unwrap();
//! for diagnostic in &report.diagnostics {
//!     println!("cargo:warning={}", diagnostic);
//! }
//! ```

pub mod artifact;
pub mod builder;
pub mod error;
pub mod generator;

// Re-export main types
pub use artifact::write_atomic;
pub use builder::{BindingsBuilder, GenerationReport};
pub use error::{BuildError, BuildResult};
pub use generator::{Generator, GeneratorOptions, FUNCTIONS_CONST, RUNTIME_IMPORTS};

// Re-export contract types for convenience
pub use tether_contracts::{Declaration, Diagnostic, Markers, SourceText};
