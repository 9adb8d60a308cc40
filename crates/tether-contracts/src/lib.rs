//! Tether binding contracts
//!
//! Provides the front half of the native binding pipeline:
//! - The type-tag vocabulary shared with the generator and the runtime
//! - Validated function declarations
//! - Extraction of annotated contracts from native source files
//!
//! # Example
//!
//! ```
//! use tether_contracts::{ContractExtractor, SourceText};
//!
//! let source = SourceText::new(
//!     "add.h",
//!     r#"/* [export] { "type": "function", "name": "add",
//!          "args": ["int a", "int b"], "return_type": "int" } [endexport] */
//!     int add(int a, int b);"#,
//! );
//! let extraction = ContractExtractor::default().extract(&[source]);
//! assert_eq!(extraction.declarations[0].signature(), "add(int a, int b) -> int");
//! ```

pub mod declaration;
pub mod error;
pub mod extract;
pub mod types;

// Re-export main types
pub use declaration::{
    is_identifier, Declaration, Origin, Param, ALLOCATION_FLAG, RESERVED_FUNCTION_NAMES,
    RESERVED_PARAM_NAMES,
};
pub use error::{ContractParseError, ContractResult};
pub use extract::{
    parse_block, Blocks, ContractExtractor, Diagnostic, Extraction, Markers, RawBlock,
    SourceText, FUNCTION_RECORD,
};
pub use types::{ScalarKind, TagKind, TypeTag, TEXT_TAGS, VOID_TAG};
