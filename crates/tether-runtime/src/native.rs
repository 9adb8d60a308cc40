//! Native values at the call boundary
//!
//! `NativeValue` is the representation a marshaller hands to (or receives
//! from) a native function:
//! - `Int` → C `int`
//! - `Float` → C `float`
//! - `Double` → C `double`
//! - `Bool` → C `bool`
//! - `CharPtr` → `const char*`
//! - `Ptr` → any other pointer
//! - `Void` → no value

use std::os::raw::{c_char, c_double, c_float, c_int, c_void};
use thiserror::Error;

pub type MarshalResult<T> = Result<T, MarshalError>;

/// Marshalling errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    /// The native representation does not fit the requested type
    #[error("expected a {expected} representation, got {got}")]
    Representation { expected: String, got: &'static str },

    #[error("null pointer")]
    NullPointer,

    /// String contains an interior nul byte or is not UTF-8
    #[error("invalid string: {0}")]
    InvalidString(String),

    #[error("unrecognized type tag '{0}'")]
    UnrecognizedTag(String),

    /// The value has no storage a pointer could refer to
    #[error("a '{tag}' value has no address")]
    NoAddress { tag: String },

    #[error("value {value} out of range for {target}")]
    OutOfRange { value: String, target: &'static str },
}

impl MarshalError {
    /// Create a representation mismatch error
    pub fn representation(expected: impl Into<String>, got: &NativeValue) -> Self {
        Self::Representation {
            expected: expected.into(),
            got: got.kind_name(),
        }
    }
}

/// C-compatible value crossing the boundary
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeValue {
    Int(c_int),
    Float(c_float),
    Double(c_double),
    Bool(bool),
    /// Null-terminated string pointer
    CharPtr(*const c_char),
    /// Opaque pointer
    Ptr(*mut c_void),
    Void,
}

impl NativeValue {
    /// Get a display name for the representation
    pub fn kind_name(&self) -> &'static str {
        match self {
            NativeValue::Int(_) => "c_int",
            NativeValue::Float(_) => "c_float",
            NativeValue::Double(_) => "c_double",
            NativeValue::Bool(_) => "c_bool",
            NativeValue::CharPtr(_) => "c_char_ptr",
            NativeValue::Ptr(_) => "c_void_ptr",
            NativeValue::Void => "c_void",
        }
    }

    pub fn as_int(&self) -> MarshalResult<c_int> {
        match self {
            NativeValue::Int(v) => Ok(*v),
            other => Err(MarshalError::representation("c_int", other)),
        }
    }

    pub fn as_float(&self) -> MarshalResult<c_float> {
        match self {
            NativeValue::Float(v) => Ok(*v),
            other => Err(MarshalError::representation("c_float", other)),
        }
    }

    pub fn as_double(&self) -> MarshalResult<c_double> {
        match self {
            NativeValue::Double(v) => Ok(*v),
            other => Err(MarshalError::representation("c_double", other)),
        }
    }

    pub fn as_bool(&self) -> MarshalResult<bool> {
        match self {
            NativeValue::Bool(v) => Ok(*v),
            other => Err(MarshalError::representation("c_bool", other)),
        }
    }

    pub fn as_char_ptr(&self) -> MarshalResult<*const c_char> {
        match self {
            NativeValue::CharPtr(p) => Ok(*p),
            other => Err(MarshalError::representation("c_char_ptr", other)),
        }
    }

    pub fn as_ptr(&self) -> MarshalResult<*mut c_void> {
        match self {
            NativeValue::Ptr(p) => Ok(*p),
            other => Err(MarshalError::representation("c_void_ptr", other)),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, NativeValue::Void)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn test_accessors_match_variant() {
        assert_eq!(NativeValue::Int(7).as_int(), Ok(7));
        assert_eq!(NativeValue::Float(1.5).as_float(), Ok(1.5));
        assert_eq!(NativeValue::Double(2.25).as_double(), Ok(2.25));
        assert_eq!(NativeValue::Bool(true).as_bool(), Ok(true));
        assert_eq!(NativeValue::Ptr(ptr::null_mut()).as_ptr(), Ok(ptr::null_mut()));
        assert!(NativeValue::Void.is_void());
    }

    #[test]
    fn test_accessor_mismatch() {
        assert_eq!(
            NativeValue::Float(1.0).as_int(),
            Err(MarshalError::Representation {
                expected: "c_int".to_string(),
                got: "c_float",
            })
        );
        assert!(NativeValue::Int(1).as_ptr().is_err());
        assert!(NativeValue::Void.as_bool().is_err());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(NativeValue::Int(0).kind_name(), "c_int");
        assert_eq!(NativeValue::CharPtr(ptr::null()).kind_name(), "c_char_ptr");
        assert_eq!(NativeValue::Void.kind_name(), "c_void");
    }
}
