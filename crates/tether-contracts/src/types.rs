//! Type tag vocabulary shared by contracts, the generator and the runtime
//!
//! Defines:
//! - `TypeTag`: canonical string naming a marshaller variant
//! - `ScalarKind`: the fixed-width scalar subset of the vocabulary
//! - `TagKind`: the classification of a recognized tag
//!
//! Tag mapping:
//! - `int` → C `int`
//! - `float` → C `float`
//! - `double` → C `double`
//! - `bool` → C `bool`
//! - `void` → no value (return position only)
//! - `const char*` / `char*` → null-terminated text
//! - `<anything>*` → opaque pointer to `<anything>`

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag of the return-only "no value" type.
pub const VOID_TAG: &str = "void";

/// Tags treated as null-terminated text rather than opaque pointers.
pub const TEXT_TAGS: [&str; 2] = ["const char*", "char*"];

/// Fixed-width scalar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    /// C int (i32 on every supported target)
    Int,
    /// C float (f32)
    Float,
    /// C double (f64)
    Double,
    /// C bool (one byte, 0 or 1)
    Bool,
}

impl ScalarKind {
    /// Every scalar kind, in vocabulary order
    pub const ALL: [ScalarKind; 4] = [
        ScalarKind::Int,
        ScalarKind::Float,
        ScalarKind::Double,
        ScalarKind::Bool,
    ];

    /// The type tag naming this scalar
    ///
    /// # Examples
    ///
    /// ```
    /// # use tether_contracts::ScalarKind;
    /// assert_eq!(ScalarKind::Int.tag(), "int");
    /// assert_eq!(ScalarKind::Double.tag(), "double");
    /// ```
    pub fn tag(&self) -> &'static str {
        match self {
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::Bool => "bool",
        }
    }

    /// Look up a scalar kind by exact tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Get a display name for the native representation
    pub fn display_name(&self) -> &'static str {
        match self {
            ScalarKind::Int => "c_int",
            ScalarKind::Float => "c_float",
            ScalarKind::Double => "c_double",
            ScalarKind::Bool => "c_bool",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Classification of a recognized type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind<'a> {
    /// Fixed-width scalar
    Scalar(ScalarKind),
    /// No value
    Void,
    /// Null-terminated text
    Text,
    /// Opaque pointer; `pointee` is the tag with one trailing `*` removed
    Pointer { pointee: &'a str },
}

/// Canonical type tag
///
/// Equality is exact-string. `TypeTag::parse` canonicalizes whitespace when a tag
/// is read from annotated source; after that no coercion happens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(String);

impl TypeTag {
    /// Wrap a tag verbatim
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Canonicalize a tag written in source
    ///
    /// Trims, collapses whitespace runs to one space, and drops whitespace
    /// directly before `*`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use tether_contracts::TypeTag;
    /// assert_eq!(TypeTag::parse("  const   char *").as_str(), "const char*");
    /// assert_eq!(TypeTag::parse("std::vector<int> * *").as_str(), "std::vector<int>**");
    /// ```
    pub fn parse(raw: &str) -> Self {
        let mut canonical = String::with_capacity(raw.len());
        for word in raw.split_whitespace() {
            if !canonical.is_empty() && !word.starts_with('*') {
                canonical.push(' ');
            }
            canonical.push_str(word);
        }
        Self(canonical)
    }

    /// The tag text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classify the tag, or `None` if it is not in the vocabulary
    pub fn kind(&self) -> Option<TagKind<'_>> {
        let tag = self.0.as_str();
        if let Some(scalar) = ScalarKind::from_tag(tag) {
            return Some(TagKind::Scalar(scalar));
        }
        if tag == VOID_TAG {
            return Some(TagKind::Void);
        }
        if TEXT_TAGS.contains(&tag) {
            return Some(TagKind::Text);
        }
        match tag.strip_suffix('*') {
            Some(pointee) if !pointee.trim().is_empty() => Some(TagKind::Pointer { pointee }),
            _ => None,
        }
    }

    /// Check whether the tag belongs to the vocabulary
    pub fn is_recognized(&self) -> bool {
        self.kind().is_some()
    }

    /// Check whether the tag names the return-only void type
    pub fn is_void(&self) -> bool {
        self.0 == VOID_TAG
    }

    /// The tag of a pointer to a value with this tag
    pub fn pointer_to(&self) -> TypeTag {
        TypeTag(format!("{}*", self.0))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<ScalarKind> for TypeTag {
    fn from(kind: ScalarKind) -> Self {
        Self::new(kind.tag())
    }
}

impl PartialEq<str> for TypeTag {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TypeTag {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
