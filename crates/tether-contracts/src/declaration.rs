//! Declarations extracted from annotated native source

use crate::error::{ContractParseError, ContractResult};
use crate::types::{TagKind, TypeTag};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Parameter name reserved for the allocation flag of every generated wrapper.
pub const ALLOCATION_FLAG: &str = "allocated_object";

/// Method names taken by the generated binding set itself.
pub const RESERVED_FUNCTION_NAMES: [&str; 7] = [
    "new",
    "default",
    "attach",
    "detach",
    "is_attached",
    "library",
    "library_mut",
];

/// Names a generated wrapper body refers to, so no parameter may shadow them.
pub const RESERVED_PARAM_NAMES: [&str; 10] = [
    "expect_tag",
    "BindingError",
    "BindingResult",
    "LibraryHandle",
    "Marshalled",
    "NativeValue",
    "Ok",
    "Err",
    "Some",
    "None",
];

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Where a declaration was found
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Origin {
    /// Source label (usually the file path)
    pub source: String,
    /// 1-based line of the begin marker
    pub line: usize,
}

impl Origin {
    pub fn new(source: impl Into<String>, line: usize) -> Self {
        Self {
            source: source.into(),
            line,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.line)
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    pub tag: TypeTag,
}

impl Param {
    pub fn new(name: impl Into<String>, tag: impl Into<TypeTag>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
        }
    }

    /// Parse a `"<type> <name>"` argument, splitting at the last whitespace run
    ///
    /// # Examples
    ///
    /// ```
    /// # use tether_contracts::Param;
    /// let param = Param::parse("std::vector<int>** out_vec").unwrap();
    /// assert_eq!(param.name, "out_vec");
    /// assert_eq!(param.tag.as_str(), "std::vector<int>**");
    /// ```
    pub fn parse(arg: &str) -> ContractResult<Self> {
        let trimmed = arg.trim();
        let split = trimmed
            .rfind(char::is_whitespace)
            .ok_or_else(|| ContractParseError::InvalidArgument {
                arg: arg.to_string(),
            })?;
        let (raw_tag, raw_name) = trimmed.split_at(split);
        let name = raw_name.trim();
        let tag = TypeTag::parse(raw_tag);
        if name.is_empty() || tag.as_str().is_empty() {
            return Err(ContractParseError::InvalidArgument {
                arg: arg.to_string(),
            });
        }
        Ok(Self::new(name, tag))
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tag, self.name)
    }
}

/// A validated function contract
///
/// Fields are private: a `Declaration` only exists once its invariants hold
/// (identifier names, unique parameters, recognized tags, no void parameters).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    name: String,
    params: Vec<Param>,
    return_type: TypeTag,
    origin: Origin,
}

impl Declaration {
    /// Validate and build a declaration
    pub fn new(
        name: impl Into<String>,
        params: Vec<Param>,
        return_type: impl Into<TypeTag>,
        origin: Origin,
    ) -> ContractResult<Self> {
        let name = name.into();
        let return_type = return_type.into();

        if !is_identifier(&name) || RESERVED_FUNCTION_NAMES.contains(&name.as_str()) {
            return Err(ContractParseError::invalid_identifier(name));
        }

        let mut seen = HashSet::new();
        for param in &params {
            if !is_identifier(&param.name)
                || param.name == ALLOCATION_FLAG
                || param.name.starts_with("__")
            {
                return Err(ContractParseError::invalid_identifier(&param.name));
            }
            if RESERVED_PARAM_NAMES.contains(&param.name.as_str()) {
                return Err(ContractParseError::ReservedParameter {
                    param: param.name.clone(),
                });
            }
            if !seen.insert(param.name.as_str()) {
                return Err(ContractParseError::DuplicateParameter {
                    param: param.name.clone(),
                });
            }
            match param.tag.kind() {
                None => return Err(ContractParseError::unknown_tag(param.tag.as_str())),
                Some(TagKind::Void) => {
                    return Err(ContractParseError::VoidParameter {
                        param: param.name.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        if !return_type.is_recognized() {
            return Err(ContractParseError::unknown_tag(return_type.as_str()));
        }

        Ok(Self {
            name,
            params,
            return_type,
            origin,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn return_type(&self) -> &TypeTag {
        &self.return_type
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Human-readable signature, e.g. `add(int a, int b) -> int`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        format!("{}({}) -> {}", self.name, params.join(", "), self.return_type)
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

/// Check that a name can be emitted verbatim as a Rust identifier
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let valid_start = match chars.next() {
        Some(c) => c.is_ascii_alphabetic() || c == '_',
        None => false,
    };
    valid_start
        && name != "_"
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin::new("test.h", 1)
    }

    #[test]
    fn test_param_parse_splits_at_last_whitespace() {
        let param = Param::parse("const char* name").unwrap();
        assert_eq!(param, Param::new("name", "const char*"));

        let param = Param::parse("  unsigned   int   count ").unwrap();
        assert_eq!(param, Param::new("count", "unsigned int"));
    }

    #[test]
    fn test_param_parse_rejects_single_word() {
        assert!(matches!(
            Param::parse("int"),
            Err(ContractParseError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Param::parse("   "),
            Err(ContractParseError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_declaration_signature() {
        let decl = Declaration::new(
            "add",
            vec![Param::new("a", "int"), Param::new("b", "int")],
            "int",
            origin(),
        )
        .unwrap();
        assert_eq!(decl.signature(), "add(int a, int b) -> int");
    }

    #[test]
    fn test_declaration_rejects_duplicate_params() {
        let result = Declaration::new(
            "add",
            vec![Param::new("a", "int"), Param::new("a", "int")],
            "int",
            origin(),
        );
        assert_eq!(
            result,
            Err(ContractParseError::DuplicateParameter {
                param: "a".to_string()
            })
        );
    }

    #[test]
    fn test_declaration_rejects_unknown_tags() {
        let result = Declaration::new(
            "take",
            vec![Param::new("v", "std::vector<int>")],
            "int",
            origin(),
        );
        assert!(matches!(
            result,
            Err(ContractParseError::UnknownTypeTag { .. })
        ));

        let result = Declaration::new("give", vec![], "struct thing", origin());
        assert!(matches!(
            result,
            Err(ContractParseError::UnknownTypeTag { .. })
        ));
    }

    #[test]
    fn test_declaration_rejects_void_param() {
        let result = Declaration::new("f", vec![Param::new("x", "void")], "int", origin());
        assert!(matches!(
            result,
            Err(ContractParseError::VoidParameter { .. })
        ));
    }

    #[test]
    fn test_declaration_rejects_reserved_names() {
        assert!(Declaration::new("new", vec![], "int", origin()).is_err());
        assert!(Declaration::new("type", vec![], "int", origin()).is_err());
        assert!(Declaration::new(
            "f",
            vec![Param::new("allocated_object", "bool")],
            "int",
            origin()
        )
        .is_err());
        assert!(Declaration::new("f", vec![Param::new("__raw", "int")], "int", origin()).is_err());
    }

    #[test]
    fn test_declaration_rejects_default_as_function_name() {
        assert_eq!(
            Declaration::new("default", vec![], "int", origin()),
            Err(ContractParseError::invalid_identifier("default"))
        );
    }

    #[test]
    fn test_declaration_rejects_wrapper_body_names_as_params() {
        for name in RESERVED_PARAM_NAMES {
            let result = Declaration::new("f", vec![Param::new(name, "int")], "int", origin());
            assert_eq!(
                result,
                Err(ContractParseError::ReservedParameter {
                    param: name.to_string()
                })
            );
        }
        // Only the exact spelling is reserved
        assert!(Declaration::new("f", vec![Param::new("ok", "int")], "int", origin()).is_ok());
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("new_int_vector"));
        assert!(is_identifier("_private"));
        assert!(!is_identifier("_"));
        assert!(!is_identifier("9lives"));
        assert!(!is_identifier("with-dash"));
        assert!(!is_identifier("match"));
    }
}
