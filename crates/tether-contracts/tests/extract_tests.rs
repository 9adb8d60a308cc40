//! Integration tests for contract extraction
//!
//! Exercises the extractor over realistic annotated headers, including files
//! read from disk.

use pretty_assertions::assert_eq;
use rstest::rstest;
use std::fs;
use tether_contracts::{
    ContractExtractor, ContractParseError, Markers, Origin, SourceText, TypeTag,
};

const ADD_HEADER: &str = r#"#pragma once

/* [export]
{
    "type": "function",
    "name": "add",
    "args": ["int a", "int b"],
    "return_type": "int"
}
[endexport] */
extern "C" int add(int a, int b);
"#;

const SUB_HEADER: &str = r#"/* [export] { "type": "function", "name": "sub",
    "args": ["int a", "int b"], "return_type": "int" } [endexport] */
extern "C" int sub(int a, int b);
"#;

fn names(sources: &[SourceText]) -> Vec<String> {
    ContractExtractor::default()
        .extract(sources)
        .declarations
        .iter()
        .map(|decl| decl.name().to_string())
        .collect()
}

#[test]
fn test_two_files_keep_supplied_order() {
    let a = SourceText::new("a.h", ADD_HEADER);
    let b = SourceText::new("b.h", SUB_HEADER);

    assert_eq!(names(&[a.clone(), b.clone()]), vec!["add", "sub"]);
    assert_eq!(names(&[b, a]), vec!["sub", "add"]);
}

#[test]
fn test_declaration_details() {
    let extraction = ContractExtractor::default().extract(&[SourceText::new("a.h", ADD_HEADER)]);
    assert!(extraction.diagnostics.is_empty());

    let add = &extraction.declarations[0];
    assert_eq!(add.origin(), &Origin::new("a.h", 3));
    assert_eq!(add.return_type(), &TypeTag::new("int"));
    assert_eq!(add.params().len(), 2);
    assert_eq!(add.params()[1].name, "b");
}

#[test]
fn test_source_order_within_one_file() {
    let text = format!("{}\n{}", SUB_HEADER, ADD_HEADER);
    assert_eq!(names(&[SourceText::new("both.h", text)]), vec!["sub", "add"]);
}

#[test]
fn test_malformed_blocks_are_skipped_not_fatal() {
    let text = r#"
/* [export] { "type": "function", "name": "first", "args": [], "return_type": "void" } [endexport] */
/* [export] { "type": "function", "name": "broken", "args": ["int"], "return_type": "int" } [endexport] */
/* [export] { "type": "function", "args": [], "return_type": "int" } [endexport] */
/* [export] not json at all [endexport] */
/* [export] { "type": "function", "name": "last", "args": ["double x"], "return_type": "double" } [endexport] */
"#;
    let extraction = ContractExtractor::default().extract(&[SourceText::new("mixed.h", text)]);

    let names: Vec<_> = extraction.declarations.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["first", "last"]);
    assert_eq!(extraction.diagnostics.len(), 3);
    assert_eq!(extraction.diagnostics[0].origin.line, 3);
    assert!(matches!(
        extraction.diagnostics[0].error,
        ContractParseError::InvalidArgument { .. }
    ));
    assert_eq!(
        extraction.diagnostics[1].error,
        ContractParseError::MissingField { field: "name" }
    );
}

#[test]
fn test_non_function_records_are_ignored() {
    let text = r#"
/* [export] { "type": "struct", "name": "point" } [endexport] */
/* [export] { "type": "function", "name": "origin", "args": [], "return_type": "int*" } [endexport] */
"#;
    let extraction = ContractExtractor::default().extract(&[SourceText::new("p.h", text)]);
    assert_eq!(extraction.declarations.len(), 1);
    assert_eq!(extraction.ignored, 1);
    assert!(extraction.diagnostics.is_empty());
}

#[test]
fn test_unmatched_begin_marker_is_treated_as_absent() {
    let text = format!("{}\n/* [export] {{ \"type\": \"function\" */\n", ADD_HEADER);
    let extraction = ContractExtractor::default().extract(&[SourceText::new("a.h", text)]);
    assert_eq!(extraction.declarations.len(), 1);
    assert!(extraction.diagnostics.is_empty());
}

#[test]
fn test_unmatched_marker_does_not_leak_into_next_file() {
    let dangling = SourceText::new("dangling.h", "/* [export] { \"type\": ");
    assert_eq!(
        names(&[dangling, SourceText::new("b.h", SUB_HEADER)]),
        vec!["sub"]
    );
}

#[test]
fn test_duplicate_function_is_skipped() {
    let extraction = ContractExtractor::default().extract(&[
        SourceText::new("a.h", ADD_HEADER),
        SourceText::new("again.h", ADD_HEADER),
    ]);
    assert_eq!(extraction.declarations.len(), 1);
    assert_eq!(
        extraction.diagnostics[0].error,
        ContractParseError::DuplicateFunction {
            name: "add".to_string(),
            first: Origin::new("a.h", 3),
        }
    );
}

#[rstest]
#[case::runtime_import("Marshalled")]
#[case::error_type("BindingError")]
#[case::tag_check("expect_tag")]
#[case::ok_constructor("Ok")]
#[case::err_constructor("Err")]
#[case::some_constructor("Some")]
#[case::none_constructor("None")]
fn test_reserved_parameter_skips_only_its_block(#[case] param: &str) {
    let text = format!(
        "{}\n/* [export] {{ \"type\": \"function\", \"name\": \"wrap\", \"args\": [\"int {}\"], \"return_type\": \"int\" }} [endexport] */\n",
        ADD_HEADER, param
    );
    let extraction = ContractExtractor::default().extract(&[SourceText::new("wrap.h", text)]);

    let names: Vec<_> = extraction.declarations.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["add"]);
    assert_eq!(extraction.diagnostics.len(), 1);
    assert_eq!(
        extraction.diagnostics[0].error,
        ContractParseError::ReservedParameter {
            param: param.to_string()
        }
    );
}

#[test]
fn test_function_named_default_is_skipped() {
    let text = format!(
        "{}\n/* [export] {{ \"type\": \"function\", \"name\": \"default\", \"args\": [], \"return_type\": \"int\" }} [endexport] */\n",
        SUB_HEADER
    );
    let extraction = ContractExtractor::default().extract(&[SourceText::new("d.h", text)]);

    assert_eq!(extraction.declarations.len(), 1);
    assert_eq!(extraction.declarations[0].name(), "sub");
    assert_eq!(
        extraction.diagnostics[0].error,
        ContractParseError::InvalidIdentifier {
            name: "default".to_string()
        }
    );
}

#[test]
fn test_custom_markers() {
    let text = r#"// @bind { "type": "function", "name": "ping", "args": [], "return_type": "void" } @end
/* [export] { "type": "function", "name": "hidden", "args": [], "return_type": "void" } [endexport] */"#;
    let extractor = ContractExtractor::new(Markers::new("@bind", "@end"));
    let extraction = extractor.extract(&[SourceText::new("custom.h", text)]);
    let names: Vec<_> = extraction.declarations.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["ping"]);
}

#[rstest]
#[case("", "[endexport]")]
#[case("[export]", "")]
#[case("same", "same")]
fn test_invalid_markers(#[case] begin: &str, #[case] end: &str) {
    assert!(Markers::new(begin, end).validate().is_err());
}

#[test]
fn test_declaration_count_matches_function_blocks() {
    let text = r#"
[export] { "type": "function", "name": "a", "args": ["int x"], "return_type": "int" } [endexport]
[export] { "type": "enum", "name": "e" } [endexport]
[export] { "type": "function", "name": "b", "args": ["float y", "const char* s"], "return_type": "void" } [endexport]
[export] { "type": "function", "name": "c", "args": ["widget w"], "return_type": "int" } [endexport]
[export] { "type": "function", "name": "d", "args": ["std::vector<int>** out"], "return_type": "int" } [endexport]
"#;
    let sources = [SourceText::new("count.h", text)];
    let extractor = ContractExtractor::default();
    let blocks = extractor.blocks(&sources).count();
    let extraction = extractor.extract(&sources);

    assert_eq!(blocks, 5);
    assert_eq!(extraction.declarations.len(), 3);
    assert_eq!(
        extraction.declarations.len() + extraction.diagnostics.len() + extraction.ignored,
        blocks
    );
}

#[test]
fn test_blocks_can_be_scanned_twice() {
    let sources = [
        SourceText::new("a.h", ADD_HEADER),
        SourceText::new("b.h", SUB_HEADER),
    ];
    let extractor = ContractExtractor::default();
    let first: Vec<_> = extractor.blocks(&sources).map(|b| b.origin).collect();
    let second: Vec<_> = extractor.blocks(&sources).map(|b| b.origin).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[test]
fn test_source_text_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("add.h");
    fs::write(&path, ADD_HEADER).unwrap();

    let source = SourceText::from_path(&path).unwrap();
    assert_eq!(source.label(), path.display().to_string());
    assert_eq!(names(&[source]), vec!["add"]);
}

#[test]
fn test_source_text_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(SourceText::from_path(dir.path().join("missing.h")).is_err());
}
