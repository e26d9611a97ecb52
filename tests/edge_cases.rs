//! Edge case tests: degenerate inputs must not panic.

use sandwich::analyze_sandwich_file;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn empty_file_no_panic() {
    let mut file = NamedTempFile::with_suffix(".ts").unwrap();
    file.write_all(b"").unwrap();
    file.flush().unwrap();
    let result = analyze_sandwich_file(file.path());
    assert!(result.is_ok());
}

#[test]
fn not_recognized_language_falls_back_to_plain_text() {
    let mut file = NamedTempFile::with_suffix(".xyz").unwrap();
    file.write_all(b"hello world").unwrap();
    file.flush().unwrap();
    let result = analyze_sandwich_file(file.path());
    assert!(result.is_ok());
}

#[test]
fn only_comments_no_crash() {
    let mut file = NamedTempFile::with_suffix(".ts").unwrap();
    file.write_all(b"// nothing here\n/* or here */").unwrap();
    file.flush().unwrap();
    let result = analyze_sandwich_file(file.path());
    assert!(result.is_ok());
}

#[test]
fn syntax_error_handled_gracefully() {
    let mut file = NamedTempFile::with_suffix(".ts").unwrap();
    file.write_all(b"function {{{ broken").unwrap();
    file.flush().unwrap();
    let result = analyze_sandwich_file(file.path());
    assert!(result.is_ok(), "malformed source should still produce a result, not an error");
}

#[test]
fn utf8_identifiers_no_crash() {
    let mut file = NamedTempFile::with_suffix(".ts").unwrap();
    file.write_all("function テスト() { return 1; }".as_bytes()).unwrap();
    file.flush().unwrap();
    let result = analyze_sandwich_file(file.path());
    assert!(result.is_ok());
}

#[test]
fn file_with_bom_parses() {
    let mut file = NamedTempFile::with_suffix(".ts").unwrap();
    file.write_all(b"\xEF\xBB\xBFfunction add(a, b) { return a + b; }")
        .unwrap();
    file.flush().unwrap();
    let result = analyze_sandwich_file(file.path());
    assert!(result.is_ok());
}

#[test]
fn deeply_nested_conditionals_do_not_overflow() {
    let mut content = String::from("function deep(x) {\n");
    for _ in 0..200 {
        content.push_str("if (x) {\n");
    }
    content.push_str("return x;\n");
    for _ in 0..200 {
        content.push_str("}\n");
    }
    content.push('}');

    let mut file = NamedTempFile::with_suffix(".ts").unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    let result = analyze_sandwich_file(file.path());
    assert!(result.is_ok());
    let analysis = result.unwrap();
    assert!(analysis.raw.cheese > 0.0, "extreme nesting should be visible in the cheese score");
}

#[test]
fn large_file_completes() {
    let mut content = String::new();
    for i in 0..500 {
        content.push_str(&format!("function fn{i}(x) {{ return x + {i}; }}\n"));
    }
    let mut file = NamedTempFile::with_suffix(".ts").unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    let result = analyze_sandwich_file(file.path());
    assert!(result.is_ok());
}

#[test]
fn nonexistent_file_is_an_error_not_a_panic() {
    let result = analyze_sandwich_file(std::path::Path::new("/no/such/file.ts"));
    assert!(result.is_err());
}

#[test]
fn python_source_analyzes_without_panicking() {
    let mut file = NamedTempFile::with_suffix(".py").unwrap();
    file.write_all(b"def add(a, b):\n    return a + b\n").unwrap();
    file.flush().unwrap();
    let result = analyze_sandwich_file(file.path());
    assert!(result.is_ok());
}

#[test]
fn go_source_analyzes_without_panicking() {
    let mut file = NamedTempFile::with_suffix(".go").unwrap();
    file.write_all(b"package main\n\nfunc add(a, b int) int {\n\treturn a + b\n}\n").unwrap();
    file.flush().unwrap();
    let result = analyze_sandwich_file(file.path());
    assert!(result.is_ok());
}
