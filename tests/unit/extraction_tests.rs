/*!
 * Tests for the response-extraction cascade, exercising the public API with
 * the kinds of responses real model endpoints actually send back.
 */

use esotran::extraction::{ExtractionMode, extract_translated_code};

fn extract(raw: &str) -> String {
    extract_translated_code(raw, ExtractionMode::RawFallback).unwrap()
}

#[test]
fn test_extract_totalFunction_shouldAlwaysReturnSomethingInFallbackMode() {
    let inputs = [
        "",
        "   ",
        "{",
        "}{",
        "```",
        "{\"translated_code\": ",
        "random prose with no structure at all",
        "{\"other_key\": \"value\"}",
    ];
    for input in inputs {
        let got = extract_translated_code(input, ExtractionMode::RawFallback);
        assert!(got.is_some(), "fallback mode must be total, input: {:?}", input);
    }
}

#[test]
fn test_extract_fallbackMode_nonEmptyInput_shouldNeverBeEmpty() {
    let got = extract("some leftover text");
    assert!(!got.is_empty());
}

#[test]
fn test_extract_roundTrip_wellFormedJson() {
    let raw = r#"{"translated_code": "module borbk_mod\n  implicit none\nend module"}"#;
    assert_eq!(extract(raw), "module borbk_mod\n  implicit none\nend module");
}

#[test]
fn test_extract_markdownWrappedJson_shouldReturnFieldValue() {
    let raw = "```json\n{\"translated_code\": \"bk => book_mypnt(lib, lb % bref(ibk2))\"}\n```";
    assert_eq!(extract(raw), "bk => book_mypnt(lib, lb % bref(ibk2))");
}

#[test]
fn test_extract_untaggedFenceWithJson_shouldReturnFieldValue() {
    let raw = "```\n{\"translated_code\": \"call segadj(lb, brcnt, urcnt)\"}\n```";
    assert_eq!(extract(raw), "call segadj(lb, brcnt, urcnt)");
}

#[test]
fn test_extract_realNewlinesInsideValue_shouldRecoverFullMultilineValue() {
    // The model emitted literal newlines inside the string, which is not
    // valid JSON; the permissive paths must still recover every line.
    let raw = "{\"translated_code\": \"module newbk_mod\nuse :: str_mod\nimplicit none\ncontains\nend module\"}";
    let code = extract(raw);
    assert!(code.starts_with("module newbk_mod"));
    assert!(code.contains("use :: str_mod"));
    assert!(code.ends_with("end module"));
}

#[test]
fn test_extract_noJsonMarkersButFortranText_shouldReturnTrimmedRawText() {
    let raw = "  MODULE fndbk_mod\n  IMPLICIT NONE\n  END MODULE fndbk_mod  ";
    assert_eq!(extract(raw), "MODULE fndbk_mod\n  IMPLICIT NONE\n  END MODULE fndbk_mod");
}

#[test]
fn test_extract_emptyInput_shouldMapToEmptyOutput() {
    assert_eq!(extract(""), "");
}

#[test]
fn test_extract_proseBeforeAndAfterObject_shouldFindTheObject() {
    let raw = "Sure! Here is the translation:\n\n{\"translated_code\": \"ur % ubb(ubbcnt) = ibk\"}\n\nLet me know if you need more.";
    assert_eq!(extract(raw), "ur % ubb(ubbcnt) = ibk");
}

#[test]
fn test_extract_fortranFence_shouldReturnVerbatimContents() {
    let raw = "The code:\n```Fortran\nsubroutine borbk(lib, name, title)\nend subroutine\n```\nDone.";
    assert_eq!(extract(raw), "subroutine borbk(lib, name, title)\nend subroutine");
}

#[test]
fn test_extract_escapedTabsAndNewlines_shouldUnescape() {
    let raw = "prefix \"translated_code\": \"a\\n\\tb\" suffix";
    assert_eq!(extract(raw), "a\n\tb");
}

#[test]
fn test_extract_strictMode_unparseableResponse_shouldReturnNone() {
    assert!(extract_translated_code("no code here", ExtractionMode::Strict).is_none());
    assert!(extract_translated_code("", ExtractionMode::Strict).is_none());
}

#[test]
fn test_extract_strictMode_parseableResponse_shouldReturnSome() {
    let raw = r#"{"translated_code": "end"}"#;
    let got = extract_translated_code(raw, ExtractionMode::Strict);
    assert_eq!(got.as_deref(), Some("end"));
}
