/*!
 * Tests for language utility functions
 */

use pagewise::language_utils::{get_language_name, is_auto, language_codes_match, to_backend_code, validate_language_code};

/// Test validation of language codes
#[test]
fn test_validate_language_code_withValidCodes_shouldAccept() {
    assert!(validate_language_code("en", false).is_ok());
    assert!(validate_language_code("ind", false).is_ok());
    assert!(validate_language_code("fre", false).is_ok());
    assert!(validate_language_code(" DE ", false).is_ok());

    assert!(validate_language_code("xyz", false).is_err());
    assert!(validate_language_code("123", false).is_err());
    assert!(validate_language_code("e", false).is_err());
}

/// Test that auto detection is recognized regardless of case
#[test]
fn test_is_auto_withMixedCase_shouldMatch() {
    assert!(is_auto("auto"));
    assert!(is_auto(" AUTO "));
    assert!(!is_auto("en"));
}

/// Test normalization to backend codes
#[test]
fn test_to_backend_code_withBibliographicCodes_shouldReturnShortCodes() {
    assert_eq!(to_backend_code("ger").unwrap(), "de");
    assert_eq!(to_backend_code("zho").unwrap(), "zh");
    assert_eq!(to_backend_code("id").unwrap(), "id");
}

/// Test language names
#[test]
fn test_get_language_name_withValidCodes_shouldReturnEnglishNames() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("id").unwrap(), "Indonesian");
    assert_eq!(get_language_name("auto").unwrap(), "auto-detected");
    assert!(get_language_name("qq").is_err());
}

/// Test code matching across ISO variants
#[test]
fn test_language_codes_match_withInvalidCode_shouldNotMatch() {
    assert!(language_codes_match("fra", "fr"));
    assert!(!language_codes_match("xx", "xx"));
}
