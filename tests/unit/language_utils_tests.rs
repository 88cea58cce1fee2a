/*!
 * Tests for language utility functions
 */

use lyricvid::language_utils::{
    alignment_language_label, get_language_name, language_codes_match, normalize_to_part1_or_part2t,
};

/// Test normalization to the translation key format
#[test]
fn test_normalize_withValidCodes_shouldPreferPart1() {
    assert_eq!(normalize_to_part1_or_part2t("en").unwrap(), "en");
    assert_eq!(normalize_to_part1_or_part2t("eng").unwrap(), "en");
    assert_eq!(normalize_to_part1_or_part2t("fre").unwrap(), "fr");
    assert_eq!(normalize_to_part1_or_part2t(" JA ").unwrap(), "ja");
}

/// Test invalid codes
#[test]
fn test_normalize_withInvalidCodes_shouldFail() {
    assert!(normalize_to_part1_or_part2t("xyz").is_err());
    assert!(normalize_to_part1_or_part2t("e").is_err());
    assert!(normalize_to_part1_or_part2t("").is_err());
}

/// Test language matching across code formats
#[test]
fn test_languageCodesMatch_withEquivalentCodes_shouldMatch() {
    assert!(language_codes_match("ja", "jpn"));
    assert!(language_codes_match("de", "ger"));
    assert!(language_codes_match("FR", "fra"));
    assert!(!language_codes_match("ja", "en"));
}

/// Test language names used in prompts and alignment requests
#[test]
fn test_languageNames_shouldBeEnglishNames() {
    assert_eq!(get_language_name("ja").unwrap(), "Japanese");
    assert_eq!(get_language_name("eng").unwrap(), "English");
    assert_eq!(alignment_language_label("fr").unwrap(), "french");
    assert!(get_language_name("zz").is_err());
}
