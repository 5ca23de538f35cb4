/*!
 * Tests for ISO language code utilities
 */

use subtrans::language_utils::{
    get_language_name, normalize_to_part1_or_part2t, validate_language_code, LanguageCodeType,
};

#[test]
fn test_validateLanguageCode_withAllCodeKinds_shouldClassify() {
    assert_eq!(validate_language_code("fr").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code("fra").unwrap(), LanguageCodeType::Part2T);
    assert_eq!(validate_language_code("fre").unwrap(), LanguageCodeType::Part2B);
}

#[test]
fn test_validateLanguageCode_withGarbage_shouldFail() {
    for code in ["", "x", "zz", "en-US", "french"] {
        assert!(validate_language_code(code).is_err(), "{}", code);
    }
}

#[test]
fn test_normalize_withEquivalentCodes_shouldAgree() {
    let normalized: Vec<String> = ["de", "deu", "ger", "DE"]
        .iter()
        .map(|code| normalize_to_part1_or_part2t(code).unwrap())
        .collect();
    assert!(normalized.iter().all(|code| code == "de"));
}

#[test]
fn test_getLanguageName_withBibliographicCode_shouldResolve() {
    assert_eq!(get_language_name("chi").unwrap(), "Chinese");
    assert!(get_language_name("zz").is_err());
}
