/*!
 * Tests for language tag and script utility functions
 */

use coursewarden::language_utils::{
    declared_script, is_host_tag, language_name, language_tags_match, normalize_tag, ScriptFamily,
};

/// Test normalization of language tags to their 2-letter form
#[test]
fn test_normalize_tag_withValidTags_shouldNormalizeCorrectly() {
    assert_eq!(normalize_tag("en").unwrap(), "en");
    assert_eq!(normalize_tag("hu").unwrap(), "hu");
    assert_eq!(normalize_tag("eng").unwrap(), "en");
    assert_eq!(normalize_tag("hun").unwrap(), "hu");

    // ISO 639-2/B forms map through their /T equivalents
    assert_eq!(normalize_tag("fre").unwrap(), "fr");
    assert_eq!(normalize_tag("ger").unwrap(), "de");
    assert_eq!(normalize_tag("gre").unwrap(), "el");

    // Case insensitivity and whitespace
    assert_eq!(normalize_tag("EN").unwrap(), "en");
    assert_eq!(normalize_tag(" bg ").unwrap(), "bg");

    // Invalid tags
    assert!(normalize_tag("xx").is_err());
    assert!(normalize_tag("123").is_err());
    assert!(normalize_tag("e").is_err());
}

/// Test matching of different tag formats
#[test]
fn test_language_tags_match_withEquivalentTags_shouldReturnTrue() {
    assert!(language_tags_match("en", "eng"));
    assert!(language_tags_match("eng", "en"));
    assert!(language_tags_match("fr", "fre"));
    assert!(language_tags_match("FRA", "fre"));
    assert!(language_tags_match(" hu ", "hun"));

    // Non-matches and junk
    assert!(!language_tags_match("en", "fr"));
    assert!(!language_tags_match("en", "xyz"));
    assert!(!language_tags_match("", "en"));
}

/// Test the host-language shortcut used by every content gate
#[test]
fn test_is_host_tag_withEnglishForms_shouldReturnTrue() {
    assert!(is_host_tag("en"));
    assert!(is_host_tag("eng"));
    assert!(is_host_tag("EN"));

    assert!(!is_host_tag("hu"));
    assert!(!is_host_tag("bg"));
    assert!(!is_host_tag("not-a-tag"));
}

/// Test script family resolution for tags across every family
#[test]
fn test_declared_script_withKnownTags_shouldMapToFamilies() {
    assert_eq!(declared_script("hu"), ScriptFamily::Latin);
    assert_eq!(declared_script("de"), ScriptFamily::Latin);
    assert_eq!(declared_script("bg"), ScriptFamily::Cyrillic);
    assert_eq!(declared_script("ru"), ScriptFamily::Cyrillic);
    assert_eq!(declared_script("el"), ScriptFamily::Greek);
    assert_eq!(declared_script("ar"), ScriptFamily::Arabic);
    assert_eq!(declared_script("he"), ScriptFamily::Hebrew);
    assert_eq!(declared_script("hi"), ScriptFamily::Devanagari);
    assert_eq!(declared_script("th"), ScriptFamily::Thai);
    assert_eq!(declared_script("ko"), ScriptFamily::Hangul);
    assert_eq!(declared_script("ja"), ScriptFamily::Cjk);
    assert_eq!(declared_script("zh"), ScriptFamily::Cjk);
}

/// Test that 3-letter forms resolve the same family as their 2-letter form
#[test]
fn test_declared_script_withThreeLetterTags_shouldNormalizeFirst() {
    assert_eq!(declared_script("bul"), ScriptFamily::Cyrillic);
    assert_eq!(declared_script("gre"), ScriptFamily::Greek);
    assert_eq!(declared_script("jpn"), ScriptFamily::Cjk);
}

/// Test the permissive fallback for unknown or unmapped tags
#[test]
fn test_declared_script_withUnknownTag_shouldFallBackToLatin() {
    assert_eq!(declared_script("xx"), ScriptFamily::Latin);
    assert_eq!(declared_script(""), ScriptFamily::Latin);
    assert_eq!(declared_script("fi"), ScriptFamily::Latin);
}

/// Test membership checks on script families
#[test]
fn test_script_family_contains_shouldMatchScriptBlocks() {
    assert!(ScriptFamily::Latin.contains('a'));
    assert!(ScriptFamily::Latin.contains('ő'));
    assert!(ScriptFamily::Cyrillic.contains('ж'));
    assert!(ScriptFamily::Greek.contains('λ'));
    assert!(ScriptFamily::Cjk.contains('語'));

    assert!(!ScriptFamily::Latin.contains('ж'));
    assert!(!ScriptFamily::Cyrillic.contains('a'));
    // The multiplication sign sits inside the Latin-1 letter range
    assert!(!ScriptFamily::Latin.contains('\u{00D7}'));
}

/// Test retrieval of language names from tags
#[test]
fn test_language_name_withValidTags_shouldReturnEnglishName() {
    assert_eq!(language_name("en").unwrap(), "English");
    assert_eq!(language_name("hu").unwrap(), "Hungarian");
    assert_eq!(language_name("bg").unwrap(), "Bulgarian");
    assert_eq!(language_name("fre").unwrap(), "French");

    // Invalid tags
    assert!(language_name("xyz").is_err());
    assert!(language_name("").is_err());
}
