use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language tag handling
///
/// This module provides functions for validating and normalizing ISO 639-1
/// (2-letter) and ISO 639-2 (3-letter) language tags, plus the mapping from
/// a language tag to the Unicode script family its content is expected to
/// be written in.
/// Script family a language tag declares its content to be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFamily {
    /// Latin and Latin-extended blocks
    Latin,
    /// Cyrillic and Cyrillic supplement
    Cyrillic,
    /// Greek and Greek extended
    Greek,
    /// Arabic, Arabic supplement and presentation forms
    Arabic,
    /// Hebrew block
    Hebrew,
    /// Devanagari block
    Devanagari,
    /// Bengali block
    Bengali,
    /// Georgian block
    Georgian,
    /// Armenian block
    Armenian,
    /// Thai block
    Thai,
    /// Hangul syllables and jamo
    Hangul,
    /// CJK ideographs plus kana, covering Chinese and Japanese tags
    Cjk,
}

impl ScriptFamily {
    /// Check whether a character belongs to this script family
    pub fn contains(self, c: char) -> bool {
        match self {
            ScriptFamily::Latin => {
                c.is_ascii_alphabetic()
                    || (('\u{00C0}'..='\u{024F}').contains(&c) && c != '\u{00D7}' && c != '\u{00F7}')
                    || ('\u{1E00}'..='\u{1EFF}').contains(&c)
            }
            ScriptFamily::Cyrillic => {
                ('\u{0400}'..='\u{04FF}').contains(&c) || ('\u{0500}'..='\u{052F}').contains(&c)
            }
            ScriptFamily::Greek => {
                ('\u{0370}'..='\u{03FF}').contains(&c) || ('\u{1F00}'..='\u{1FFF}').contains(&c)
            }
            ScriptFamily::Arabic => {
                ('\u{0600}'..='\u{06FF}').contains(&c)
                    || ('\u{0750}'..='\u{077F}').contains(&c)
                    || ('\u{08A0}'..='\u{08FF}').contains(&c)
                    || ('\u{FB50}'..='\u{FDFF}').contains(&c)
                    || ('\u{FE70}'..='\u{FEFF}').contains(&c)
            }
            ScriptFamily::Hebrew => ('\u{0590}'..='\u{05FF}').contains(&c),
            ScriptFamily::Devanagari => ('\u{0900}'..='\u{097F}').contains(&c),
            ScriptFamily::Bengali => ('\u{0980}'..='\u{09FF}').contains(&c),
            ScriptFamily::Georgian => ('\u{10A0}'..='\u{10FF}').contains(&c),
            ScriptFamily::Armenian => ('\u{0530}'..='\u{058F}').contains(&c),
            ScriptFamily::Thai => ('\u{0E00}'..='\u{0E7F}').contains(&c),
            ScriptFamily::Hangul => {
                ('\u{AC00}'..='\u{D7AF}').contains(&c)
                    || ('\u{1100}'..='\u{11FF}').contains(&c)
                    || ('\u{3130}'..='\u{318F}').contains(&c)
            }
            ScriptFamily::Cjk => {
                ('\u{4E00}'..='\u{9FFF}').contains(&c)
                    || ('\u{3400}'..='\u{4DBF}').contains(&c)
                    || ('\u{3040}'..='\u{309F}').contains(&c)
                    || ('\u{30A0}'..='\u{30FF}').contains(&c)
                    || ('\u{F900}'..='\u{FAFF}').contains(&c)
            }
        }
    }

    /// Human-readable script name for report messages
    pub fn display_name(self) -> &'static str {
        match self {
            ScriptFamily::Latin => "Latin",
            ScriptFamily::Cyrillic => "Cyrillic",
            ScriptFamily::Greek => "Greek",
            ScriptFamily::Arabic => "Arabic",
            ScriptFamily::Hebrew => "Hebrew",
            ScriptFamily::Devanagari => "Devanagari",
            ScriptFamily::Bengali => "Bengali",
            ScriptFamily::Georgian => "Georgian",
            ScriptFamily::Armenian => "Armenian",
            ScriptFamily::Thai => "Thai",
            ScriptFamily::Hangul => "Hangul",
            ScriptFamily::Cjk => "CJK",
        }
    }
}

/// The host language every course defaults to when no translation applies
pub const HOST_LANGUAGE_TAG: &str = "en";

/// Normalize a language tag to its ISO 639-1 (2-letter) form when one
/// exists, falling back to ISO 639-3 for languages without a 2-letter code
pub fn normalize_tag(tag: &str) -> Result<String> {
    let trimmed = tag.trim().to_lowercase();

    // Already a 2-letter code
    if trimmed.len() == 2 {
        if Language::from_639_1(&trimmed).is_some() {
            return Ok(trimmed);
        }
    } else if trimmed.len() == 3 {
        // Map the ISO 639-2/B forms that differ from 639-2/T before lookup
        let part2t = match trimmed.as_str() {
            "fre" => "fra", // French
            "ger" => "deu", // German
            "dut" => "nld", // Dutch
            "gre" => "ell", // Greek
            "cze" => "ces", // Czech
            "rum" => "ron", // Romanian
            "per" => "fas", // Persian
            "chi" => "zho", // Chinese
            "mac" => "mkd", // Macedonian
            _ => &trimmed,
        };

        if let Some(lang) = Language::from_639_3(part2t) {
            if let Some(part1) = lang.to_639_1() {
                return Ok(part1.to_string());
            }
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Invalid language tag: {}", tag))
}

/// Check if two language tags refer to the same language
pub fn language_tags_match(tag1: &str, tag2: &str) -> bool {
    let normalized1 = match normalize_tag(tag1) {
        Ok(n) => n,
        Err(_) => return false,
    };

    let normalized2 = match normalize_tag(tag2) {
        Ok(n) => n,
        Err(_) => return false,
    };

    normalized1 == normalized2
}

/// Whether the tag declares the host language (content that ships untranslated)
pub fn is_host_tag(tag: &str) -> bool {
    language_tags_match(tag, HOST_LANGUAGE_TAG)
}

/// Resolve the script family a language tag is expected to be written in.
/// Unknown or unmapped tags fall back to Latin, which is the permissive
/// branch of the integrity policy.
pub fn declared_script(tag: &str) -> ScriptFamily {
    let normalized = match normalize_tag(tag) {
        Ok(n) => n,
        Err(_) => return ScriptFamily::Latin,
    };

    match normalized.as_str() {
        "ru" => ScriptFamily::Cyrillic,    // Russian
        "uk" => ScriptFamily::Cyrillic,    // Ukrainian
        "be" => ScriptFamily::Cyrillic,    // Belarusian
        "bg" => ScriptFamily::Cyrillic,    // Bulgarian
        "mk" => ScriptFamily::Cyrillic,    // Macedonian
        "sr" => ScriptFamily::Cyrillic,    // Serbian
        "kk" => ScriptFamily::Cyrillic,    // Kazakh
        "ky" => ScriptFamily::Cyrillic,    // Kyrgyz
        "mn" => ScriptFamily::Cyrillic,    // Mongolian
        "el" => ScriptFamily::Greek,       // Greek
        "ar" => ScriptFamily::Arabic,      // Arabic
        "fa" => ScriptFamily::Arabic,      // Persian
        "ur" => ScriptFamily::Arabic,      // Urdu
        "ps" => ScriptFamily::Arabic,      // Pashto
        "he" => ScriptFamily::Hebrew,      // Hebrew
        "yi" => ScriptFamily::Hebrew,      // Yiddish
        "hi" => ScriptFamily::Devanagari,  // Hindi
        "mr" => ScriptFamily::Devanagari,  // Marathi
        "ne" => ScriptFamily::Devanagari,  // Nepali
        "bn" => ScriptFamily::Bengali,     // Bengali
        "ka" => ScriptFamily::Georgian,    // Georgian
        "hy" => ScriptFamily::Armenian,    // Armenian
        "th" => ScriptFamily::Thai,        // Thai
        "ko" => ScriptFamily::Hangul,      // Korean
        "zh" => ScriptFamily::Cjk,         // Chinese
        "ja" => ScriptFamily::Cjk,         // Japanese
        _ => ScriptFamily::Latin,
    }
}

/// Get the English language name from a tag
pub fn language_name(tag: &str) -> Result<String> {
    let normalized = normalize_tag(tag)?;

    let lang = if normalized.len() == 2 {
        Language::from_639_1(&normalized)
    } else {
        Language::from_639_3(&normalized)
    };

    lang.map(|l| l.to_name().to_string())
        .ok_or_else(|| anyhow!("Failed to get language from tag: {}", normalized))
}
