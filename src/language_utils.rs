use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for caption language tags
///
/// Caption tracks are labelled with BCP 47 style tags such as `en`,
/// `en-US`, `ja` or `zh-Hans`. Only the primary subtag matters here; it is
/// validated and converted with ISO 639-1 / ISO 639-2 rules.

// @const: ISO 639-2/B codes that differ from their ISO 639-2/T form
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"), ("ger", "deu"), ("dut", "nld"), ("gre", "ell"),
    ("chi", "zho"), ("cze", "ces"), ("ice", "isl"), ("alb", "sqi"),
    ("arm", "hye"), ("baq", "eus"), ("bur", "mya"), ("per", "fas"),
    ("geo", "kat"), ("may", "msa"), ("mac", "mkd"), ("rum", "ron"),
    ("slo", "slk"), ("wel", "cym"),
];

/// Primary language subtag of a caption language tag, lowercased
///
/// `"en-US"` and `"pt_BR"` yield `"en"` and `"pt"`.
pub fn primary_subtag(tag: &str) -> String {
    tag.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

fn lookup(tag: &str) -> Option<Language> {
    let code = primary_subtag(tag);
    match code.len() {
        2 => Language::from_639_1(&code),
        3 => {
            let part2t = BIBLIOGRAPHIC_CODES.iter()
                .find(|(b, _)| *b == code)
                .map(|(_, t)| *t)
                .unwrap_or(code.as_str());
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Validate a caption language tag
pub fn validate_language_code(tag: &str) -> Result<()> {
    lookup(tag)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Invalid language code: {}", tag))
}

/// Normalize a language tag to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(tag: &str) -> Result<String> {
    lookup(tag)
        .map(|lang| lang.to_639_3().to_string())
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", tag))
}

/// Normalize a language tag to ISO 639-1 (2-letter) format if possible
///
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists. This is the form
/// the caption endpoint expects in its `lang` parameter.
pub fn normalize_to_part1_or_part2t(tag: &str) -> Result<String> {
    let lang = lookup(tag).ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", tag))?;
    Ok(lang.to_639_1()
        .map(str::to_string)
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}

/// Check if two language tags name the same language
pub fn language_codes_match(tag1: &str, tag2: &str) -> bool {
    match (lookup(tag1), lookup(tag2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a tag
pub fn get_language_name(tag: &str) -> Result<String> {
    let lang = lookup(tag).ok_or_else(|| anyhow!("Failed to get language from code: {}", tag))?;
    Ok(lang.to_name().to_string())
}

/// Whether the tag names Japanese
pub fn is_japanese(tag: &str) -> bool {
    lookup(tag) == Some(Language::Jpn)
}
