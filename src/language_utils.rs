/*!
 * Language utilities for ISO language code handling.
 *
 * Backends expect short codes (`id`, `fr`), while users may type ISO 639-2
 * codes (`ind`, `fre`). Everything is normalized through `isolang`.
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// Pseudo-code meaning "let the backend detect the source language"
pub const AUTO: &str = "auto";

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("geo", "kat"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("ice", "isl"),
    ("mac", "mkd"),
    ("may", "msa"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Whether the code asks for source-language detection
pub fn is_auto(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(AUTO)
}

fn lookup(code: &str) -> Option<Language> {
    let code = code.trim().to_lowercase();
    match code.len() {
        2 => Language::from_639_1(&code),
        3 => {
            let terminologic = BIBLIOGRAPHIC_CODES
                .iter()
                .find(|(b, _)| *b == code)
                .map(|(_, t)| *t)
                .unwrap_or(code.as_str());
            Language::from_639_3(terminologic)
        }
        _ => None,
    }
}

/// Validate a language code; `auto` is accepted only when `allow_auto` is set
pub fn validate_language_code(code: &str, allow_auto: bool) -> Result<()> {
    if allow_auto && is_auto(code) {
        return Ok(());
    }
    lookup(code)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to the short form expected by translation backends
///
/// Returns the ISO 639-1 code when one exists, the ISO 639-3 code otherwise.
/// `auto` passes through unchanged.
pub fn to_backend_code(code: &str) -> Result<String> {
    if is_auto(code) {
        return Ok(AUTO.to_string());
    }
    let lang = lookup(code).ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;
    Ok(lang
        .to_639_1()
        .map(str::to_string)
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (lookup(code1), lookup(code2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    if is_auto(code) {
        return Ok("auto-detected".to_string());
    }
    let lang = lookup(code).ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;
    Ok(lang.to_name().to_string())
}
