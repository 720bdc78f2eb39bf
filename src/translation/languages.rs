//! Supported languages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::TranslationError;

/// Target languages offered on the language selection screen
pub const TARGET_LANGUAGES: &[(&str, &str)] = &[
    ("Chinese", "zh"),
    ("Devanagari", "hi"),
    ("Japanese", "ja"),
    ("Korean", "ko"),
    ("English", "en"),
];

/// A validated language code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display name from the selection list
    pub fn display_name(&self) -> &'static str {
        TARGET_LANGUAGES
            .iter()
            .find(|(_, code)| *code == self.0)
            .map(|(name, _)| *name)
            .unwrap_or("Unknown")
    }

    /// All selectable languages
    pub fn all() -> impl Iterator<Item = LanguageCode> {
        TARGET_LANGUAGES.iter().map(|(_, code)| LanguageCode(code.to_string()))
    }
}

impl FromStr for LanguageCode {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        if TARGET_LANGUAGES.iter().any(|(_, c)| *c == code) {
            Ok(LanguageCode(code))
        } else {
            Err(TranslationError::UnsupportedLanguage(s.to_string()))
        }
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = TranslationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed source language plus chosen target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguagePair {
    pub source: LanguageCode,
    pub target: LanguageCode,
}

impl LanguagePair {
    pub fn new(source: LanguageCode, target: LanguageCode) -> Self {
        Self { source, target }
    }

    /// Same language on both sides needs no translation
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_codes() {
        let ja: LanguageCode = "ja".parse().unwrap();
        assert_eq!(ja.as_str(), "ja");
        assert_eq!(ja.display_name(), "Japanese");

        let en: LanguageCode = " EN ".parse().unwrap();
        assert_eq!(en.as_str(), "en");
    }

    #[test]
    fn test_parse_unknown_code() {
        let err = "xx".parse::<LanguageCode>().unwrap_err();
        assert!(matches!(err, TranslationError::UnsupportedLanguage(code) if code == "xx"));
    }

    #[test]
    fn test_all_languages() {
        let codes: Vec<String> = LanguageCode::all().map(String::from).collect();
        assert_eq!(codes, vec!["zh", "hi", "ja", "ko", "en"]);
    }

    #[test]
    fn test_pair_identity() {
        let ko: LanguageCode = "ko".parse().unwrap();
        let en: LanguageCode = "en".parse().unwrap();
        assert!(LanguagePair::new(ko.clone(), ko.clone()).is_identity());
        assert!(!LanguagePair::new(ko.clone(), en.clone()).is_identity());
        assert_eq!(LanguagePair::new(ko, en).to_string(), "ko->en");
    }
}
