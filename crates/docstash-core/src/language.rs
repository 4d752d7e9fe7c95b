//! Target-language tags accepted by the remote processing endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the fixed set of language tags sent with every upload.
///
/// Tags are lowercase English names as the endpoint expects them
/// (note `espanol`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Arabic,
    English,
    Espanol,
    French,
    German,
    Italian,
    Portuguese,
    Russian,
    Japanese,
    Korean,
    Chinese,
    Dutch,
    Swedish,
    Finnish,
    Norwegian,
    Danish,
    Polish,
    Turkish,
    Hindi,
    Bengali,
    Urdu,
    Greek,
    Czech,
    Vietnamese,
}

impl Language {
    pub const ALL: [Language; 24] = [
        Language::Arabic,
        Language::English,
        Language::Espanol,
        Language::French,
        Language::German,
        Language::Italian,
        Language::Portuguese,
        Language::Russian,
        Language::Japanese,
        Language::Korean,
        Language::Chinese,
        Language::Dutch,
        Language::Swedish,
        Language::Finnish,
        Language::Norwegian,
        Language::Danish,
        Language::Polish,
        Language::Turkish,
        Language::Hindi,
        Language::Bengali,
        Language::Urdu,
        Language::Greek,
        Language::Czech,
        Language::Vietnamese,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Language::Arabic => "arabic",
            Language::English => "english",
            Language::Espanol => "espanol",
            Language::French => "french",
            Language::German => "german",
            Language::Italian => "italian",
            Language::Portuguese => "portuguese",
            Language::Russian => "russian",
            Language::Japanese => "japanese",
            Language::Korean => "korean",
            Language::Chinese => "chinese",
            Language::Dutch => "dutch",
            Language::Swedish => "swedish",
            Language::Finnish => "finnish",
            Language::Norwegian => "norwegian",
            Language::Danish => "danish",
            Language::Polish => "polish",
            Language::Turkish => "turkish",
            Language::Hindi => "hindi",
            Language::Bengali => "bengali",
            Language::Urdu => "urdu",
            Language::Greek => "greek",
            Language::Czech => "czech",
            Language::Vietnamese => "vietnamese",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language '{0}'")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.tag() == wanted)
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}
