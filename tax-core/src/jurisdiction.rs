//! Canadian provinces and territories and the alias table used to resolve
//! user- and dataset-supplied names to a canonical two-letter code.
//!
//! Resolution accepts the code itself (`"ON"`, `"on"`), the full name in any
//! case (`"British Columbia"`), the name with spaces removed
//! (`"BritishColumbia"`), and accented spellings (`"Québec"`).
//!
//! ```
//! use tax_core::Jurisdiction;
//!
//! assert_eq!(Jurisdiction::normalize("Québec"), Some(Jurisdiction::QC));
//! assert_eq!(Jurisdiction::normalize("quebec"), Some(Jurisdiction::QC));
//! assert_eq!(Jurisdiction::normalize("NovaScotia"), Some(Jurisdiction::NS));
//! assert_eq!(Jurisdiction::normalize("Atlantis"), None);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical two-letter jurisdiction code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Jurisdiction {
    AB,
    BC,
    MB,
    NB,
    NL,
    NS,
    NT,
    NU,
    ON,
    PE,
    QC,
    SK,
    YT,
}

/// Full names and common alternates for every jurisdiction.
const ALIASES: &[(Jurisdiction, &[&str])] = &[
    (Jurisdiction::AB, &["Alberta"]),
    (Jurisdiction::BC, &["British Columbia"]),
    (Jurisdiction::MB, &["Manitoba"]),
    (Jurisdiction::NB, &["New Brunswick"]),
    (
        Jurisdiction::NL,
        &["Newfoundland and Labrador", "Newfoundland"],
    ),
    (Jurisdiction::NS, &["Nova Scotia"]),
    (Jurisdiction::NT, &["Northwest Territories", "NWT"]),
    (Jurisdiction::NU, &["Nunavut"]),
    (Jurisdiction::ON, &["Ontario"]),
    (Jurisdiction::PE, &["Prince Edward Island", "PEI"]),
    (Jurisdiction::QC, &["Québec", "Quebec"]),
    (Jurisdiction::SK, &["Saskatchewan"]),
    (Jurisdiction::YT, &["Yukon", "Yukon Territory"]),
];

impl Jurisdiction {
    pub const ALL: [Jurisdiction; 13] = [
        Self::AB,
        Self::BC,
        Self::MB,
        Self::NB,
        Self::NL,
        Self::NS,
        Self::NT,
        Self::NU,
        Self::ON,
        Self::PE,
        Self::QC,
        Self::SK,
        Self::YT,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AB => "AB",
            Self::BC => "BC",
            Self::MB => "MB",
            Self::NB => "NB",
            Self::NL => "NL",
            Self::NS => "NS",
            Self::NT => "NT",
            Self::NU => "NU",
            Self::ON => "ON",
            Self::PE => "PE",
            Self::QC => "QC",
            Self::SK => "SK",
            Self::YT => "YT",
        }
    }

    /// Official English name.
    pub fn name(&self) -> &'static str {
        ALIASES
            .iter()
            .find(|(code, _)| code == self)
            .map(|(_, names)| names[0])
            .unwrap_or_else(|| self.as_str())
    }

    /// Parses an exact two-letter code, ignoring case and surrounding
    /// whitespace. Full names are not accepted here; see [`Self::normalize`].
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|j| j.as_str().eq_ignore_ascii_case(code))
    }

    /// Resolves any registered spelling to its canonical code.
    pub fn normalize(raw: &str) -> Option<Self> {
        if let Some(code) = Self::from_code(raw) {
            return Some(code);
        }

        let key = alias_key(raw);
        if key.is_empty() {
            return None;
        }

        ALIASES
            .iter()
            .find(|(_, names)| names.iter().any(|name| alias_key(name) == key))
            .map(|(code, _)| *code)
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercases, strips accents and drops all whitespace so that
/// "Nova Scotia", "novascotia" and "NOVA  SCOTIA" compare equal.
fn alias_key(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| !c.is_whitespace())
        .map(fold_accent)
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ä' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        other => other,
    }
}
