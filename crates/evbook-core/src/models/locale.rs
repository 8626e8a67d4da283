use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported interface languages. Portuguese is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    #[default]
    Pt,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Pt];

    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Pt => "pt",
        }
    }

    /// Pick a locale from an Accept-Language header or a `LANG`-style value.
    /// Portuguese wins when both languages are mentioned.
    pub fn detect(preference: Option<&str>) -> Self {
        let Some(value) = preference.map(str::to_ascii_lowercase) else {
            return Locale::default();
        };
        if value.contains("pt") {
            Locale::Pt
        } else if value.contains("en") {
            Locale::En
        } else {
            Locale::default()
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "pt" => Ok(Locale::Pt),
            other => Err(format!("unsupported locale '{}' (expected en or pt)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(Locale::detect(Some("en-US,en;q=0.9")), Locale::En);
        assert_eq!(Locale::detect(Some("en_GB.UTF-8")), Locale::En);
        assert_eq!(Locale::detect(Some("pt-BR,pt;q=0.9")), Locale::Pt);
        assert_eq!(Locale::detect(Some("pt-BR,en;q=0.5")), Locale::Pt);
        assert_eq!(Locale::detect(Some("fr-FR")), Locale::Pt);
        assert_eq!(Locale::detect(None), Locale::Pt);
    }

    #[test]
    fn test_parse() {
        assert_eq!("en".parse::<Locale>(), Ok(Locale::En));
        assert_eq!(" PT ".parse::<Locale>(), Ok(Locale::Pt));
        assert!("es".parse::<Locale>().is_err());
    }

    #[test]
    fn test_serde_uses_codes() {
        assert_eq!(serde_json::to_string(&Locale::En).unwrap(), "\"en\"");
        assert_eq!(serde_json::from_str::<Locale>("\"pt\"").unwrap(), Locale::Pt);
    }
}
