use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

/// The set of languages the storefront can render. Stored per user as the lowercase ISO-639 code.
pub const SUPPORTED_LOCALES: [Locale; 2] = [Locale::En, Locale::Es];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    pub fn native_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Es => "Español",
        }
    }

    /// The currency assumed for a price when the caller does not name one explicitly.
    pub fn default_currency_code(&self) -> &'static str {
        match self {
            Self::En => "USD",
            Self::Es => "EUR",
        }
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Unsupported locale: {0}. Supported locales are: en, es")]
pub struct UnsupportedLocaleError(pub String);

impl FromStr for Locale {
    type Err = UnsupportedLocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            _ => Err(UnsupportedLocaleError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_codes_loosely() {
        assert_eq!(" EN ".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!("es".parse::<Locale>().unwrap(), Locale::Es);
        let err = "fr".parse::<Locale>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported locale: fr. Supported locales are: en, es");
    }

    #[test]
    fn maps_to_a_default_currency() {
        assert_eq!(Locale::En.default_currency_code(), "USD");
        assert_eq!(Locale::Es.default_currency_code(), "EUR");
    }

    #[test]
    fn displays_as_the_iso_code() {
        assert_eq!(Locale::En.to_string(), "en");
        assert_eq!(Locale::Es.to_string(), "es");
        assert_eq!(Locale::default(), Locale::En);
    }
}
