mod helpers;
mod locale;
mod money;

pub mod currency;
pub mod op;

pub use helpers::parse_boolean_flag;
pub use locale::{Locale, UnsupportedLocaleError, SUPPORTED_LOCALES};
pub use money::{Cents, CentsConversionError};
