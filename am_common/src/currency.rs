//! Locale-aware rendering and parsing of monetary amounts, plus the rounding rules used for
//! tax and discount arithmetic.
//!
//! Amounts are carried as [`Cents`] everywhere inside the engine. This module is the only place
//! that turns them into strings (or back), so the grouping, decimal separator and symbol
//! placement rules for each [`Locale`] live here and nowhere else.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal,
    RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;

use crate::{Cents, Locale};

#[derive(Debug, Clone, Error)]
pub enum CurrencyError {
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),
    #[error("Cannot read '{input}' as a monetary amount: {reason}")]
    UnparseableAmount { input: String, reason: String },
    #[error("Amount is out of range: {0}")]
    AmountOutOfRange(String),
}

/// Looks up the ISO-4217 currency for a code such as "USD". Case and surrounding whitespace are
/// ignored.
pub fn currency_for_code(code: &str) -> Result<&'static Currency, CurrencyError> {
    let code = code.trim().to_uppercase();
    iso::find(&code).ok_or(CurrencyError::UnknownCurrency(code))
}

/// How a locale writes a number: which separators it uses and where the currency symbol sits.
struct LocaleLayout {
    group_sep: char,
    decimal_sep: char,
    symbol_first: bool,
}

fn layout(locale: Locale) -> LocaleLayout {
    match locale {
        Locale::En => LocaleLayout { group_sep: ',', decimal_sep: '.', symbol_first: true },
        Locale::Es => LocaleLayout { group_sep: '.', decimal_sep: ',', symbol_first: false },
    }
}

enum SignStyle {
    Minus,
    Parentheses,
}

/// Renders an amount for display. `format_money(Cents::from(123456), "USD", Locale::En)` is
/// `$1,234.56`; the same amount in EUR under `Locale::Es` is `1.234,56 €`.
pub fn format_money(amount: Cents, code: &str, locale: Locale) -> Result<String, CurrencyError> {
    render_money(amount, code, locale, SignStyle::Minus)
}

/// As [`format_money`], but negative amounts are wrapped in parentheses rather than carrying a
/// leading minus. `($1,234.56)` is the style ledgers and invoices expect.
pub fn format_money_accounting(amount: Cents, code: &str, locale: Locale) -> Result<String, CurrencyError> {
    render_money(amount, code, locale, SignStyle::Parentheses)
}

/// A locale-independent rendering for logs and audit records: `USD 1234.56`. No grouping, always
/// a `.` decimal point, ISO code instead of symbol.
pub fn format_money_fixed(amount: Cents, code: &str) -> Result<String, CurrencyError> {
    let currency = currency_for_code(code)?;
    let sign = if amount.is_negative() { "-" } else { "" };
    let (units, frac) = split_minor(amount.value().unsigned_abs(), currency.exponent);
    if frac.is_empty() {
        Ok(format!("{} {sign}{units}", currency.iso_alpha_code))
    } else {
        Ok(format!("{} {sign}{units}.{frac}", currency.iso_alpha_code))
    }
}

/// Renders large amounts with a K/M/B suffix and one decimal place, e.g. `$1.2M`. Amounts under
/// 1000 major units fall back to [`format_money`].
pub fn format_money_compact(amount: Cents, code: &str, locale: Locale) -> Result<String, CurrencyError> {
    let currency = currency_for_code(code)?;
    let minor_per_unit = 10_i64.pow(currency.exponent);
    let major = amount.value().abs() / minor_per_unit;
    if major < 1_000 {
        return format_money(amount, code, locale);
    }
    let (step, suffix) = if major >= 1_000_000_000 {
        (1_000_000_000_i64, "B")
    } else if major >= 1_000_000 {
        (1_000_000_i64, "M")
    } else {
        (1_000_i64, "K")
    };
    let Some(minor) = Decimal::from_i64(amount.value().abs()) else {
        unreachable!("always returns `Some` for every `i64`")
    };
    let Some(divisor) = Decimal::from_i64(step * minor_per_unit) else {
        unreachable!("always returns `Some` for every `i64`")
    };
    let scaled = (minor / divisor).round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero).normalize();
    let lay = layout(locale);
    let mut body = scaled.to_string();
    if lay.decimal_sep != '.' {
        body = body.replace('.', &lay.decimal_sep.to_string());
    }
    body.push_str(suffix);
    let body = place_symbol(&body, currency.symbol, &lay);
    if amount.is_negative() {
        Ok(format!("-{body}"))
    } else {
        Ok(body)
    }
}

/// Renders a plain number with the locale's separators. Trailing zeros are stripped first.
pub fn format_number(value: Decimal, locale: Locale) -> String {
    let lay = layout(locale);
    let value = value.normalize();
    let text = value.abs().to_string();
    let (units, frac) = match text.split_once('.') {
        Some((units, frac)) => (units.to_string(), frac.to_string()),
        None => (text, String::new()),
    };
    let mut out = String::new();
    if value.is_sign_negative() {
        out.push('-');
    }
    out.push_str(&group_digits(&units, lay.group_sep));
    if !frac.is_empty() {
        out.push(lay.decimal_sep);
        out.push_str(&frac);
    }
    out
}

/// Renders a fractional rate as percent points. `Percentage::from(0.075)` becomes `7.5%` in
/// English and `7,5%` in Spanish. Rounded to two decimal places.
pub fn format_percent(rate: Percentage, locale: Locale) -> String {
    let points = ((rate * Decimal::ONE) * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let lay = layout(locale);
    let mut body = points.to_string();
    if lay.decimal_sep != '.' {
        body = body.replace('.', &lay.decimal_sep.to_string());
    }
    format!("{body}%")
}

/// Parses a display string back into [`Cents`]. Accepts the output of [`format_money`],
/// [`format_money_accounting`] and [`format_money_fixed`] for the given locale, as well as bare
/// numbers. Group separators and currency markers are stripped, the locale's decimal separator
/// is honoured, and parentheses or a leading minus mark the amount negative.
pub fn parse_money(input: &str, code: &str, locale: Locale) -> Result<Cents, CurrencyError> {
    let currency = currency_for_code(code)?;
    let lay = layout(locale);
    let trimmed = input.trim();
    let (body, parenthesised) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (inner, true),
        None => (trimmed, false),
    };
    let body = body.replace(currency.symbol, "").replace(currency.iso_alpha_code, "");
    let body = body.trim();
    let (body, minus) = match body.strip_prefix('-') {
        Some(rest) => (rest.trim_start(), true),
        None => (body, false),
    };
    let negative = parenthesised || minus;
    let mut normalised = String::with_capacity(body.len());
    for ch in body.chars() {
        if ch == lay.group_sep || ch == ' ' || ch == '\u{a0}' {
            continue;
        }
        if ch == lay.decimal_sep {
            normalised.push('.');
        } else if ch.is_ascii_digit() {
            normalised.push(ch);
        } else {
            return Err(CurrencyError::UnparseableAmount {
                input: input.to_string(),
                reason: format!("unexpected character '{ch}'"),
            });
        }
    }
    if normalised.is_empty() || normalised == "." {
        return Err(CurrencyError::UnparseableAmount { input: input.to_string(), reason: "no digits".to_string() });
    }
    let value = Decimal::from_str_exact(&normalised)
        .map_err(|e| CurrencyError::UnparseableAmount { input: input.to_string(), reason: e.to_string() })?
        .normalize();
    if value.scale() > currency.exponent {
        return Err(CurrencyError::UnparseableAmount {
            input: input.to_string(),
            reason: format!("more than {} decimal places", currency.exponent),
        });
    }
    let Some(factor) = Decimal::from_i64(10_i64.pow(currency.exponent)) else {
        unreachable!("always returns `Some` for every `i64`")
    };
    let minor = value
        .checked_mul(factor)
        .and_then(|m| m.to_i64())
        .ok_or_else(|| CurrencyError::AmountOutOfRange(trimmed.to_string()))?;
    Ok(Cents::from(if negative { -minor } else { minor }))
}

/// The tax due on a subtotal at a fractional rate, rounded half away from zero to a whole cent.
pub fn tax_amount(subtotal: Cents, rate: Percentage) -> Result<Cents, CurrencyError> {
    percent_of(subtotal, rate)
}

pub fn add_tax(subtotal: Cents, rate: Percentage) -> Result<Cents, CurrencyError> {
    Ok(subtotal + tax_amount(subtotal, rate)?)
}

/// The amount knocked off a price by a fractional discount rate, rounded half away from zero.
pub fn discount_amount(price: Cents, rate: Percentage) -> Result<Cents, CurrencyError> {
    percent_of(price, rate)
}

pub fn apply_discount(price: Cents, rate: Percentage) -> Result<Cents, CurrencyError> {
    let cut = discount_amount(price, rate)?;
    Ok(Cents::from(price.value().saturating_sub(cut.value())))
}

/// Wraps an amount in a [`Money`] value for interop with code that works in currency-checked
/// arithmetic.
pub fn to_money(amount: Cents, code: &str) -> Result<Money<'static, Currency>, CurrencyError> {
    let currency = currency_for_code(code)?;
    Ok(Money::from_minor(amount.value(), currency))
}

pub fn from_money(money: &Money<'static, Currency>) -> Cents {
    Cents::from(money.to_minor_units())
}

fn percent_of(amount: Cents, rate: Percentage) -> Result<Cents, CurrencyError> {
    let Some(minor) = Decimal::from_i64(amount.value()) else {
        unreachable!("always returns `Some` for every `i64`")
    };
    let rate = rate * Decimal::ONE;
    let applied = rate
        .checked_mul(minor)
        .ok_or_else(|| CurrencyError::AmountOutOfRange(format!("{rate} of {amount}")))?;
    let rounded = applied.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    match rounded.to_i64() {
        Some(v) => Ok(Cents::from(v)),
        None => Err(CurrencyError::AmountOutOfRange(format!("{rate} of {amount}"))),
    }
}

fn place_symbol(body: &str, symbol: &str, lay: &LocaleLayout) -> String {
    if lay.symbol_first {
        format!("{symbol}{body}")
    } else {
        format!("{body} {symbol}")
    }
}

fn render_money(amount: Cents, code: &str, locale: Locale, sign: SignStyle) -> Result<String, CurrencyError> {
    let currency = currency_for_code(code)?;
    let lay = layout(locale);
    let (units, frac) = split_minor(amount.value().unsigned_abs(), currency.exponent);
    let mut body = group_digits(&units, lay.group_sep);
    if !frac.is_empty() {
        body.push(lay.decimal_sep);
        body.push_str(&frac);
    }
    let body = place_symbol(&body, currency.symbol, &lay);
    Ok(match (sign, amount.is_negative()) {
        (_, false) => body,
        (SignStyle::Minus, true) => format!("-{body}"),
        (SignStyle::Parentheses, true) => format!("({body})"),
    })
}

/// Splits an absolute minor-unit amount into whole-unit digits and zero-padded fraction digits.
/// Zero-exponent currencies such as JPY get an empty fraction.
fn split_minor(minor: u64, exponent: u32) -> (String, String) {
    if exponent == 0 {
        return (minor.to_string(), String::new());
    }
    let scale = 10_u64.pow(exponent);
    let units = minor / scale;
    let frac = minor % scale;
    (units.to_string(), format!("{frac:0width$}", width = exponent as usize))
}

/// Inserts a thousands separator every three digits, counted from the right.
fn group_digits(digits: &str, sep: char) -> String {
    let len = digits.chars().count();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn formats_english_amounts() {
        assert_eq!(format_money(Cents::from(123456), "USD", Locale::En).unwrap(), "$1,234.56");
        assert_eq!(format_money(Cents::from(5), "USD", Locale::En).unwrap(), "$0.05");
        assert_eq!(format_money(Cents::from(123456789), "USD", Locale::En).unwrap(), "$1,234,567.89");
        assert_eq!(format_money(Cents::from(-123456), "USD", Locale::En).unwrap(), "-$1,234.56");
    }

    #[test]
    fn formats_spanish_amounts() {
        assert_eq!(format_money(Cents::from(123456), "EUR", Locale::Es).unwrap(), "1.234,56 €");
        assert_eq!(format_money(Cents::from(99), "EUR", Locale::Es).unwrap(), "0,99 €");
        assert_eq!(format_money(Cents::from(-123456), "EUR", Locale::Es).unwrap(), "-1.234,56 €");
    }

    #[test]
    fn formats_zero_exponent_currencies_without_a_fraction() {
        assert_eq!(format_money(Cents::from(1234), "JPY", Locale::En).unwrap(), "¥1,234");
    }

    #[test]
    fn accounting_style_wraps_negatives_in_parentheses() {
        assert_eq!(format_money_accounting(Cents::from(-123456), "USD", Locale::En).unwrap(), "($1,234.56)");
        assert_eq!(format_money_accounting(Cents::from(-123456), "EUR", Locale::Es).unwrap(), "(1.234,56 €)");
        assert_eq!(format_money_accounting(Cents::from(123456), "USD", Locale::En).unwrap(), "$1,234.56");
    }

    #[test]
    fn fixed_format_is_locale_independent() {
        assert_eq!(format_money_fixed(Cents::from(123456), "USD").unwrap(), "USD 1234.56");
        assert_eq!(format_money_fixed(Cents::from(-1200), "USD").unwrap(), "USD -12.00");
        assert_eq!(format_money_fixed(Cents::from(1234), "JPY").unwrap(), "JPY 1234");
    }

    #[test]
    fn compact_format_abbreviates_large_amounts() {
        assert_eq!(format_money_compact(Cents::from(123_456_789), "USD", Locale::En).unwrap(), "$1.2M");
        assert_eq!(format_money_compact(Cents::from(459_900), "USD", Locale::En).unwrap(), "$4.6K");
        assert_eq!(format_money_compact(Cents::from(100_000_000), "USD", Locale::En).unwrap(), "$1M");
        assert_eq!(format_money_compact(Cents::from(250_000_000_000), "USD", Locale::En).unwrap(), "$2.5B");
        assert_eq!(format_money_compact(Cents::from(-123_456_789), "USD", Locale::En).unwrap(), "-$1.2M");
        assert_eq!(format_money_compact(Cents::from(123_456_789), "EUR", Locale::Es).unwrap(), "1,2M €");
    }

    #[test]
    fn compact_format_falls_back_below_one_thousand() {
        assert_eq!(format_money_compact(Cents::from(99_900), "USD", Locale::En).unwrap(), "$999.00");
    }

    #[test]
    fn formats_plain_numbers() {
        assert_eq!(format_number(Decimal::new(1_234_567_891, 3), Locale::En), "1,234,567.891");
        assert_eq!(format_number(Decimal::new(1_234_567_891, 3), Locale::Es), "1.234.567,891");
        assert_eq!(format_number(Decimal::new(-4_500, 2), Locale::En), "-45");
        assert_eq!(format_number(Decimal::new(12, 0), Locale::Es), "12");
    }

    #[test]
    fn formats_percent_points() {
        assert_eq!(format_percent(Percentage::from(0.075), Locale::En), "7.5%");
        assert_eq!(format_percent(Percentage::from(0.075), Locale::Es), "7,5%");
        assert_eq!(format_percent(Percentage::from(0.21), Locale::En), "21%");
    }

    #[test]
    fn parses_formatted_amounts_back() {
        assert_eq!(parse_money("$1,234.56", "USD", Locale::En).unwrap(), Cents::from(123456));
        assert_eq!(parse_money("1.234,56 €", "EUR", Locale::Es).unwrap(), Cents::from(123456));
        assert_eq!(parse_money("($1,234.56)", "USD", Locale::En).unwrap(), Cents::from(-123456));
        assert_eq!(parse_money("-45.99", "USD", Locale::En).unwrap(), Cents::from(-4599));
        assert_eq!(parse_money("USD 45.99", "USD", Locale::En).unwrap(), Cents::from(4599));
        assert_eq!(parse_money("¥1,234", "JPY", Locale::En).unwrap(), Cents::from(1234));
        assert_eq!(parse_money("  12  ", "USD", Locale::En).unwrap(), Cents::from(1200));
    }

    #[test]
    fn rejects_unparseable_amounts() {
        assert!(matches!(
            parse_money("1.999", "USD", Locale::En),
            Err(CurrencyError::UnparseableAmount { .. })
        ));
        assert!(matches!(parse_money("abc", "USD", Locale::En), Err(CurrencyError::UnparseableAmount { .. })));
        assert!(matches!(parse_money("", "USD", Locale::En), Err(CurrencyError::UnparseableAmount { .. })));
        assert!(matches!(parse_money("12.00", "XXX", Locale::En), Err(CurrencyError::UnknownCurrency(_))));
    }

    #[test]
    fn finds_currencies_case_insensitively() {
        assert_eq!(currency_for_code(" usd ").unwrap().iso_alpha_code, "USD");
        assert_eq!(currency_for_code("eur").unwrap().exponent, 2);
        assert!(matches!(currency_for_code("XXX"), Err(CurrencyError::UnknownCurrency(_))));
    }

    #[test]
    fn tax_rounds_half_away_from_zero() {
        let rate = Percentage::from(0.075);
        assert_eq!(tax_amount(Cents::from(4599), rate).unwrap(), Cents::from(345));
        assert_eq!(add_tax(Cents::from(4599), rate).unwrap(), Cents::from(4944));
        assert_eq!(tax_amount(Cents::from(0), rate).unwrap(), Cents::from(0));
    }

    #[test]
    fn discounts_round_half_away_from_zero() {
        assert_eq!(discount_amount(Cents::from(4599), Percentage::from(0.25)).unwrap(), Cents::from(1150));
        assert_eq!(apply_discount(Cents::from(4599), Percentage::from(0.25)).unwrap(), Cents::from(3449));
        assert_eq!(apply_discount(Cents::from(10000), Percentage::from(0.2)).unwrap(), Cents::from(8000));
        assert_eq!(apply_discount(Cents::from(100), Percentage::from(1.0)).unwrap(), Cents::from(0));
    }

    #[test]
    fn converts_to_and_from_money() {
        let money = to_money(Cents::from(4599), "USD").unwrap();
        assert_eq!(money.to_minor_units(), 4599);
        assert_eq!(money.currency().iso_alpha_code, "USD");
        assert_eq!(from_money(&money), Cents::from(4599));
    }
}
