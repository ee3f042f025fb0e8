//! Fixed-rate currency conversion and display formatting.
//!
//! Rates are approximate demo values. Conversion is one hop through a fixed
//! table; unknown pairs return the input unchanged. Do not use for real money.

use super::language::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    Usd,
    Sek,
    Sar,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Sek => "SEK",
            Self::Sar => "SAR",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Sek => "kr",
            Self::Sar => "ر.س",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "USD" => Some(Self::Usd),
            "SEK" => Some(Self::Sek),
            "SAR" => Some(Self::Sar),
            _ => None,
        }
    }

    /// Display currency for a UI language.
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Sv => Self::Sek,
            Language::Ar => Self::Sar,
            Language::En => Self::Usd,
        }
    }

    /// Multiplier from `self` into `to`.
    pub fn rate_to(self, to: Currency) -> f64 {
        match (self, to) {
            (Self::Usd, Self::Usd) | (Self::Sek, Self::Sek) | (Self::Sar, Self::Sar) => 1.0,
            (Self::Usd, Self::Sek) => 10.5,
            (Self::Usd, Self::Sar) => 3.75,
            (Self::Sek, Self::Usd) => 0.095,
            (Self::Sek, Self::Sar) => 0.36,
            (Self::Sar, Self::Usd) => 0.27,
            (Self::Sar, Self::Sek) => 2.8,
        }
    }
}

/// Converts `amount` between currency codes.
///
/// - Same code: returned unchanged, no rounding.
/// - Known pair: `round(amount * rate)`.
/// - Unknown code: returned unchanged.
pub fn convert_amount(amount: f64, from: &str, to: &str) -> f64 {
    if from.trim().eq_ignore_ascii_case(to.trim()) {
        return amount;
    }
    match (Currency::from_code(from), Currency::from_code(to)) {
        (Some(from), Some(to)) => (amount * from.rate_to(to)).round(),
        _ => amount,
    }
}

/// Formats an amount stored in `currency_code` for display in `language`,
/// converting into the language's currency first.
pub fn format_amount(amount: f64, currency_code: &str, language: Language) -> String {
    let target = Currency::for_language(language);
    let converted = convert_amount(amount, currency_code, target.code());
    match language {
        Language::Sv => format!(
            "{} {}",
            group_digits(converted, '\u{00A0}', ','),
            target.symbol()
        ),
        Language::Ar => format!(
            "{} {}",
            target.symbol(),
            to_arabic_indic(&group_digits(converted, '\u{066C}', '\u{066B}'))
        ),
        Language::En => format!("{}{}", target.symbol(), group_digits(converted, ',', '.')),
    }
}

/// Groups whole digits and keeps up to three fraction digits.
fn group_digits(amount: f64, separator: char, decimal_mark: char) -> String {
    let thousandths = (amount.abs() * 1000.0).round() as u64;
    let negative = amount < 0.0 && thousandths > 0;
    let whole = thousandths / 1000;
    let fraction_digits = thousandths % 1000;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(digit);
    }

    if fraction_digits > 0 {
        let fraction = format!("{fraction_digits:03}");
        grouped.push(decimal_mark);
        grouped.push_str(fraction.trim_end_matches('0'));
    }
    if negative {
        grouped.insert(0, '-');
    }
    grouped
}

fn to_arabic_indic(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch.to_digit(10) {
            Some(digit) => char::from_u32(0x0660 + digit).unwrap_or(ch),
            None => ch,
        })
        .collect()
}
