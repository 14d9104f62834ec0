use std::fmt;

use serde::{Deserialize, Serialize};

/// Amounts are stored as integer cents: R$ 50,00 = 5000 cents.
/// The sign of a transaction lives in its `Kind`, never in the amount.
pub type Cents = i64;

/// Largest amount a single transaction may carry (R$ 10 trillion).
pub const MAX_AMOUNT_CENTS: Cents = 1_000_000_000_000_000;

/// Format cents with two decimals and a dot separator.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

/// Format cents the way the dashboard shows money: thousands grouped,
/// e.g. 123456789 -> "1,234,567.89".
pub fn format_grouped(cents: Cents) -> String {
    let plain = format_cents(cents.abs());
    let (units, decimals) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, ch) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if cents < 0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, decimals)
}

/// Parse a non-negative decimal amount into cents.
///
/// Accepts either `.` or `,` as the decimal separator ("12.50", "12,5"),
/// whole units ("100") and surrounding whitespace. More than two decimals,
/// negative values and amounts above `MAX_AMOUNT_CENTS` are rejected.
pub fn parse_amount(input: &str) -> Result<Cents, AmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AmountError::Empty);
    }
    if input.starts_with('-') {
        return Err(AmountError::Negative(input.to_string()));
    }
    let input = input.trim_start_matches('+');

    let normalized = input.replace(',', ".");
    let (units_str, decimal_str) = match normalized.split_once('.') {
        Some((units, decimals)) => (units, decimals),
        None => (normalized.as_str(), ""),
    };

    if decimal_str.contains('.') {
        return Err(AmountError::InvalidFormat(input.to_string()));
    }

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(units_str) || !all_digits(decimal_str) {
        return Err(AmountError::InvalidFormat(input.to_string()));
    }
    if units_str.is_empty() && decimal_str.is_empty() {
        return Err(AmountError::InvalidFormat(input.to_string()));
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str
            .parse()
            .map_err(|_| AmountError::InvalidFormat(input.to_string()))?
    };

    let decimal_cents: i64 = match decimal_str.len() {
        0 => 0,
        1 => i64::from(decimal_str.as_bytes()[0] - b'0') * 10,
        2 => decimal_str
            .parse()
            .map_err(|_| AmountError::InvalidFormat(input.to_string()))?,
        _ => return Err(AmountError::TooManyDecimals(input.to_string())),
    };

    units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .filter(|cents| *cents <= MAX_AMOUNT_CENTS)
        .ok_or_else(|| AmountError::TooLarge(input.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    Empty,
    Negative(String),
    InvalidFormat(String),
    TooManyDecimals(String),
    TooLarge(String),
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Empty => write!(f, "amount is empty"),
            AmountError::Negative(s) => write!(f, "amount must not be negative: {}", s),
            AmountError::InvalidFormat(s) => write!(f, "invalid amount format: {}", s),
            AmountError::TooManyDecimals(s) => {
                write!(f, "amount has more than two decimals: {}", s)
            }
            AmountError::TooLarge(s) => write!(f, "amount is too large: {}", s),
        }
    }
}

impl std::error::Error for AmountError {}

/// What to do with a stored row whose amount cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountPolicy {
    /// Drop the row from the snapshot.
    #[default]
    Reject,
    /// Keep the row with a zero amount.
    Coerce,
}

impl AmountPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmountPolicy::Reject => "reject",
            AmountPolicy::Coerce => "coerce",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "reject" => Some(AmountPolicy::Reject),
            "coerce" | "coerce-to-zero" | "zero" => Some(AmountPolicy::Coerce),
            _ => None,
        }
    }

    /// Apply the policy to a raw amount. `None` means the row is dropped;
    /// the boolean reports whether a zero was substituted.
    pub fn apply(&self, raw: &str) -> Option<(Cents, bool)> {
        match (parse_amount(raw), self) {
            (Ok(cents), _) => Some((cents, false)),
            (Err(_), AmountPolicy::Reject) => None,
            (Err(_), AmountPolicy::Coerce) => Some((0, true)),
        }
    }
}

impl fmt::Display for AmountPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
