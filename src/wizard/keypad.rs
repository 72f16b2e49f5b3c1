//! Keypad Input
//!
//! Digit accumulator shared by custom amount entry and PIN/OTP entry,
//! plus the amount display formatting used next to it.
//!
//! - **Amount**: starts at "0", at most one decimal point, 12 characters max
//! - **Pin**: starts empty, digits only, exactly 6 needed to complete

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Digits in a PIN or one-time code
pub const CODE_LENGTH: usize = 6;

/// Longest amount string the keypad will build
pub const MAX_AMOUNT_CHARS: usize = 12;

/// One key on the on-screen keypad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Digit(u8),
    Decimal,
    Backspace,
}

impl Key {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0'..='9' => Some(Key::Digit(c as u8 - b'0')),
            '.' => Some(Key::Decimal),
            '\u{8}' | '⌫' => Some(Key::Backspace),
            _ => None,
        }
    }
}

impl std::str::FromStr for Key {
    type Err = String;

    /// Accepts a single digit, ".", or "backspace"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("backspace") || trimmed.eq_ignore_ascii_case("delete") {
            return Ok(Key::Backspace);
        }

        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Key::from_char(c).ok_or_else(|| format!("Unknown key: {}", s)),
            _ => Err(format!("Unknown key: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeypadMode {
    Amount,
    Pin,
}

/// Accumulated keypad value
///
/// The buffer is wiped on drop so a PIN never lingers in freed memory.
#[derive(Clone)]
pub struct Keypad {
    mode: KeypadMode,
    buffer: Zeroizing<String>,
}

impl Keypad {
    pub fn amount() -> Self {
        Self {
            mode: KeypadMode::Amount,
            buffer: Zeroizing::new("0".to_string()),
        }
    }

    pub fn pin() -> Self {
        Self {
            mode: KeypadMode::Pin,
            buffer: Zeroizing::new(String::new()),
        }
    }

    /// One-time codes follow the PIN rules
    pub fn otp() -> Self {
        Self::pin()
    }

    pub fn mode(&self) -> KeypadMode {
        self.mode
    }

    pub fn value(&self) -> &str {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// A PIN is complete at 6 digits; an amount is never "complete"
    pub fn is_complete(&self) -> bool {
        self.mode == KeypadMode::Pin && self.buffer.len() == CODE_LENGTH
    }

    /// Back to the initial value for this mode
    pub fn clear(&mut self) {
        *self = match self.mode {
            KeypadMode::Amount => Self::amount(),
            KeypadMode::Pin => Self::pin(),
        };
    }

    /// Apply a key press. Returns false when the key was ignored.
    pub fn press(&mut self, key: Key) -> bool {
        match self.mode {
            KeypadMode::Amount => self.press_amount(key),
            KeypadMode::Pin => self.press_pin(key),
        }
    }

    fn press_amount(&mut self, key: Key) -> bool {
        match key {
            Key::Backspace => {
                if self.buffer.as_str() == "0" {
                    return false;
                }
                self.buffer.pop();
                if self.buffer.is_empty() {
                    self.buffer.push('0');
                }
                true
            }
            Key::Decimal => {
                if self.buffer.contains('.') || self.buffer.len() >= MAX_AMOUNT_CHARS {
                    return false;
                }
                self.buffer.push('.');
                true
            }
            Key::Digit(d) if d <= 9 => {
                if self.buffer.as_str() == "0" {
                    self.buffer.clear();
                } else if self.buffer.len() >= MAX_AMOUNT_CHARS {
                    return false;
                }
                self.buffer.push(char::from(b'0' + d));
                true
            }
            Key::Digit(_) => false,
        }
    }

    fn press_pin(&mut self, key: Key) -> bool {
        match key {
            Key::Backspace => self.buffer.pop().is_some(),
            Key::Digit(d) if d <= 9 && self.buffer.len() < CODE_LENGTH => {
                self.buffer.push(char::from(b'0' + d));
                true
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Keypad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Keypad");
        out.field("mode", &self.mode);
        match self.mode {
            KeypadMode::Amount => out.field("value", &self.buffer.as_str()),
            KeypadMode::Pin => out.field("digits", &self.buffer.len()),
        };
        out.finish()
    }
}

// =============================================================================
// Formatting
// =============================================================================

/// Format an amount string for display: "1234.5" → "1,234.5"
///
/// Keeps the fractional part exactly as typed, trailing "." included.
pub fn format_with_commas(value: &str) -> String {
    let clean: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if clean.is_empty() || clean == "0" {
        return "0".to_string();
    }

    let mut parts = clean.split('.');
    let integer = parts.next().unwrap_or_default();
    let grouped = group_thousands(integer);

    match parts.next() {
        Some(fraction) => format!("{}.{}", grouped, fraction),
        None => grouped,
    }
}

/// Insert a comma every three digits from the right
pub fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

/// Numeric value of a (possibly comma-formatted) amount string
pub fn parse_amount(value: &str) -> Option<f64> {
    let clean: String = value.chars().filter(|c| *c != ',').collect();
    clean.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
