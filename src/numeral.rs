//! Numeral alphabet for KSW coordinates.
//!
//! Coordinates are written in a fixed-radix system with an optional leading
//! negative marker (`n18` is -18). The digit set lives in a single table so
//! that widening the alphabet is a one-line change.

/// Digit characters and the value each one contributes.
const DIGITS: [(u8, i64); 10] = [
    (b'0', 0),
    (b'1', 1),
    (b'2', 2),
    (b'3', 3),
    (b'4', 4),
    (b'5', 5),
    (b'6', 6),
    (b'7', 7),
    (b'8', 8),
    (b'9', 9),
];

/// Number of distinct digits, i.e. the radix.
pub const RADIX: i64 = DIGITS.len() as i64;

/// Prefix marking a negative number.
pub const NEGATIVE_MARKER: u8 = b'n';

/// Separator between the two fields of a coordinate pair.
pub const COORD_SEPARATOR: u8 = b'x';

/// Value of a single digit, or `None` if `c` is outside the alphabet.
pub fn digit_value(c: u8) -> Option<i64> {
    DIGITS.iter().find(|(d, _)| *d == c).map(|(_, v)| *v)
}

/// Whether `c` may appear inside a number (digit or negative marker).
pub fn is_numeral_char(c: u8) -> bool {
    c == NEGATIVE_MARKER || digit_value(c).is_some()
}

/// Why a number field failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumeralError {
    Empty,
    /// Byte offset (within the field) of the first bad character.
    BadDigit(usize),
    Overflow,
}

/// Parse one KSW number (`n?digit+`) into an `i32`.
pub fn parse_number(field: &str) -> Result<i32, NumeralError> {
    let bytes = field.as_bytes();
    let (negative, digits, start) = match bytes.first() {
        Some(&NEGATIVE_MARKER) => (true, &bytes[1..], 1),
        Some(_) => (false, bytes, 0),
        None => return Err(NumeralError::Empty),
    };
    if digits.is_empty() {
        return Err(NumeralError::Empty);
    }

    let mut value: i64 = 0;
    for (i, &c) in digits.iter().enumerate() {
        let d = digit_value(c).ok_or(NumeralError::BadDigit(start + i))?;
        value = value
            .checked_mul(RADIX)
            .and_then(|v| v.checked_add(d))
            .ok_or(NumeralError::Overflow)?;
    }
    if negative {
        value = -value;
    }
    i32::try_from(value).map_err(|_| NumeralError::Overflow)
}

/// Parse a coordinate pair `NxN`.
///
/// On failure returns the byte offset (within `text`) of the offending field
/// together with the reason.
pub fn parse_pair(text: &str) -> Result<(i32, i32), (usize, NumeralError)> {
    let sep = text
        .bytes()
        .position(|c| c == COORD_SEPARATOR)
        .ok_or((0, NumeralError::Empty))?;
    let (first, rest) = (&text[..sep], &text[sep + 1..]);
    let x = parse_number(first).map_err(|e| (0, e))?;
    let y = parse_number(rest).map_err(|e| (sep + 1, e))?;
    Ok((x, y))
}

/// Format a number back into KSW form.
pub fn format_number(value: i32) -> String {
    if value < 0 {
        format!("n{}", value.unsigned_abs())
    } else {
        value.to_string()
    }
}
