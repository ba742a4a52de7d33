//! Input format validators
//!
//! Pure predicates over strings, used to gate user input before it reaches
//! storage. ISBN validation checks the real ISBN-10/ISBN-13 check digits
//! rather than just the shape of the string.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").expect("invalid email regex"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?1?\d{9,15}$").expect("invalid phone regex"));

/// Check that a string looks like a `local@domain.tld` email address.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Check that a string is a phone number: optional `+`, 9 to 15 digits.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Validate an ISBN-10 or ISBN-13, including its check digit.
/// Hyphens and spaces are ignored.
pub fn is_valid_isbn(isbn: &str) -> bool {
    let isbn: Vec<char> = isbn.chars().filter(|c| *c != '-' && *c != ' ').collect();

    match isbn.len() {
        10 => is_valid_isbn10(&isbn),
        13 => is_valid_isbn13(&isbn),
        _ => false,
    }
}

fn is_valid_isbn10(isbn: &[char]) -> bool {
    let mut total = 0u32;
    for (i, c) in isbn[..9].iter().enumerate() {
        let Some(digit) = c.to_digit(10) else {
            return false;
        };
        total += (10 - i as u32) * digit;
    }

    let check = 11 - (total % 11);
    let expected = if check == 10 {
        'X'
    } else {
        char::from_digit(check % 11, 10).unwrap_or('0')
    };

    isbn.last() == Some(&expected)
}

fn is_valid_isbn13(isbn: &[char]) -> bool {
    let mut total = 0u32;
    for (i, c) in isbn[..12].iter().enumerate() {
        let Some(digit) = c.to_digit(10) else {
            return false;
        };
        total += if i % 2 == 0 { digit } else { 3 * digit };
    }

    let check = (10 - (total % 10)) % 10;
    isbn.last() == char::from_digit(check, 10).as_ref()
}
