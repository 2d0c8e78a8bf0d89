// Validation utilities

use crate::model::Date;
use chrono::Datelike;
use std::fmt;

pub const MIN_USERNAME_LEN: usize = 5;
pub const MAX_USERNAME_LEN: usize = 20;
pub const MIN_PASSWORD_LEN: usize = 7;
pub const MAX_PASSWORD_LEN: usize = 50;

/// Latest year a booking may be placed in unless configured otherwise
pub const DEFAULT_MAX_YEAR: u32 = 2030;

/// Reason a username or password was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    UsernameLength(usize),
    UsernameTaken(String),
    PasswordLength(usize),
    MissingLowercase,
    MissingUppercase,
    MissingDigit,
    MissingSymbol,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::UsernameLength(len) => write!(
                f,
                "Invalid username length {} (must be between {}-{} characters)",
                len, MIN_USERNAME_LEN, MAX_USERNAME_LEN
            ),
            CredentialError::UsernameTaken(name) => {
                write!(f, "Username already exists: {}", name)
            }
            CredentialError::PasswordLength(len) => write!(
                f,
                "Invalid password length {} (must be between {}-{} characters)",
                len, MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
            ),
            CredentialError::MissingLowercase => {
                f.write_str("Password must contain at least one lowercase letter")
            }
            CredentialError::MissingUppercase => {
                f.write_str("Password must contain at least one uppercase letter")
            }
            CredentialError::MissingDigit => f.write_str("Password must contain at least one digit"),
            CredentialError::MissingSymbol => {
                f.write_str("Password must contain at least one symbol")
            }
        }
    }
}

impl std::error::Error for CredentialError {}

/// Checks username length. Uniqueness is the roster's concern.
pub fn check_username(name: &str) -> Result<(), CredentialError> {
    let len = name.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(CredentialError::UsernameLength(len));
    }
    Ok(())
}

/// Checks only the password length; used at login where character classes
/// are not re-checked.
pub fn check_password_length(password: &str) -> Result<(), CredentialError> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(CredentialError::PasswordLength(len));
    }
    Ok(())
}

/// Every rule the password breaks, in the order they are reported.
///
/// A strong password must:
/// - Be 7-50 characters long
/// - Contain at least one lowercase letter
/// - Contain at least one uppercase letter
/// - Contain at least one digit
/// - Contain at least one symbol (anything not alphanumeric or whitespace)
pub fn password_issues(password: &str) -> Vec<CredentialError> {
    let mut issues = Vec::new();
    if let Err(e) = check_password_length(password) {
        issues.push(e);
    }

    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    if !has_lowercase {
        issues.push(CredentialError::MissingLowercase);
    }
    if !has_uppercase {
        issues.push(CredentialError::MissingUppercase);
    }
    if !has_digit {
        issues.push(CredentialError::MissingDigit);
    }
    if !has_symbol {
        issues.push(CredentialError::MissingSymbol);
    }
    issues
}

/// First rule the password breaks, if any.
pub fn check_password(password: &str) -> Result<(), CredentialError> {
    match password_issues(password).into_iter().next() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Inclusive range of years a booking may fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub min: u32,
    pub max: u32,
}

impl YearRange {
    /// From the current calendar year through `DEFAULT_MAX_YEAR`
    pub fn from_now() -> Self {
        let current = chrono::Local::now().year().max(0) as u32;
        Self {
            min: current,
            max: DEFAULT_MAX_YEAR.max(current),
        }
    }

    pub fn contains(&self, year: u32) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::from_now()
    }
}

/// Reason a date field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    Unparsable(String),
    Day(u8),
    Month(u8),
    Year { year: u32, min: u32, max: u32 },
}

impl fmt::Display for DateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateError::Unparsable(s) => write!(f, "Invalid date '{}', expected DD.MM.YYYY", s),
            DateError::Day(d) => write!(f, "Invalid day {}, it must be between 1 and 31", d),
            DateError::Month(m) => write!(f, "Invalid month {}, it must be between 1 and 12", m),
            DateError::Year { year, min, max } => write!(
                f,
                "Invalid year {}, it must be between {} and {}",
                year, min, max
            ),
        }
    }
}

impl std::error::Error for DateError {}

/// Field range checks only; 31.02 passes.
pub fn check_date(date: &Date, years: &YearRange) -> Result<(), DateError> {
    if !(1..=31).contains(&date.day) {
        return Err(DateError::Day(date.day));
    }
    if !(1..=12).contains(&date.month) {
        return Err(DateError::Month(date.month));
    }
    if !years.contains(date.year) {
        return Err(DateError::Year {
            year: date.year,
            min: years.min,
            max: years.max,
        });
    }
    Ok(())
}

/// Parse `DD.MM.YYYY` and range-check it.
pub fn parse_date(s: &str, years: &YearRange) -> Result<Date, DateError> {
    let date = Date::parse(s).ok_or_else(|| DateError::Unparsable(s.trim().to_string()))?;
    check_date(&date, years)?;
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEARS: YearRange = YearRange {
        min: 2025,
        max: 2030,
    };

    #[test]
    fn test_username_length_bounds() {
        assert_eq!(check_username("abcd"), Err(CredentialError::UsernameLength(4)));
        assert!(check_username("abcde").is_ok());
        assert!(check_username(&"a".repeat(20)).is_ok());
        assert_eq!(
            check_username(&"a".repeat(21)),
            Err(CredentialError::UsernameLength(21))
        );
    }

    #[test]
    fn test_strong_password() {
        assert!(password_issues("Abc123!x").is_empty());
        assert!(check_password("Se@ure123Pass").is_ok());
    }

    #[test]
    fn test_weak_password_reports_missing_classes() {
        let issues = password_issues("abc123");
        assert!(issues.contains(&CredentialError::MissingUppercase));
        assert!(issues.contains(&CredentialError::MissingSymbol));
        assert!(!issues.contains(&CredentialError::MissingLowercase));
        assert!(!issues.contains(&CredentialError::MissingDigit));
        assert_eq!(check_password("abc123"), Err(CredentialError::PasswordLength(6)));
    }

    #[test]
    fn test_password_rule_order() {
        assert_eq!(check_password("ABC123!X"), Err(CredentialError::MissingLowercase));
        assert_eq!(check_password("abc123!x"), Err(CredentialError::MissingUppercase));
        assert_eq!(check_password("Abcdef!x"), Err(CredentialError::MissingDigit));
        assert_eq!(check_password("Abc1234x"), Err(CredentialError::MissingSymbol));
    }

    #[test]
    fn test_whitespace_is_not_a_symbol() {
        assert_eq!(check_password("Abc 123x"), Err(CredentialError::MissingSymbol));
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(check_password_length("Ab1!xyz").is_ok());
        assert!(check_password_length(&"a".repeat(50)).is_ok());
        assert_eq!(
            check_password_length(&"a".repeat(51)),
            Err(CredentialError::PasswordLength(51))
        );
    }

    #[test]
    fn test_check_date_ranges() {
        assert!(check_date(&Date::new(31, 2, 2025), &YEARS).is_ok());
        assert_eq!(check_date(&Date::new(0, 2, 2025), &YEARS), Err(DateError::Day(0)));
        assert_eq!(check_date(&Date::new(32, 2, 2025), &YEARS), Err(DateError::Day(32)));
        assert_eq!(check_date(&Date::new(1, 13, 2025), &YEARS), Err(DateError::Month(13)));
        assert_eq!(
            check_date(&Date::new(1, 1, 2031), &YEARS),
            Err(DateError::Year {
                year: 2031,
                min: 2025,
                max: 2030
            })
        );
    }

    #[test]
    fn test_blank_date_is_rejected() {
        assert_eq!(check_date(&Date::blank(2026), &YEARS), Err(DateError::Day(0)));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("05.06.2027", &YEARS), Ok(Date::new(5, 6, 2027)));
        assert!(matches!(parse_date("tomorrow", &YEARS), Err(DateError::Unparsable(_))));
    }

    #[test]
    fn test_year_range_from_now() {
        let years = YearRange::from_now();
        assert!(years.min <= years.max);
        assert!(years.max >= DEFAULT_MAX_YEAR);
    }
}
