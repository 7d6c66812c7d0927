use hope_shared::errors::AppError;

/// Length of a national subscriber number without its country prefix.
const NATIONAL_NUMBER_LEN: usize = 10;
/// E.164 caps a full number, country code included, at 15 digits.
const MAX_DIGITS: usize = 15;

/// A phone number reduced to digits, always carrying its country prefix.
/// `digits()` is the storage and cache key; `e164()` is what the SMS provider
/// gets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn normalize(raw: &str, country_code: &str) -> Result<Self, AppError> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        let country: String = country_code.chars().filter(char::is_ascii_digit).collect();

        if digits.is_empty() {
            return Err(AppError::validation("Phone number is required"));
        }
        if country.is_empty() {
            return Err(AppError::validation("Country code is required"));
        }

        let full = if digits.len() > NATIONAL_NUMBER_LEN && digits.starts_with(&country) {
            digits
        } else {
            format!("{country}{digits}")
        };
        if full.len() > MAX_DIGITS {
            return Err(AppError::validation("Invalid phone number"));
        }
        Ok(Self(full))
    }

    pub fn digits(&self) -> &str {
        &self.0
    }

    pub fn e164(&self) -> String {
        format!("+{}", self.0)
    }

    /// Log-safe form that keeps only the last four digits.
    pub fn masked(&self) -> String {
        let visible = self.0.len().saturating_sub(4);
        format!("+{}{}", "*".repeat(visible), &self.0[visible..])
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "+{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn national_number_gets_prefix() {
        let phone = PhoneNumber::normalize("9876543210", "91").unwrap();
        assert_eq!(phone.digits(), "919876543210");
        assert_eq!(phone.e164(), "+919876543210");
    }

    #[test]
    fn formatting_is_stripped() {
        let phone = PhoneNumber::normalize("+91 98765-43210", "+91").unwrap();
        assert_eq!(phone.digits(), "919876543210");
    }

    #[test]
    fn national_number_starting_with_country_digits() {
        // 10 digits that happen to begin with "91" are still a national number
        let phone = PhoneNumber::normalize("9123456789", "91").unwrap();
        assert_eq!(phone.digits(), "919123456789");
    }

    #[test]
    fn same_number_from_every_entry_point() {
        let from_verify = PhoneNumber::normalize("9876543210", "91").unwrap();
        let from_register = PhoneNumber::normalize("+919876543210", "91").unwrap();
        assert_eq!(from_verify, from_register);
    }

    #[test]
    fn masked_keeps_last_four() {
        let phone = PhoneNumber::normalize("9876543210", "91").unwrap();
        assert_eq!(phone.masked(), "+********3210");
    }

    #[test]
    fn empty_rejected() {
        assert!(PhoneNumber::normalize("  ", "91").is_err());
        assert!(PhoneNumber::normalize("abc", "91").is_err());
        assert!(PhoneNumber::normalize("9876543210", "").is_err());
    }

    #[test]
    fn overlong_numbers_rejected() {
        assert!(PhoneNumber::normalize("1234567890123456789012", "91").is_err());
        // 14-digit national part plus the prefix is 16 digits
        assert!(PhoneNumber::normalize("12345678901234", "91").is_err());
        assert_eq!(PhoneNumber::normalize("+447911123456", "44").unwrap().digits(), "447911123456");
    }
}
