//! Common validation rules used by `validator` derives.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    // Optional leading +, then digits with spaces, dashes, dots or parentheses.
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9(][0-9 ()./-]{5,23}$").unwrap();
}

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates a contact phone number.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if PHONE_REGEX.is_match(phone.trim()) && (7..=15).contains(&digits) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Contact phone must be a valid phone number".into());
        Err(err)
    }
}

/// Rejects strings that are empty after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(14.5995).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(90.0001).is_err());
        assert!(validate_latitude(-91.0).is_err());
    }

    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(120.9842).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(180.5).is_err());
    }

    #[test]
    fn test_latitude_error_message() {
        let err = validate_latitude(100.0).unwrap_err();
        assert_eq!(err.code, "latitude_range");
        assert!(err.message.unwrap().contains("-90"));
    }

    #[test]
    fn test_validate_phone_accepts_common_formats() {
        assert!(validate_phone("+63 917 123 4567").is_ok());
        assert!(validate_phone("(02) 8123-4567").is_ok());
        assert!(validate_phone("09171234567").is_ok());
    }

    #[test]
    fn test_validate_phone_rejects_garbage() {
        assert!(validate_phone("call me").is_err());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("+1234567890123456789").is_err());
        assert_eq!(validate_phone("abc").unwrap_err().code, "phone_format");
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Garden of Peace").is_ok());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("").is_err());
    }
}
