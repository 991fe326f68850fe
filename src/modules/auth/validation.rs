use crate::MIN_PASSWORD_LENGTH;

/// Form checks done by the caller before invoking the auth service
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingFields,
    PasswordMismatch,
    PasswordTooShort,
    MissingCredentials,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingFields => write!(f, "Please fill in all fields"),
            ValidationError::PasswordMismatch => write!(f, "Passwords do not match"),
            ValidationError::PasswordTooShort => write!(
                f,
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            ),
            ValidationError::MissingCredentials => {
                write!(f, "Please enter username and password")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a registration form
pub fn validate_registration(
    username: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), ValidationError> {
    if username.is_empty() || password.is_empty() || confirm_password.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    if password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Validate a login form
pub fn validate_login(username: &str, password: &str) -> Result<(), ValidationError> {
    if username.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_validation() {
        assert!(validate_registration("testuser", "password123", "password123").is_ok());

        assert_eq!(
            validate_registration("", "password123", "password123"),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            validate_registration("testuser", "password123", "differentpassword"),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            validate_registration("testuser", "12345", "12345"),
            Err(ValidationError::PasswordTooShort)
        );

        // Mismatch is reported before length
        assert_eq!(
            validate_registration("testuser", "123", "456"),
            Err(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn test_login_validation() {
        assert!(validate_login("testuser", "password123").is_ok());
        assert_eq!(
            validate_login("testuser", ""),
            Err(ValidationError::MissingCredentials)
        );
        assert_eq!(
            validate_login("", "password123"),
            Err(ValidationError::MissingCredentials)
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ValidationError::MissingFields.to_string(),
            "Please fill in all fields"
        );
        assert_eq!(
            ValidationError::PasswordTooShort.to_string(),
            "Password must be at least 6 characters"
        );
        assert_eq!(
            ValidationError::MissingCredentials.to_string(),
            "Please enter username and password"
        );
    }
}
