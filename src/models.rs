use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

#[derive(Deserialize, Validate, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "jane@keytrak.com", format = "email")]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[schema(example = "Jane Doe")]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[schema(example = "Secret123")]
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "jane@keytrak.com", format = "email")]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[schema(example = "Secret123")]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// At least 8 characters with a lowercase letter, an uppercase letter and a digit.
fn validate_password(password: &str) -> Result<(), ValidationError> {
    let rule = |code: &'static str, message: &'static str| {
        let mut err = ValidationError::new(code);
        err.message = Some(message.into());
        err
    };

    if password.chars().count() < 8 {
        return Err(rule("password_length", "Password must be at least 8 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(rule(
            "password_lowercase",
            "Password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(rule(
            "password_uppercase",
            "Password must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(rule("password_digit", "Password must contain at least one number"));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str, name: &str, password: &str) -> RegisterReq {
        RegisterReq {
            email: email.into(),
            name: name.into(),
            password: password.into(),
        }
    }

    #[test]
    fn accepts_well_formed_registration() {
        assert!(register("jane@keytrak.com", "Jane", "Secret123").validate().is_ok());
    }

    #[test]
    fn rejects_bad_email_and_empty_name() {
        let errors = register("not-an-email", "", "Secret123").validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("name"));
    }

    #[test]
    fn rejects_weak_passwords() {
        for weak in ["Short1", "alllower123", "ALLUPPER123", "NoDigitsHere"] {
            let errors = register("jane@keytrak.com", "Jane", weak).validate().unwrap_err();
            assert!(errors.field_errors().contains_key("password"), "{weak}");
        }
    }
}
