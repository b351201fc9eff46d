use validator::Validate;

use crate::core::error::{AppError, Result};

/// Run the declared `validator` rules on a payload before it touches the
/// store. All field errors are collapsed into a single `Validation` error,
/// which the HTTP layer answers with 400.
pub fn validate_payload<T: Validate>(payload: &T) -> Result<()> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, max = 5, message = "Name must be 1-5 characters"))]
        name: String,
        #[validate(email(message = "Invalid email format"))]
        email: String,
    }

    #[test]
    fn test_valid_payload_passes() {
        let sample = Sample {
            name: "ok".to_string(),
            email: "a@b.co".to_string(),
        };
        assert!(validate_payload(&sample).is_ok());
    }

    #[test]
    fn test_invalid_payload_maps_to_validation_error() {
        let sample = Sample {
            name: String::new(),
            email: "not-an-email".to_string(),
        };
        let err = validate_payload(&sample).unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("Name must be 1-5 characters") || msg.contains("name"));
                assert!(msg.contains("Invalid email format") || msg.contains("email"));
            }
            other => panic!("expected Validation error, got {:?}", other),
        }
    }
}
