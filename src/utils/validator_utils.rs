use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::utils::app_error::{AppError, FieldError};

fn collect_into(prefix: &str, errors: &ValidationErrors, details: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(errs) => {
                for err in errs {
                    details.push(FieldError {
                        field: path.clone(),
                        code: err.code.to_string(),
                        message: err
                            .message
                            .clone()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| "Invalid value".to_string()),
                    });
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_into(&path, inner, details),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_into(&format!("{}[{}]", path, index), inner, details);
                }
            }
        }
    }
}

// Convert validator errors to our field error list, nested fields as
// `list[index].field`
pub fn collect_field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut details = Vec::new();
    collect_into("", errors, &mut details);

    // errors() iterates a HashMap
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

/// Runs `validate()` and turns a failure into [`AppError::Validation`].
pub fn ensure_valid<T: Validate>(value: &T) -> Result<(), AppError> {
    value
        .validate()
        .map_err(|e| AppError::Validation(collect_field_errors(&e)))
}
