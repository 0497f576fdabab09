use crate::i18n::{Locale, Messages};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Raw form state as typed by the visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub message: String,
}

/// A form that passed validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Company,
    Message,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Company => "company",
            Field::Message => "message",
        }
    }

    /// Translation key of the field's label.
    pub fn label_key(self) -> &'static str {
        match self {
            Field::Name => "contact.fields.name",
            Field::Email => "contact.fields.email",
            Field::Company => "contact.fields.company",
            Field::Message => "contact.fields.message",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldProblem {
    Required,
    InvalidEmail,
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldProblem::Required => "required",
            FieldProblem::InvalidEmail => "invalid email",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[error("{field}: {problem}")]
pub struct FieldError {
    pub field: Field,
    pub problem: FieldProblem,
}

impl FieldError {
    /// The error as shown to the visitor in `locale`.
    pub fn localized(&self, messages: &Messages, locale: Locale) -> String {
        match self.problem {
            FieldProblem::Required => {
                let label = messages.translate(locale, self.field.label_key());
                messages.translate_with(locale, "contact.errors.required", &[("field", &label)])
            }
            FieldProblem::InvalidEmail => messages.translate(locale, "contact.errors.email"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid contact form: {}", join_errors(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

/// The "valid e-mail address" production browsers apply to
/// `<input type="email">`.
fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("email pattern is valid")
    })
}

impl ContactForm {
    /// Reset every field to empty.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Check required fields and the email format.
    ///
    /// Whitespace-only input counts as missing. An empty company becomes
    /// `None`. All problems are reported at once, in field order.
    pub fn validate(&self) -> Result<ContactSubmission, ValidationErrors> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        let email = self.email.trim();
        let company = self.company.trim();

        if name.is_empty() {
            errors.push(FieldError {
                field: Field::Name,
                problem: FieldProblem::Required,
            });
        }

        if email.is_empty() {
            errors.push(FieldError {
                field: Field::Email,
                problem: FieldProblem::Required,
            });
        } else if !email_regex().is_match(email) {
            errors.push(FieldError {
                field: Field::Email,
                problem: FieldProblem::InvalidEmail,
            });
        }

        if self.message.trim().is_empty() {
            errors.push(FieldError {
                field: Field::Message,
                problem: FieldProblem::Required,
            });
        }

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        Ok(ContactSubmission {
            name: name.to_string(),
            email: email.to_string(),
            company: (!company.is_empty()).then(|| company.to_string()),
            message: self.message.clone(),
        })
    }
}
