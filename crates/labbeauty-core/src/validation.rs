//! Field validation
//!
//! [`Validator`] collects one message per field; the first failed check for a field
//! wins. Entity rules live next to the validator so every write path shares them.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::constants::{DESCRIPTION_MIN_CHARS, SUBCATEGORY_NAME_MIN_CHARS, TITLE_MAX_CHARS};
use crate::models::{Category, ContactForm, Service, SubCategory};
use crate::AppError;

/// Field name to message.
pub type FieldErrors = BTreeMap<String, String>;

pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

pub static PHONE_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9][0-9 ()-]{5,18}[0-9]$").expect("phone pattern is valid")
});

#[derive(Debug, Default, Clone)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record `message` for `field` unless the field already has one.
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn matches(value: &str, rx: &Regex) -> bool {
        rx.is_match(value)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// `Ok(())` when valid, otherwise a 422 carrying the collected messages.
    pub fn finish(self) -> Result<(), AppError> {
        if self.valid() {
            Ok(())
        } else {
            Err(AppError::FailedValidation(self.errors))
        }
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn check_title_and_description(v: &mut Validator, title: &str, description: &str) {
    v.check(!title.is_empty(), "title", "title must be provided");
    v.check(
        char_len(title) <= TITLE_MAX_CHARS,
        "title",
        "must not be more than 55 chars",
    );
    v.check(
        !description.is_empty(),
        "description",
        "description must be provided",
    );
    v.check(
        char_len(description) >= DESCRIPTION_MIN_CHARS,
        "description",
        "description must have more than 20 chars",
    );
}

pub fn validate_category(v: &mut Validator, category: &Category) {
    check_title_and_description(v, &category.title, &category.description);
    v.check(
        !category.photo_url.is_empty(),
        "photo_url",
        "photo must be provided",
    );
}

pub fn validate_service(v: &mut Validator, service: &Service) {
    check_title_and_description(v, &service.title, &service.description);
    v.check(!service.url.is_empty(), "url", "url must be provided");
    v.check(
        !service.photo_url.is_empty(),
        "photo_url",
        "photo must be provided",
    );
}

pub fn validate_subcategory(v: &mut Validator, subcategory: &SubCategory) {
    v.check(!subcategory.name.is_empty(), "name", "must be provided");
    v.check(
        char_len(&subcategory.name) >= SUBCATEGORY_NAME_MIN_CHARS,
        "name",
        "name must have more than 8 chars",
    );
}

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(
        Validator::matches(email, &EMAIL_RX),
        "email",
        "must be a valid email address",
    );
}

pub fn validate_password_plaintext(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(password.len() >= 8, "password", "must be at least 8 bytes long");
    v.check(
        password.len() <= 72,
        "password",
        "must not be more than 72 bytes long",
    );
}

pub fn validate_user_name(v: &mut Validator, name: &str) {
    v.check(!name.is_empty(), "name", "must be provided");
    v.check(name.len() <= 500, "name", "must not be more than 500 bytes long");
}

pub fn validate_contact_form(v: &mut Validator, form: &ContactForm) {
    v.check(!form.name.is_empty(), "name", "must be provided");
    v.check(form.name.len() > 1, "name", "must be at least 2 bytes long");
    v.check(
        form.name.len() <= 100,
        "name",
        "must not be more than 100 bytes long",
    );
    v.check(!form.phone.is_empty(), "phone", "must be provided");
    v.check(
        Validator::matches(&form.phone, &PHONE_RX),
        "phone",
        "must be valid phone number",
    );
    v.check(!form.message.is_empty(), "message", "must be provided");
    v.check(
        form.message.len() <= 500,
        "message",
        "must not be more than 500 bytes long",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(title: &str, description: &str, photo_url: &str) -> Category {
        Category {
            id: 0,
            title: title.to_string(),
            description: description.to_string(),
            photo_url: photo_url.to_string(),
            photo_key: String::new(),
        }
    }

    #[test]
    fn first_message_per_field_wins() {
        let mut v = Validator::new();
        validate_category(&mut v, &category("", "", ""));
        assert!(!v.valid());
        assert_eq!(v.errors()["title"], "title must be provided");
        assert_eq!(v.errors()["description"], "description must be provided");
        assert_eq!(v.errors()["photo_url"], "photo must be provided");
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        let mut v = Validator::new();
        let title = "М".repeat(55);
        validate_category(
            &mut v,
            &category(&title, "Догляд за нігтями та кутикулою", "https://x/y.png"),
        );
        assert!(v.valid(), "{:?}", v.errors());

        let mut v = Validator::new();
        let title = "М".repeat(56);
        validate_category(
            &mut v,
            &category(&title, "Догляд за нігтями та кутикулою", "https://x/y.png"),
        );
        assert_eq!(v.errors()["title"], "must not be more than 55 chars");
    }

    #[test]
    fn short_description_is_rejected() {
        let mut v = Validator::new();
        validate_category(&mut v, &category("Manicure", "short", "https://x/y.png"));
        assert_eq!(
            v.errors()["description"],
            "description must have more than 20 chars"
        );
    }

    #[test]
    fn service_requires_url() {
        let service = Service {
            id: 0,
            title: "Gel polish".to_string(),
            description: "Long lasting gel polish coating".to_string(),
            url: String::new(),
            photo_url: "https://x/y.png".to_string(),
            photo_key: "y.png".to_string(),
        };
        let mut v = Validator::new();
        validate_service(&mut v, &service);
        assert_eq!(v.errors().len(), 1);
        assert_eq!(v.errors()["url"], "url must be provided");
    }

    #[test]
    fn subcategory_name_needs_eight_chars() {
        let mut v = Validator::new();
        validate_subcategory(
            &mut v,
            &SubCategory {
                id: 0,
                name: "Nails".to_string(),
            },
        );
        assert_eq!(v.errors()["name"], "name must have more than 8 chars");
    }

    #[test]
    fn contact_form_rules() {
        let mut v = Validator::new();
        validate_contact_form(
            &mut v,
            &ContactForm {
                name: "Olena".to_string(),
                phone: "+380 (67) 123-45-67".to_string(),
                message: "Хочу записатися на манікюр".to_string(),
            },
        );
        assert!(v.valid(), "{:?}", v.errors());

        let mut v = Validator::new();
        validate_contact_form(
            &mut v,
            &ContactForm {
                name: "O".to_string(),
                phone: "call me".to_string(),
                message: "x".repeat(501),
            },
        );
        assert_eq!(v.errors()["name"], "must be at least 2 bytes long");
        assert_eq!(v.errors()["phone"], "must be valid phone number");
        assert_eq!(v.errors()["message"], "must not be more than 500 bytes long");
    }

    #[test]
    fn email_and_password_rules() {
        let mut v = Validator::new();
        validate_email(&mut v, "admin@cosmetcab.dp.ua");
        validate_password_plaintext(&mut v, "correct horse");
        assert!(v.valid());

        let mut v = Validator::new();
        validate_email(&mut v, "not-an-email");
        validate_password_plaintext(&mut v, "short");
        assert_eq!(v.errors()["email"], "must be a valid email address");
        assert_eq!(v.errors()["password"], "must be at least 8 bytes long");
    }

    #[test]
    fn finish_converts_to_failed_validation() {
        let mut v = Validator::new();
        v.add_error("email", "a user with this email address already exists");
        match v.finish() {
            Err(AppError::FailedValidation(errors)) => {
                assert_eq!(
                    errors["email"],
                    "a user with this email address already exists"
                )
            }
            other => panic!("expected FailedValidation, got {:?}", other),
        }
    }
}
