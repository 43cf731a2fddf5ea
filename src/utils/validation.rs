use crate::api::error::{AppError, messages};
use crate::models::{CertificateInput, RegisterUser};

const LOWER_CHARS: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NUMBER_CHARS: &str = "0123456789";
const SEP_CHARS: &str = "-_.@";
const SPECIAL_CHARS: &str = "!@#$%^&*";

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 8;

const PERSON_WEIGHTS: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];

/// Validates an 11 digit personal document (no separators).
pub fn check_person_document(document: &str) -> bool {
    if document.len() != 11 || !document.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let base = &document[..9];
    let first = person_check_digit(base);
    let second = person_check_digit(&format!("{}{}", base, first));

    document == format!("{}{}{}", base, first, second)
}

/// Weights are aligned with the rightmost digit of `digits`.
fn person_check_digit(digits: &str) -> u32 {
    let offset = PERSON_WEIGHTS.len() - digits.len();
    let sum: u32 = digits
        .bytes()
        .enumerate()
        .map(|(i, b)| u32::from(b - b'0') * PERSON_WEIGHTS[offset + i])
        .sum();

    let check = 11 - sum % 11;
    if check > 9 { 0 } else { check }
}

/// Validates a 14 digit entity document. `.`, `-` and `/` are ignored.
pub fn is_entity_document_valid(document: &str) -> bool {
    let sanitized: String = document
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | '/'))
        .collect();

    if sanitized.len() != 14 {
        return false;
    }

    let digits: Vec<u32> = match sanitized.chars().map(|c| c.to_digit(10)).collect() {
        Some(digits) => digits,
        None => return false,
    };

    // 00000000000000 through 99999999999999 pass the check sums
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    entity_check_digit_matches(&digits, 5, 12) && entity_check_digit_matches(&digits, 6, 13)
}

fn entity_check_digit_matches(digits: &[u32], start_weight: u32, position: usize) -> bool {
    let mut weight = start_weight;
    let mut sum = 0;

    for digit in &digits[..position] {
        sum += digit * weight;
        weight = if weight == 2 { 9 } else { weight - 1 };
    }

    let rest = sum % 11;
    let expected = if rest < 2 { 0 } else { 11 - rest };

    digits[position] == expected
}

/// Requires lowercase, uppercase, digit and special characters, no spaces.
pub fn check_valid_password(password: &str) -> bool {
    if password.len() < MIN_PASSWORD_LEN || password.contains(' ') {
        return false;
    }

    let has = |set: &str| password.chars().any(|c| set.contains(c));

    has(LOWER_CHARS) && has(UPPER_CHARS) && has(NUMBER_CHARS) && has(SPECIAL_CHARS)
}

pub fn check_valid_email(email: &str) -> bool {
    let formatted = email.trim().to_lowercase();

    let allowed = formatted
        .chars()
        .all(|c| LOWER_CHARS.contains(c) || NUMBER_CHARS.contains(c) || SEP_CHARS.contains(c));
    if !allowed {
        tracing::debug!("email rejected: invalid character");
        return false;
    }

    let parts: Vec<&str> = formatted.split('@').collect();
    if parts.len() != 2 {
        tracing::debug!("email rejected: expected exactly one @");
        return false;
    }

    let domain = parts[1];
    if !domain.contains('.') {
        tracing::debug!("email rejected: no dot after @");
        return false;
    }

    !domain.split('.').any(str::is_empty)
}

/// Shared by registration and password reset.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::bad_request(messages::EMPTY_PASSWORD_FIELD));
    }

    if password.contains(' ') {
        return Err(AppError::bad_request(messages::PASSWORD_NOT_VALID));
    }

    if password != confirmation {
        return Err(AppError::bad_request(messages::PASSWORD_DOES_NOT_MATCH));
    }

    if !check_valid_password(password) {
        return Err(AppError::bad_request(messages::PASSWORD_NOT_VALID));
    }

    Ok(())
}

/// Trims name and email in place, then checks every registration field.
pub fn validate_user_register(user: &mut RegisterUser) -> Result<(), AppError> {
    user.name = user.name.trim().to_string();
    user.email = user.email.trim().to_string();

    if user.name.is_empty() {
        return Err(AppError::bad_request(messages::EMPTY_NAME_FIELD));
    }

    if user.email.is_empty() {
        return Err(AppError::bad_request(messages::EMPTY_EMAIL_FIELD));
    }

    let document = user.document.as_deref().unwrap_or_default();
    if document.is_empty() {
        if !user.is_foreigner {
            return Err(AppError::bad_request(messages::EMPTY_DOCUMENT_FIELD));
        }
    } else if !check_person_document(document) {
        return Err(AppError::bad_request(messages::DOCUMENT_NOT_VALID));
    }

    if !check_valid_email(&user.email) {
        return Err(AppError::bad_request(messages::INVALID_EMAIL_FIELD));
    }

    validate_new_password(&user.password, &user.password_confirmation)
}

/// Trims image payload and name in place before create/edit.
pub fn certificate_rules(certificate: &mut CertificateInput) -> Result<(), AppError> {
    certificate.image = certificate.image.trim().to_string();
    certificate.name = certificate.name.trim().to_string();

    if certificate.image.is_empty() {
        return Err(AppError::bad_request(messages::EMPTY_IMAGE));
    }

    if certificate.name.is_empty() {
        return Err(AppError::bad_request(messages::EMPTY_CERTIFICATE_NAME));
    }

    Ok(())
}
