//! Input guard: sanitizer and field validators.
//!
//! Pure functions over the submitted form shape. Validation failures are
//! reported as one aggregated error list, never partially.

use crate::dto::CheckoutRequest;

pub const MAX_NAME_LEN: usize = 120;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_PHONE_LEN: usize = 25;
pub const MAX_MESSAGE_LEN: usize = 500;
pub const MAX_BABY_NAME_LEN: usize = 60;

/// Strips control characters and HTML-significant characters, trims
/// surrounding whitespace and truncates to `max_len` characters.
///
/// Applied to every free-text field before it is persisted or echoed
/// into a downstream gateway payload.
pub fn sanitize(raw: &str, max_len: usize) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '<' | '>' | '"' | '\'' | '&' | '`'))
        .collect();
    cleaned.trim().chars().take(max_len).collect()
}

/// Accepts only plausible national mobile formats: after stripping
/// formatting and an optional 55 country prefix, 10-11 significant
/// digits must remain, with a valid two-digit area code and, for
/// 11-digit numbers, the mobile 9 prefix.
pub fn is_valid_phone(raw: &str) -> bool {
    if raw.chars().any(|c| !c.is_ascii_digit() && !matches!(c, '+' | '-' | ' ' | '(' | ')' | '.')) {
        return false;
    }
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if (digits.len() == 12 || digits.len() == 13) && digits.starts_with("55") {
        digits = digits[2..].to_string();
    }
    if digits.len() != 10 && digits.len() != 11 {
        return false;
    }
    // Area codes run from 11 to 99; a leading zero is never valid.
    let area: u32 = digits[..2].parse().unwrap_or(0);
    if !(11..=99).contains(&area) {
        return false;
    }
    if digits.len() == 11 && !digits[2..].starts_with('9') {
        return false;
    }
    true
}

/// Validates the full checkout form, returning every violation at once.
pub fn validate_checkout(req: &CheckoutRequest) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let details = &req.details;

    if req.service.id.trim().is_empty() {
        errors.push("service.id is required".to_string());
    }
    if req.service.item_type.trim().is_empty() {
        errors.push("service.type is required".to_string());
    }

    required_within("name", &details.name, MAX_NAME_LEN, &mut errors);
    required_within("email", &details.email, MAX_EMAIL_LEN, &mut errors);
    if !details.email.trim().is_empty() && !is_plausible_email(&details.email) {
        errors.push("email is not a valid address".to_string());
    }

    if details.phone.trim().is_empty() {
        errors.push("phone is required".to_string());
    } else if details.phone.len() > MAX_PHONE_LEN || !is_valid_phone(&details.phone) {
        errors.push("phone is not a valid mobile number".to_string());
    }

    if let Some(message) = &details.message {
        if message.chars().count() > MAX_MESSAGE_LEN {
            errors.push(format!("message exceeds {MAX_MESSAGE_LEN} characters"));
        }
    }

    if req.service.item_type == "gender_reveal" {
        validate_gender_reveal(details, &mut errors);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Gender-reveal items require either an explicit "unknown" or a
/// concrete selection plus the matching name field.
fn validate_gender_reveal(details: &crate::dto::CheckoutDetails, errors: &mut Vec<String>) {
    match details.revealed_gender.as_deref() {
        None | Some("") => {
            errors.push("revealed_gender is required for gender reveal items".to_string());
        }
        Some("unknown") => {}
        Some("boy") | Some("girl") => match details.baby_name.as_deref() {
            None | Some("") => {
                errors.push("baby_name is required when a gender is selected".to_string());
            }
            Some(name) if name.chars().count() > MAX_BABY_NAME_LEN => {
                errors.push(format!("baby_name exceeds {MAX_BABY_NAME_LEN} characters"));
            }
            Some(_) => {}
        },
        Some(other) => {
            errors.push(format!("revealed_gender must be unknown, boy or girl, got {other}"));
        }
    }
}

fn required_within(field: &str, value: &str, max_len: usize, errors: &mut Vec<String>) {
    if value.trim().is_empty() {
        errors.push(format!("{field} is required"));
    } else if value.chars().count() > max_len {
        errors.push(format!("{field} exceeds {max_len} characters"));
    }
}

fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}
