use crate::store::{ContactDraft, StoreError};

/// Check a draft before it is allowed anywhere near the store. Pure: trims
/// and inspects the draft, touches nothing else.
///
/// `name` and `phone` must be non-empty after trimming; a non-empty phone
/// must match the allowed pattern; a non-empty email must have the light
/// `local@domain.tld` shape. `address` is free text.
pub fn validate(draft: &ContactDraft) -> Result<(), StoreError> {
    if draft.name.trim().is_empty() {
        return Err(StoreError::MissingField { field: "name" });
    }
    let phone = draft.phone.trim();
    if phone.is_empty() {
        return Err(StoreError::MissingField { field: "phone" });
    }
    if !valid_phone(phone) {
        return Err(StoreError::InvalidPhone);
    }
    let email = draft.email.trim();
    if !email.is_empty() && !valid_email(email) {
        return Err(StoreError::InvalidEmail);
    }
    Ok(())
}

/// 7-20 characters drawn from digits, space, `+`, `-`, `(`, `)`.
pub fn valid_phone(phone: &str) -> bool {
    let phone = phone.trim();
    let len = phone.chars().count();
    (7..=20).contains(&len) && phone.chars().all(|c| c.is_ascii_digit() || " +-()".contains(c))
}

/// Very light shape check: exactly one `@`, no whitespace, a non-empty local
/// part, and a `.` strictly inside the domain part.
pub fn valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let Some(domain) = parts.next() else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, phone: &str, email: &str) -> ContactDraft {
        ContactDraft {
            name: name.to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
            address: String::new(),
        }
    }

    #[test]
    fn requires_name_and_phone() {
        assert!(matches!(
            validate(&draft("   ", "555-0100", "")),
            Err(StoreError::MissingField { field: "name" })
        ));
        assert!(matches!(
            validate(&draft("Acme", "", "")),
            Err(StoreError::MissingField { field: "phone" })
        ));
        assert!(validate(&draft("Acme", "555-0100", "")).is_ok());
    }

    #[test]
    fn phone_pattern() {
        assert!(valid_phone("5550100"));
        assert!(valid_phone("+1 (555) 010-0123"));
        assert!(valid_phone("  555-0100  "));

        // Too short, too long, bad characters.
        assert!(!valid_phone("555010"));
        assert!(!valid_phone("123456789012345678901"));
        assert!(!valid_phone("555-0100 ext. 4"));
        assert!(!valid_phone("five five five"));

        assert!(matches!(
            validate(&draft("Acme", "555", "")),
            Err(StoreError::InvalidPhone)
        ));
    }

    #[test]
    fn email_shape() {
        assert!(valid_email("ops@acme.com"));
        assert!(valid_email("first.last@sub.acme.co.uk"));

        assert!(!valid_email("ops"));
        assert!(!valid_email("ops@acme"));
        assert!(!valid_email("@acme.com"));
        assert!(!valid_email("ops@.com"));
        assert!(!valid_email("ops@acme."));
        assert!(!valid_email("a@b@acme.com"));
        assert!(!valid_email("ops @acme.com"));

        assert!(matches!(
            validate(&draft("Acme", "555-0100", "nope")),
            Err(StoreError::InvalidEmail)
        ));
    }

    #[test]
    fn empty_email_is_fine() {
        assert!(validate(&draft("Acme", "555-0100", "   ")).is_ok());
    }
}
