use crate::models::Contact;

/// Email matches case-insensitively, phone exactly; empty fields never match.
pub fn is_known_contact(email: &str, phone: &str, contacts: &[Contact]) -> bool {
    let email = email.trim();
    let phone = phone.trim();

    contacts.iter().any(|contact| {
        let email_match = !email.is_empty()
            && !contact.email.is_empty()
            && contact.email.trim().to_lowercase() == email.to_lowercase();
        let phone_match =
            !phone.is_empty() && !contact.phone.is_empty() && contact.phone.trim() == phone;
        email_match || phone_match
    })
}
