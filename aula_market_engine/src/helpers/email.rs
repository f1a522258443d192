/// A syntax check for email addresses. This is deliberately coarse. Deliverability is the mail provider's problem;
/// this only keeps obviously broken input out of the users table.
pub fn is_valid_email(email: &str) -> bool {
    let pattern = regex::Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();
    pattern.is_match(email)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("jose.maria+aula@sub.example.co"));
        assert!(is_valid_email("TUTOR_42@campus-mail.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign.example.com"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("trailing@dot."));
        assert!(!is_valid_email("spaces in@example.com"));
    }
}
