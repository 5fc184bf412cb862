pub mod health;
pub use self::health::health;

pub mod pages;
pub mod session;

// common functions for the handlers
use regex::Regex;

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(valid_email("ana@x.com"));
        assert!(valid_email("front.desk@pool.example.com"));
        assert!(!valid_email("ana"));
        assert!(!valid_email("ana@x"));
        assert!(!valid_email("a na@x.com"));
        assert!(!valid_email(""));
    }
}
