//! Sentinel navigation targets a rule may name instead of a sibling
//! identifier. The navigator interprets only [`EXIT`]; the other markers are
//! passed through for the owning cursor to act on.

pub const EXIT: &str = "exit";
pub const NEXT_SECTION: &str = "nextSection";
pub const BEGINNING: &str = "beginning";

pub fn is_reserved(identifier: &str) -> bool {
    matches!(identifier, EXIT | NEXT_SECTION | BEGINNING)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_the_reserved_set() {
        assert!(is_reserved("exit"));
        assert!(is_reserved("nextSection"));
        assert!(is_reserved("beginning"));
        assert!(!is_reserved("intro"));
    }
}
