use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two negotiating sides.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Party {
    #[default]
    A,
    B,
}

impl Party {
    /// Normalize a backend role string into a party.
    ///
    /// The backend speaks "A"/"B" directly; "user" and "assistant" (and the
    /// spelled-out "party a"/"party b") are legacy aliases. Anything else
    /// falls back to Party A. Surrounding whitespace is only ignored for the
    /// single-letter form.
    pub fn from_role(role: &str) -> Self {
        let letter = role.trim();
        if letter.eq_ignore_ascii_case("a") {
            return Party::A;
        }
        if letter.eq_ignore_ascii_case("b") {
            return Party::B;
        }

        match role.to_ascii_lowercase().as_str() {
            "user" | "party a" => Party::A,
            "assistant" | "party b" => Party::B,
            _ => Party::A,
        }
    }

    /// The party that speaks after this one.
    pub fn opposite(self) -> Self {
        match self {
            Party::A => Party::B,
            Party::B => Party::A,
        }
    }

    /// Role string the backend expects for this party.
    pub fn as_role(self) -> &'static str {
        match self {
            Party::A => "A",
            Party::B => "B",
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_role())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_roles_map_to_themselves() {
        assert_eq!(Party::from_role("A"), Party::A);
        assert_eq!(Party::from_role("B"), Party::B);
        assert_eq!(Party::from_role(" b "), Party::B);
    }

    #[test]
    fn legacy_aliases_are_case_insensitive() {
        assert_eq!(Party::from_role("assistant"), Party::B);
        assert_eq!(Party::from_role("Assistant"), Party::B);
        assert_eq!(Party::from_role("USER"), Party::A);
        assert_eq!(Party::from_role("Party B"), Party::B);
        // Padding only counts for the letter form.
        assert_eq!(Party::from_role(" assistant "), Party::A);
    }

    #[test]
    fn unknown_role_defaults_to_party_a() {
        assert_eq!(Party::from_role("unknown"), Party::A);
        assert_eq!(Party::from_role("system"), Party::A);
        assert_eq!(Party::from_role(""), Party::A);
    }

    #[test]
    fn opposite_alternates() {
        assert_eq!(Party::A.opposite(), Party::B);
        assert_eq!(Party::B.opposite().opposite(), Party::B);
    }
}
