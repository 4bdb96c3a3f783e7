//! Reviewer/paper conflict classification over stored conflict codes.
//!
//! Stored codes use a small bit layout: bit 0 pins a conflict so automatic
//! processes leave it alone, bits 1-4 mark a general (administrative)
//! conflict, `32` marks an author and `64` a contact author.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub const CONFLICT_PINNED: u32 = 1;
pub const CONFLICT_GENERAL: u32 = 2;
pub const CONFLICT_GENERAL_MASK: u32 = 0x1E;
pub const CONFLICT_AUTHOR: u32 = 32;
pub const CONFLICT_CONTACT_AUTHOR: u32 = 64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    #[default]
    None,
    General {
        pinned: bool,
    },
    Author,
    ContactAuthor,
}

impl ConflictKind {
    pub fn code(self) -> u32 {
        match self {
            Self::None => 0,
            Self::General { pinned: false } => CONFLICT_GENERAL,
            Self::General { pinned: true } => CONFLICT_GENERAL | CONFLICT_PINNED,
            Self::Author => CONFLICT_AUTHOR,
            Self::ContactAuthor => CONFLICT_CONTACT_AUTHOR,
        }
    }

    pub fn is_conflicted(self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn is_author(self) -> bool {
        matches!(self, Self::Author | Self::ContactAuthor)
    }

    pub fn as_action(self) -> &'static str {
        match self {
            Self::None => "off",
            Self::General { pinned: false } => "on",
            Self::General { pinned: true } => "pinned",
            Self::Author => "author",
            Self::ContactAuthor => "contact",
        }
    }
}

impl Display for ConflictKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::None => "none",
            Self::General { pinned: false } => "conflict",
            Self::General { pinned: true } => "pinned conflict",
            Self::Author => "author",
            Self::ContactAuthor => "contact author",
        };
        write!(f, "{label}")
    }
}

impl From<u32> for ConflictKind {
    fn from(code: u32) -> Self {
        classify(code)
    }
}

pub fn classify(code: u32) -> ConflictKind {
    if code & CONFLICT_CONTACT_AUTHOR != 0 {
        ConflictKind::ContactAuthor
    } else if code & CONFLICT_AUTHOR != 0 {
        ConflictKind::Author
    } else if code & CONFLICT_GENERAL_MASK != 0 {
        ConflictKind::General {
            pinned: code & CONFLICT_PINNED != 0,
        }
    } else {
        // A bare pin bit marks a pinned non-conflict.
        ConflictKind::None
    }
}

pub fn is_conflicted(code: u32) -> bool {
    classify(code).is_conflicted()
}

pub fn is_author(code: u32) -> bool {
    classify(code).is_author()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_code_space() {
        assert_eq!(classify(0), ConflictKind::None);
        assert_eq!(classify(CONFLICT_PINNED), ConflictKind::None);
        assert_eq!(classify(2), ConflictKind::General { pinned: false });
        assert_eq!(classify(3), ConflictKind::General { pinned: true });
        assert_eq!(classify(8), ConflictKind::General { pinned: false });
        assert_eq!(classify(32), ConflictKind::Author);
        assert_eq!(classify(64), ConflictKind::ContactAuthor);
        assert_eq!(classify(64 | 32), ConflictKind::ContactAuthor);
    }

    #[test]
    fn author_conflicts_are_conflicted() {
        for code in [2, 3, 32, 64] {
            assert!(is_conflicted(code), "code {code}");
        }
        assert!(!is_conflicted(0));
        assert!(is_author(32));
        assert!(is_author(64));
        assert!(!is_author(3));
    }

    #[test]
    fn canonical_codes_classify_back() {
        let kinds = [
            ConflictKind::None,
            ConflictKind::General { pinned: false },
            ConflictKind::General { pinned: true },
            ConflictKind::Author,
            ConflictKind::ContactAuthor,
        ];
        for kind in kinds {
            assert_eq!(classify(kind.code()), kind);
        }
    }
}
