//! Canned example scripts offered as a one-click alternative to editing.

use crate::error::SessionError;

pub const CANNED_SCRIPTS: [&str; 2] = ["alert('Hello world!')", "alert('Nice to see you!')"];

/// A script taken from [`CANNED_SCRIPTS`]. Only constructible from a valid index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CannedScript {
    index: usize,
}

impl CannedScript {
    pub fn get(index: usize) -> Option<Self> {
        (index < CANNED_SCRIPTS.len()).then_some(Self { index })
    }

    pub fn all() -> impl Iterator<Item = CannedScript> {
        (0..CANNED_SCRIPTS.len()).map(|index| Self { index })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn script(&self) -> &'static str {
        CANNED_SCRIPTS[self.index]
    }
}

impl TryFrom<usize> for CannedScript {
    type Error = SessionError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::get(index).ok_or(SessionError::UnknownCannedScript {
            index,
            available: CANNED_SCRIPTS.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        assert_eq!(CannedScript::get(0).unwrap().script(), "alert('Hello world!')");
        assert_eq!(CannedScript::get(1).unwrap().script(), "alert('Nice to see you!')");
        assert!(CannedScript::get(2).is_none());
        assert_eq!(CannedScript::all().count(), 2);
    }

    #[test]
    fn test_try_from_out_of_range() {
        assert_eq!(
            CannedScript::try_from(7),
            Err(SessionError::UnknownCannedScript {
                index: 7,
                available: 2
            })
        );
    }
}
