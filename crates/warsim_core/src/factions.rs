//! Faction definitions and identifiers.

use serde::{Deserialize, Serialize};

/// One of the two sides in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FactionId {
    /// The Blue coalition.
    Blue,
    /// The Red coalition.
    Red,
}

impl FactionId {
    /// Both factions in canonical order.
    pub const ALL: [FactionId; 2] = [FactionId::Blue, FactionId::Red];

    /// Get the display name for this faction.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Blue => "Blue Coalition",
            Self::Red => "Red Coalition",
        }
    }

    /// Get the short name for this faction.
    #[must_use]
    pub const fn short_name(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Red => "red",
        }
    }

    /// The opposing faction.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Blue => Self::Red,
            Self::Red => Self::Blue,
        }
    }

    /// The faction whose engagements resolve first on `turn`.
    ///
    /// Blue leads on odd turns, Red on even turns.
    #[must_use]
    pub const fn first_mover(turn: u32) -> Self {
        if turn % 2 == 1 {
            Self::Blue
        } else {
            Self::Red
        }
    }
}

impl std::fmt::Display for FactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}
