//! Shared value types for the pattern betting engine.
//!
//! Every subsystem speaks in terms of these types: block direction and
//! magnitude, the closed pattern set with its canonical iteration order,
//! pocket placement for the ZZ family, bucket classification for everything
//! else, and the verdict attached to evaluated signals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a block or a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Upward block (+1).
    Up,
    /// Downward block (-1).
    Down,
}

impl Direction {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// Converts a signed unit (+1 / -1) into a direction.
    #[must_use]
    pub const fn from_sign(sign: i32) -> Option<Self> {
        match sign {
            1 => Some(Self::Up),
            -1 => Some(Self::Down),
            _ => None,
        }
    }

    /// Returns the signed unit representation (+1 / -1).
    #[must_use]
    pub const fn sign(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "+1"),
            Self::Down => write!(f, "-1"),
        }
    }
}

/// One observed outcome: a direction plus a magnitude in percent.
///
/// Blocks are immutable after append; `index` is the 0-based position in the
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Monotonic 0-based position in the session.
    pub index: u32,
    /// Direction of the block.
    pub direction: Direction,
    /// Magnitude in [0, 100].
    pub magnitude: Decimal,
}

impl Block {
    /// Creates a new block. Range validation happens at the engine boundary.
    #[must_use]
    pub const fn new(index: u32, direction: Direction, magnitude: Decimal) -> Self {
        Self {
            index,
            direction,
            magnitude,
        }
    }
}

/// The closed set of named patterns.
///
/// The declaration order below is the canonical order: subsystems iterate
/// patterns in this order, serialization emits it, and hierarchy tie-breaks
/// fall back to it. The XAX family (`2A2`..`6A6`) bets that a run ends at
/// its nominal length; `AP5` bets trend continuation; `OZ`, `PP` and `ST`
/// are rhythm patterns. Every pattern has a designated opposite that fires
/// on the same structural trigger with the inverted expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pattern {
    #[serde(rename = "ZZ")]
    Zz,
    #[serde(rename = "AntiZZ")]
    AntiZz,
    #[serde(rename = "2A2")]
    Xax2,
    #[serde(rename = "Anti2A2")]
    AntiXax2,
    #[serde(rename = "3A3")]
    Xax3,
    #[serde(rename = "Anti3A3")]
    AntiXax3,
    #[serde(rename = "4A4")]
    Xax4,
    #[serde(rename = "Anti4A4")]
    AntiXax4,
    #[serde(rename = "5A5")]
    Xax5,
    #[serde(rename = "Anti5A5")]
    AntiXax5,
    #[serde(rename = "6A6")]
    Xax6,
    #[serde(rename = "Anti6A6")]
    AntiXax6,
    #[serde(rename = "AP5")]
    Ap5,
    #[serde(rename = "AntiAP5")]
    AntiAp5,
    #[serde(rename = "OZ")]
    Oz,
    #[serde(rename = "AntiOZ")]
    AntiOz,
    #[serde(rename = "PP")]
    Pp,
    #[serde(rename = "AntiPP")]
    AntiPp,
    #[serde(rename = "ST")]
    St,
    #[serde(rename = "AntiST")]
    AntiSt,
}

impl Pattern {
    /// All patterns in canonical order.
    pub const ALL: [Self; 20] = [
        Self::Zz,
        Self::AntiZz,
        Self::Xax2,
        Self::AntiXax2,
        Self::Xax3,
        Self::AntiXax3,
        Self::Xax4,
        Self::AntiXax4,
        Self::Xax5,
        Self::AntiXax5,
        Self::Xax6,
        Self::AntiXax6,
        Self::Ap5,
        Self::AntiAp5,
        Self::Oz,
        Self::AntiOz,
        Self::Pp,
        Self::AntiPp,
        Self::St,
        Self::AntiSt,
    ];

    /// Number of patterns in the closed set.
    pub const COUNT: usize = Self::ALL.len();

    /// Canonical index of this pattern, usable as a table key.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the designated opposite pattern.
    ///
    /// ZZ and AntiZZ form a special pair outside the bucket system; every
    /// other pattern pairs with its Anti partner for cross-pair loss
    /// transfer and bucket blocking.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Zz => Self::AntiZz,
            Self::AntiZz => Self::Zz,
            Self::Xax2 => Self::AntiXax2,
            Self::AntiXax2 => Self::Xax2,
            Self::Xax3 => Self::AntiXax3,
            Self::AntiXax3 => Self::Xax3,
            Self::Xax4 => Self::AntiXax4,
            Self::AntiXax4 => Self::Xax4,
            Self::Xax5 => Self::AntiXax5,
            Self::AntiXax5 => Self::Xax5,
            Self::Xax6 => Self::AntiXax6,
            Self::AntiXax6 => Self::Xax6,
            Self::Ap5 => Self::AntiAp5,
            Self::AntiAp5 => Self::Ap5,
            Self::Oz => Self::AntiOz,
            Self::AntiOz => Self::Oz,
            Self::Pp => Self::AntiPp,
            Self::AntiPp => Self::Pp,
            Self::St => Self::AntiSt,
            Self::AntiSt => Self::St,
        }
    }

    /// Returns true for Anti partners.
    #[must_use]
    pub const fn is_anti(self) -> bool {
        matches!(
            self,
            Self::AntiZz
                | Self::AntiXax2
                | Self::AntiXax3
                | Self::AntiXax4
                | Self::AntiXax5
                | Self::AntiXax6
                | Self::AntiAp5
                | Self::AntiOz
                | Self::AntiPp
                | Self::AntiSt
        )
    }

    /// Returns the base pattern (identity for non-Anti patterns).
    #[must_use]
    pub const fn base(self) -> Self {
        if self.is_anti() {
            self.opposite()
        } else {
            self
        }
    }

    /// Returns true for ZZ and AntiZZ, which are governed by the pocket
    /// system instead of the bucket system.
    #[must_use]
    pub const fn is_zz_family(self) -> bool {
        matches!(self, Self::Zz | Self::AntiZz)
    }

    /// Returns true for the base XAX patterns (2A2..6A6).
    #[must_use]
    pub const fn is_xax(self) -> bool {
        matches!(
            self,
            Self::Xax2 | Self::Xax3 | Self::Xax4 | Self::Xax5 | Self::Xax6
        )
    }

    /// Nominal run length for XAX patterns (2 for 2A2, ... 6 for 6A6).
    #[must_use]
    pub const fn xax_length(self) -> Option<u32> {
        match self.base() {
            Self::Xax2 => Some(2),
            Self::Xax3 => Some(3),
            Self::Xax4 => Some(4),
            Self::Xax5 => Some(5),
            Self::Xax6 => Some(6),
            _ => None,
        }
    }

    /// Returns true if this pattern predicts the current run to end
    /// (expected next direction is the opposite of the current block).
    ///
    /// Base alternation patterns: ZZ, the XAX family, OZ, PP, ST. AP5 is a
    /// continuation pattern. Anti partners invert their base.
    #[must_use]
    pub const fn is_alternation(self) -> bool {
        match self {
            Self::Zz
            | Self::Xax2
            | Self::Xax3
            | Self::Xax4
            | Self::Xax5
            | Self::Xax6
            | Self::Oz
            | Self::Pp
            | Self::St
            | Self::AntiAp5 => true,
            Self::Ap5
            | Self::AntiZz
            | Self::AntiXax2
            | Self::AntiXax3
            | Self::AntiXax4
            | Self::AntiXax5
            | Self::AntiXax6
            | Self::AntiOz
            | Self::AntiPp
            | Self::AntiSt => false,
        }
    }

    /// Expected direction for the next block given the current block's
    /// direction.
    #[must_use]
    pub const fn expected_direction(self, current: Direction) -> Direction {
        if self.is_alternation() {
            current.opposite()
        } else {
            current
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Zz => "ZZ",
            Self::AntiZz => "AntiZZ",
            Self::Xax2 => "2A2",
            Self::AntiXax2 => "Anti2A2",
            Self::Xax3 => "3A3",
            Self::AntiXax3 => "Anti3A3",
            Self::Xax4 => "4A4",
            Self::AntiXax4 => "Anti4A4",
            Self::Xax5 => "5A5",
            Self::AntiXax5 => "Anti5A5",
            Self::Xax6 => "6A6",
            Self::AntiXax6 => "Anti6A6",
            Self::Ap5 => "AP5",
            Self::AntiAp5 => "AntiAP5",
            Self::Oz => "OZ",
            Self::AntiOz => "AntiOZ",
            Self::Pp => "PP",
            Self::AntiPp => "AntiPP",
            Self::St => "ST",
            Self::AntiSt => "AntiST",
        };
        write!(f, "{name}")
    }
}

/// Betting permission for the ZZ family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pocket {
    /// Allowed to bet real trades.
    P1,
    /// Observe only; state is still tracked.
    P2,
}

/// Per-pattern play mode in the bucket system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketKind {
    /// Play the pattern's predicted direction.
    Main,
    /// No play.
    Waiting,
    /// Play the inverse direction (bait-and-switch).
    Bns,
}

/// Quality verdict attached to an evaluated signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Correct with a decisive magnitude.
    Fair,
    /// Correct but inside the neutral band around 50.
    Neutral,
    /// Incorrect with a mild magnitude.
    Unfair,
    /// Incorrect with a magnitude of 70 or more.
    Fake,
}
