use crate::Remoteness;
use serde::Deserialize;
use serde::Serialize;
use std::cmp::Ordering;

/// Game-theoretic value of a position for the player to move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Value {
    #[default]
    Undecided = 0,
    Lose = 1,
    Draw = 2,
    Tie = 3,
    Win = 4,
}

impl Value {
    pub const ALL: [Self; 5] = [
        Self::Undecided,
        Self::Lose,
        Self::Draw,
        Self::Tie,
        Self::Win,
    ];
    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Value {
    type Error = u8;
    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Self::ALL.get(byte as usize).copied().ok_or(byte)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Undecided => write!(f, "undecided"),
            Self::Lose => write!(f, "lose"),
            Self::Draw => write!(f, "draw"),
            Self::Tie => write!(f, "tie"),
            Self::Win => write!(f, "win"),
        }
    }
}

/// A value together with its remoteness.
///
/// Ordered from the point of view of the player to move: any Win beats any
/// Tie, which beats any Draw, which beats any Lose. A quick Win or Tie beats
/// a slow one, a slow Lose beats a quick one, and all Draws are equal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Outcome {
    pub value: Value,
    pub remoteness: Remoteness,
}

impl Outcome {
    pub const UNDECIDED: Self = Self::new(Value::Undecided, 0);

    pub const fn new(value: Value, remoteness: Remoteness) -> Self {
        Self { value, remoteness }
    }
    pub fn is_decided(&self) -> bool {
        self.value != Value::Undecided
    }
    /// What this outcome is worth to the player who moved into it.
    pub fn negate(self) -> Self {
        match self.value {
            Value::Win => Self::new(Value::Lose, self.remoteness + 1),
            Value::Lose => Self::new(Value::Win, self.remoteness + 1),
            Value::Tie => Self::new(Value::Tie, self.remoteness + 1),
            Value::Draw => Self::new(Value::Draw, 0),
            Value::Undecided => Self::UNDECIDED,
        }
    }
}

impl Ord for Outcome {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.value.cmp(&other.value) {
            Ordering::Equal => match self.value {
                Value::Lose => self.remoteness.cmp(&other.remoteness),
                Value::Win | Value::Tie => other.remoteness.cmp(&self.remoteness),
                Value::Draw | Value::Undecided => Ordering::Equal,
            },
            ordering => ordering,
        }
    }
}
impl PartialOrd for Outcome {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl PartialEq for Outcome {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Outcome {}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.value {
            Value::Draw | Value::Undecided => write!(f, "{}", self.value),
            _ => write!(f, "{} in {}", self.value, self.remoteness),
        }
    }
}
