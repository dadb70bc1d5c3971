//! Perception primitives and normalization.
//!
//! The sensing backend reports upper-case categories (`RED`, `CENTER`, `FULL`);
//! the control core works on the lower-cased [`CanonicalState`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Blob size at and above which the object fills the view.
pub const NEAR_BLOB_SIZE: f64 = 0.65;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    Red,
    Green,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    Left,
    Center,
    Right,
    Near,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Load {
    Empty,
    Full,
}

impl Color {
    pub fn as_str(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::None => "none",
        }
    }
}

impl Position {
    pub fn as_str(self) -> &'static str {
        match self {
            Position::Left => "left",
            Position::Center => "center",
            Position::Right => "right",
            Position::Near => "near",
            Position::None => "none",
        }
    }
}

impl Load {
    pub fn as_str(self) -> &'static str {
        match self {
            Load::Empty => "empty",
            Load::Full => "full",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Load {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the camera sees: a dominant blob colour, where it is, and how big.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vision {
    pub color: Color,
    pub position: Position,
    pub size: f64,
}

/// One reading from the sensing backend.
///
/// `depth` arrives already rounded by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    pub depth: f64,
    pub vision: Vision,
    pub load: Load,
}

impl RawReading {
    pub fn new(color: Color, position: Position, depth: f64, load: Load) -> Self {
        Self {
            depth,
            vision: Vision {
                color,
                position,
                size: 0.0,
            },
            load,
        }
    }
}

/// The state record the decision state machine reasons over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalState {
    pub color: Color,
    pub position: Position,
    pub depth: f64,
    pub load: Load,
}

impl CanonicalState {
    /// True if any categorical field differs.
    pub fn categories_differ(&self, other: &CanonicalState) -> bool {
        self.color != other.color || self.position != other.position || self.load != other.load
    }
}

impl fmt::Display for CanonicalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{color: {}, position: {}, depth: {}, load: {}}}",
            self.color, self.position, self.depth, self.load
        )
    }
}

/// Maps a raw reading onto the canonical state. Total; never fails.
pub fn normalize(reading: &RawReading) -> CanonicalState {
    CanonicalState {
        color: reading.vision.color,
        position: reading.vision.position,
        depth: reading.depth,
        load: reading.load,
    }
}

/// Classifies a detected blob by size and horizontal centre (`blob_x` in `0..1`).
pub fn classify_blob(color: Color, blob_size: f64, blob_x: f64) -> Position {
    if color == Color::None {
        return Position::None;
    }
    if blob_size >= NEAR_BLOB_SIZE {
        return Position::Near;
    }
    if 0.35 < blob_x && blob_x < 0.65 {
        Position::Center
    } else if 0.0 < blob_x && blob_x < 0.35 {
        Position::Left
    } else if 0.65 < blob_x && blob_x < 1.0 {
        Position::Right
    } else {
        Position::None
    }
}
