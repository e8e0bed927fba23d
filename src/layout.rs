//! Key grid: which character (or action) lives under a normalized point.
//!
//! The surface is split vertically into letter rows followed by one action
//! row. Letter rows are partitioned into equal-width cells; the action row
//! has three zones (backspace, space, newline).

use strum::IntoStaticStr;

use crate::config::SwipekeyError;
use crate::normalize::NormalizedPoint;

/// One letter row: its characters left to right and the lower edge of its band.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyRow {
    keys: Vec<char>,
    band_end: f32,
}

impl KeyRow {
    pub fn new(keys: &str, band_end: f32) -> Self {
        Self {
            keys: keys.chars().collect(),
            band_end,
        }
    }

    pub fn keys(&self) -> &[char] {
        &self.keys
    }

    pub fn band_end(&self) -> f32 {
        self.band_end
    }

    fn key_at(&self, x: f32) -> char {
        let count = self.keys.len();
        // Float-to-int casts saturate, so negative x lands on column 0.
        let index = ((x * count as f32) as usize).min(count - 1);
        self.keys[index]
    }
}

/// What a tap on a point means when no swipe was accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum TapTarget {
    #[strum(serialize = "key")]
    Key(char),
    #[strum(serialize = "backspace")]
    Backspace,
    #[strum(serialize = "space")]
    Space,
    #[strum(serialize = "newline")]
    Newline,
}

/// Validated keyboard geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardLayout {
    rows: Vec<KeyRow>,
    backspace_zone_end: f32,
    newline_zone_start: f32,
}

impl Default for KeyboardLayout {
    /// Three QWERTY rows over the top 80%, action row below.
    fn default() -> Self {
        Self {
            rows: vec![
                KeyRow::new("qwertyuiop", 0.33),
                KeyRow::new("asdfghjkl", 0.66),
                KeyRow::new("zxcvbnm,.", 0.80),
            ],
            backspace_zone_end: 0.20,
            newline_zone_start: 0.80,
        }
    }
}

impl KeyboardLayout {
    /// Build a layout, rejecting geometry the resolver cannot partition.
    pub fn new(
        rows: Vec<KeyRow>,
        backspace_zone_end: f32,
        newline_zone_start: f32,
    ) -> Result<Self, SwipekeyError> {
        let invalid = |reason: String| Err(SwipekeyError::InvalidLayout { reason });

        if rows.is_empty() {
            return invalid("at least one key row is required".to_string());
        }

        let mut previous_end = 0.0;
        for (i, row) in rows.iter().enumerate() {
            if row.keys.is_empty() {
                return invalid(format!("row {} has no keys", i + 1));
            }
            if !(row.band_end > previous_end && row.band_end <= 1.0) {
                return invalid(format!(
                    "row {} band_end {} must be above {previous_end} and at most 1.0",
                    i + 1,
                    row.band_end
                ));
            }
            previous_end = row.band_end;
        }

        if !(0.0..=1.0).contains(&backspace_zone_end)
            || !(0.0..=1.0).contains(&newline_zone_start)
            || backspace_zone_end > newline_zone_start
        {
            return invalid(format!(
                "action zones must satisfy 0 <= backspace_zone_end ({backspace_zone_end}) \
                 <= newline_zone_start ({newline_zone_start}) <= 1"
            ));
        }

        Ok(Self {
            rows,
            backspace_zone_end,
            newline_zone_start,
        })
    }

    pub fn rows(&self) -> &[KeyRow] {
        &self.rows
    }

    pub fn backspace_zone_end(&self) -> f32 {
        self.backspace_zone_end
    }

    pub fn newline_zone_start(&self) -> f32 {
        self.newline_zone_start
    }

    /// Upper edge of the action row; the lower edge of the last letter row.
    pub fn action_row_top(&self) -> f32 {
        self.rows.last().map_or(1.0, KeyRow::band_end)
    }

    pub fn in_action_row(&self, point: NormalizedPoint) -> bool {
        point.y > self.action_row_top()
    }

    /// Resolve the letter key under `point`, or `None` inside the action row.
    pub fn resolve_key(&self, point: NormalizedPoint) -> Option<char> {
        if self.in_action_row(point) {
            return None;
        }
        let row = self
            .rows
            .iter()
            .find(|row| point.y < row.band_end)
            .or_else(|| self.rows.last())?;
        Some(row.key_at(point.x))
    }

    /// Decide what a plain tap at `point` produces.
    pub fn classify_tap(&self, point: NormalizedPoint) -> Option<TapTarget> {
        if !self.in_action_row(point) {
            return self.resolve_key(point).map(TapTarget::Key);
        }
        Some(if point.x < self.backspace_zone_end {
            TapTarget::Backspace
        } else if point.x > self.newline_zone_start {
            TapTarget::Newline
        } else {
            TapTarget::Space
        })
    }
}
