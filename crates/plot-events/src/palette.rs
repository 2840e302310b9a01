//! Character color palette.
//!
//! One palette, explicit cursors. Callers that assign colors own a
//! [`PaletteCursor`] and advance it themselves; there is no hidden counter.

use serde::{Deserialize, Serialize};

/// Default character colors (vibrant, distinct).
pub const DEFAULT_CHARACTER_COLORS: [&str; 10] = [
    "#ef4444", // red
    "#f97316", // orange
    "#eab308", // yellow
    "#22c55e", // green
    "#14b8a6", // teal
    "#3b82f6", // blue
    "#8b5cf6", // violet
    "#ec4899", // pink
    "#06b6d4", // cyan
    "#84cc16", // lime
];

/// Ordered list of colors, cycled by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette {
    colors: Vec<String>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_CHARACTER_COLORS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Palette {
    /// Creates a palette from the given colors. An empty list falls back to
    /// the default colors.
    pub fn new<I>(colors: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let colors: Vec<String> = colors.into_iter().map(Into::into).collect();
        if colors.is_empty() {
            Self::default()
        } else {
            Self { colors }
        }
    }

    /// Returns the color at `index`, wrapping around the palette.
    pub fn color_at(&self, index: usize) -> &str {
        if self.colors.is_empty() {
            return DEFAULT_CHARACTER_COLORS[index % DEFAULT_CHARACTER_COLORS.len()];
        }
        &self.colors[index % self.colors.len()]
    }

    /// Number of distinct colors before the cycle repeats.
    pub fn len(&self) -> usize {
        if self.colors.is_empty() {
            DEFAULT_CHARACTER_COLORS.len()
        } else {
            self.colors.len()
        }
    }

    /// A palette is never empty; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Position in a palette cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaletteCursor(usize);

impl PaletteCursor {
    /// Cursor starting at `position`.
    pub fn at(position: usize) -> Self {
        Self(position)
    }

    /// Returns the color under the cursor and advances it.
    pub fn next_color(&mut self, palette: &Palette) -> String {
        let color = palette.color_at(self.0).to_string();
        self.0 = self.0.wrapping_add(1);
        color
    }

    /// Current position.
    pub fn position(&self) -> usize {
        self.0
    }

    /// Moves the cursor back to the start of the cycle.
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_wraps() {
        let palette = Palette::new(["#000000", "#ffffff"]);
        let mut cursor = PaletteCursor::default();
        assert_eq!(cursor.next_color(&palette), "#000000");
        assert_eq!(cursor.next_color(&palette), "#ffffff");
        assert_eq!(cursor.next_color(&palette), "#000000");
        assert_eq!(cursor.position(), 3);
        cursor.reset();
        assert_eq!(cursor.next_color(&palette), "#000000");
    }

    #[test]
    fn test_empty_palette_falls_back() {
        let palette = Palette::new(Vec::<String>::new());
        assert_eq!(palette.len(), 10);
        assert_eq!(palette.color_at(0), "#ef4444");

        let deserialized: Palette = serde_json::from_str("[]").unwrap();
        assert_eq!(deserialized.color_at(11), "#f97316");
    }
}
