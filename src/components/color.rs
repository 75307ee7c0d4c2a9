//! Display colours for LEDs and 7-segment displays.
//!
//! Parsing accepts any CSS colour string: keywords, `#rgb`, `#rgba`,
//! `#rrggbb`, `#rrggbbaa`, `rgb()`, `hsl()` and friends.

use std::fmt;
use std::str::FromStr;

use crate::error::SimError;

/// An RGBA colour with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Color = Color::new(0xff, 0, 0);
    pub const LIME: Color = Color::new(0, 0xff, 0);

    /// Create an opaque colour from its components.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parse a CSS colour string. Surrounding whitespace is ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let [r, g, b, a] = csscolorparser::parse(text.trim()).ok()?.to_rgba8();
        Some(Self { r, g, b, a })
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 0xff
    }

    /// Keyword name if an opaque colour has one, otherwise lowercase
    /// `#rrggbb` (or `#rrggbbaa` when translucent).
    pub fn name(&self) -> String {
        if self.is_opaque() {
            let css = csscolorparser::Color::from_rgba8(self.r, self.g, self.b, self.a);
            if let Some(name) = css.name() {
                return name.to_string();
            }
            return format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b);
        }
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Color {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| SimError::InvalidColor {
            color: s.to_string(),
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
