//! Color values
//!
//! Palette slots hold concrete RGB colors. They are written and persisted as
//! hex strings (`#RGB` or `#RRGGBB`) and handed to the presentation layer as
//! packed ARGB words.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default transparent sentinel color
pub const DEFAULT_MASK_COLOR: &str = "#FF00FF";

/// A packed RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorData {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorData {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a strict hex color
    ///
    /// Accepts exactly `#` followed by 3 or 6 hex digits. The short form is
    /// expanded (`#F0A` -> `#FF00AA`).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex
            .strip_prefix('#')
            .ok_or_else(|| Error::InvalidColor(hex.to_string()))?;

        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(hex.to_string()));
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| Error::InvalidColor(hex.to_string()));

        match digits.len() {
            6 => Ok(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let r = channel(&digits[0..1])?;
                let g = channel(&digits[1..2])?;
                let b = channel(&digits[2..3])?;
                Ok(Self::new(r * 17, g * 17, b * 17))
            }
            _ => Err(Error::InvalidColor(hex.to_string())),
        }
    }

    /// Check a string against the hex color pattern without parsing it
    pub fn validate_hex(hex: &str) -> bool {
        Self::from_hex(hex).is_ok()
    }

    /// Uppercase `#RRGGBB` form
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Opaque ARGB8888 word
    #[inline]
    pub fn to_argb(&self) -> u32 {
        0xFF00_0000 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

impl FromStr for ColorData {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for ColorData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
