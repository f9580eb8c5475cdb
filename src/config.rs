//! Graphics Configuration
//!
//! Recognized options for the palette, sprite atlas, tile map and display.
//! Field names follow the persisted project layout (camelCase) so a
//! project's chip settings can be deserialized directly.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::{ColorData, DEFAULT_MASK_COLOR};
use crate::error::{check_dimensions, Error, Result};

/// Configuration for every graphics bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphicsConfig {
    /// Palette page size
    pub colors_per_page: i32,
    /// Palette page count (1-4)
    pub pages: i32,
    /// Transparent sentinel color
    pub mask_color: String,
    /// Slot substituted for mask-colored slots
    pub background_color: i32,
    /// Show mask-colored slots literally
    pub debug_mode: bool,
    /// Reject duplicate colors and sprites on write
    pub unique: bool,
    /// Upper bound (exclusive) for collision flags
    pub total_flags: i32,
    /// Sprite cell width
    pub width: i32,
    /// Sprite cell height
    pub height: i32,
    /// Sprite atlas page count (1-8)
    pub sprite_pages: i32,
    pub sprite_page_width: i32,
    pub sprite_page_height: i32,
    /// Tile map columns
    pub columns: i32,
    /// Tile map rows
    pub rows: i32,
    pub display_width: i32,
    pub display_height: i32,
    /// Draw requests accepted per frame
    pub max_draw_requests: usize,
    /// Append unseen sprites to the atlas during tile import
    pub auto_import: bool,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            colors_per_page: 64,
            pages: 4,
            mask_color: DEFAULT_MASK_COLOR.to_string(),
            background_color: 0,
            debug_mode: false,
            unique: false,
            total_flags: 16,
            width: 8,
            height: 8,
            sprite_pages: 4,
            sprite_page_width: 128,
            sprite_page_height: 128,
            columns: 32,
            rows: 30,
            display_width: 256,
            display_height: 240,
            max_draw_requests: 1024,
            auto_import: false,
        }
    }
}

impl GraphicsConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MissingResource(path.display().to_string()));
        }
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Total palette slots (`pages * colorsPerPage`)
    pub fn total_colors(&self) -> i32 {
        self.pages * self.colors_per_page
    }

    /// Check structural constraints
    pub fn validate(&self) -> Result<()> {
        if self.colors_per_page <= 0 {
            return Err(Error::Config(format!("colorsPerPage must be positive, got {}", self.colors_per_page)));
        }
        if !(1..=4).contains(&self.pages) {
            return Err(Error::Config(format!("pages must be in 1..=4, got {}", self.pages)));
        }
        if !ColorData::validate_hex(&self.mask_color) {
            return Err(Error::InvalidColor(self.mask_color.clone()));
        }
        if self.total_flags <= 0 {
            return Err(Error::Config(format!("totalFlags must be positive, got {}", self.total_flags)));
        }
        check_dimensions("sprite", self.width, self.height)?;
        check_dimensions("sprite page", self.sprite_page_width, self.sprite_page_height)?;
        if self.sprite_page_width % self.width != 0 || self.sprite_page_height % self.height != 0 {
            return Err(Error::Config(format!(
                "sprite page {}x{} is not a whole number of {}x{} cells",
                self.sprite_page_width, self.sprite_page_height, self.width, self.height
            )));
        }
        if !(1..=8).contains(&self.sprite_pages) {
            return Err(Error::Config(format!("spritePages must be in 1..=8, got {}", self.sprite_pages)));
        }
        check_dimensions("tile map", self.columns, self.rows)?;
        check_dimensions("display", self.display_width, self.display_height)?;
        if self.max_draw_requests == 0 {
            return Err(Error::Config("maxDrawRequests must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GraphicsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.total_colors(), 256);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GraphicsConfig::from_json(r##"{"colorsPerPage": 4, "pages": 1, "maskColor": "#000"}"##).unwrap();
        assert_eq!(config.total_colors(), 4);
        assert_eq!(config.mask_color, "#000");
        assert_eq!(config.columns, 32);
        assert_eq!(config.width, 8);
    }

    #[test]
    fn test_rejects_bad_mask_color() {
        let err = GraphicsConfig::from_json(r#"{"maskColor": "pink"}"#).unwrap_err();
        assert_eq!(err, Error::InvalidColor("pink".to_string()));
    }

    #[test]
    fn test_rejects_negative_dimensions() {
        let err = GraphicsConfig::from_json(r#"{"columns": -4}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { what: "tile map", .. }));
    }

    #[test]
    fn test_rejects_uneven_sprite_page() {
        let err = GraphicsConfig::from_json(r#"{"width": 5}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = GraphicsConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::MissingResource(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let config = GraphicsConfig { auto_import: true, ..Default::default() };
        let json = config.to_json().unwrap();
        assert!(json.contains("\"autoImport\": true"));
        assert_eq!(GraphicsConfig::from_json(&json).unwrap(), config);
    }
}
