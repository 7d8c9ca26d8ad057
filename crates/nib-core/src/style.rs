//! Colors and path paint styles.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        let wide = |hi: u8, lo: u8| Some(((hex_val(hi)? << 4) | hex_val(lo)?) as f32 / 255.0);
        let narrow = |c: u8| Some((hex_val(c)? * 17) as f32 / 255.0);

        match bytes.len() {
            3 => Some(Self::rgba(narrow(bytes[0])?, narrow(bytes[1])?, narrow(bytes[2])?, 1.0)),
            4 => Some(Self::rgba(
                narrow(bytes[0])?,
                narrow(bytes[1])?,
                narrow(bytes[2])?,
                narrow(bytes[3])?,
            )),
            6 => Some(Self::rgba(
                wide(bytes[0], bytes[1])?,
                wide(bytes[2], bytes[3])?,
                wide(bytes[4], bytes[5])?,
                1.0,
            )),
            8 => Some(Self::rgba(
                wide(bytes[0], bytes[1])?,
                wide(bytes[2], bytes[3])?,
                wide(bytes[4], bytes[5])?,
                wide(bytes[6], bytes[7])?,
            )),
            _ => None,
        }
    }

    /// Parse a CSS-style color value: hex forms plus the handful of keyword
    /// colors that show up in imported markup.
    pub fn from_css(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.starts_with('#') {
            return Self::from_hex(value);
        }
        match value.to_ascii_lowercase().as_str() {
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            "red" => Some(Self::rgba(1.0, 0.0, 0.0, 1.0)),
            "green" => Some(Self::rgba(0.0, 128.0 / 255.0, 0.0, 1.0)),
            "blue" => Some(Self::rgba(0.0, 0.0, 1.0, 1.0)),
            "yellow" => Some(Self::rgba(1.0, 1.0, 0.0, 1.0)),
            "none" | "transparent" => Some(Self::TRANSPARENT),
            _ => None,
        }
    }

    /// Emit as shortest valid hex string (`#RRGGBB`, alpha channel only
    /// when not fully opaque).
    pub fn to_hex(&self) -> String {
        let r = (self.r * 255.0).round() as u8;
        let g = (self.g * 255.0).round() as u8;
        let b = (self.b * 255.0).round() as u8;
        let a = (self.a * 255.0).round() as u8;

        let mut out = String::with_capacity(9);
        let _ = write!(out, "#{r:02X}{g:02X}{b:02X}");
        if a != 255 {
            let _ = write!(out, "{a:02X}");
        }
        out
    }

    /// Channels as 8-bit values, premultiplication left to the caller.
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.a.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }
}

/// Stroke paint on a path outline: pen color and width in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePen {
    pub color: Color,
    pub width: f64,
}

/// How a rendered path is painted: a fill and an optional stroked outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathStyle {
    pub fill: Color,
    pub stroke: Option<StrokePen>,
}

impl PathStyle {
    pub const fn filled(fill: Color) -> Self {
        Self { fill, stroke: None }
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::filled(Color::BLACK)
    }
}
