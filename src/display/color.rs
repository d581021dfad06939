/*
 *  display/color.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  RGB colors, configuration color specs and theme resolution
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use embedded_graphics::pixelcolor::{Rgb565, Rgb888};
use embedded_graphics::prelude::*;
use log::error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 24-bit color as used by panels and viewports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    /// Dim color for unlit LCD segments
    pub const GHOST: Color = Color::new(25, 25, 25);

    /// Parse `#rrggbb` or `rrggbb`
    pub fn from_hex(text: &str) -> Option<Color> {
        let hex = text.strip_prefix('#').unwrap_or(text);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Color::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn named(name: &str) -> Option<Color> {
        let c = match name.to_ascii_lowercase().as_str() {
            "black" => Color::BLACK,
            "white" => Color::WHITE,
            "ghost" => Color::GHOST,
            "red" => Color::new(255, 0, 0),
            "green" => Color::new(0, 255, 0),
            "blue" => Color::new(0, 0, 255),
            "yellow" => Color::new(255, 255, 0),
            "cyan" => Color::new(0, 255, 255),
            "magenta" => Color::new(255, 0, 255),
            "orange" => Color::new(255, 165, 0),
            "gray" | "grey" => Color::new(128, 128, 128),
            "darkgray" | "darkgrey" => Color::new(64, 64, 64),
            "lightgray" | "lightgrey" => Color::new(192, 192, 192),
            _ => return None,
        };
        Some(c)
    }

    pub fn to_rgb565(self) -> Rgb565 {
        Rgb888::new(self.r, self.g, self.b).into()
    }

    /// Pack as little-endian RGB565 framebuffer bytes
    pub fn to_rgb565_bytes(self) -> [u8; 2] {
        self.to_rgb565().into_storage().to_le_bytes()
    }
}

/// Color as written in configuration: a name, a hex string or an [r, g, b] list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Name(String),
    Rgb([u8; 3]),
}

/// Resolves configured colors, theme names first.
#[derive(Debug, Clone, Default)]
pub struct ColorResolver {
    theme: HashMap<String, Color>,
}

impl ColorResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every resolvable color from a theme table. Theme entries may refer to
    /// named or hex colors but not to other theme entries.
    pub fn with_theme(theme: &HashMap<String, ColorSpec>) -> Self {
        let mut resolver = Self::new();
        for (name, spec) in theme {
            if let Some(color) = resolver.resolve(spec) {
                resolver.add(name, color);
            }
        }
        resolver
    }

    pub fn add(&mut self, name: &str, color: Color) {
        self.theme.insert(name.to_ascii_lowercase(), color);
    }

    pub fn resolve(&self, spec: &ColorSpec) -> Option<Color> {
        match spec {
            ColorSpec::Rgb([r, g, b]) => Some(Color::new(*r, *g, *b)),
            ColorSpec::Name(name) => {
                let found = self
                    .theme
                    .get(&name.to_ascii_lowercase())
                    .copied()
                    .or_else(|| Color::named(name))
                    .or_else(|| Color::from_hex(name));
                if found.is_none() {
                    error!("Unable to resolve color \"{}\".", name);
                }
                found
            }
        }
    }

    pub fn resolve_opt(&self, spec: Option<&ColorSpec>) -> Option<Color> {
        spec.and_then(|s| self.resolve(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parse() {
        assert_eq!(Color::from_hex("#ff8000"), Some(Color::new(255, 128, 0)));
        assert_eq!(Color::from_hex("00ff00"), Some(Color::new(0, 255, 0)));
        assert_eq!(Color::from_hex("#fff"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
    }

    #[test]
    fn test_rgb565_packing() {
        assert_eq!(Color::WHITE.to_rgb565_bytes(), [0xff, 0xff]);
        assert_eq!(Color::BLACK.to_rgb565_bytes(), [0x00, 0x00]);
        assert_eq!(Color::new(255, 0, 0).to_rgb565().into_storage(), 0xf800);
    }

    #[test]
    fn test_theme_overrides_named() {
        let mut theme = HashMap::new();
        theme.insert("red".to_string(), ColorSpec::Name("#800000".into()));
        theme.insert("accent".to_string(), ColorSpec::Rgb([1, 2, 3]));
        let resolver = ColorResolver::with_theme(&theme);
        assert_eq!(resolver.resolve(&ColorSpec::Name("RED".into())), Some(Color::new(128, 0, 0)));
        assert_eq!(resolver.resolve(&ColorSpec::Name("accent".into())), Some(Color::new(1, 2, 3)));
        assert_eq!(resolver.resolve(&ColorSpec::Name("white".into())), Some(Color::WHITE));
        assert_eq!(resolver.resolve(&ColorSpec::Name("nope".into())), None);
    }

    #[test]
    fn test_color_spec_yaml() {
        let spec: ColorSpec = serde_yaml::from_str("[10, 20, 30]").unwrap();
        assert_eq!(spec, ColorSpec::Rgb([10, 20, 30]));
        let spec: ColorSpec = serde_yaml::from_str("\"#102030\"").unwrap();
        assert_eq!(spec, ColorSpec::Name("#102030".into()));
    }
}
