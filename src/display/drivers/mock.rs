/*
 *  display/drivers/mock.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Recording display for tests and headless runs
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

use log::debug;
use std::path::{Path, PathBuf};

use crate::display::color::Color;
use crate::display::error::DisplayError;
use crate::display::geometry::Rect;
use crate::display::traits::{Display, FontHandle};

/// One recorded drawing call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Fill { color: Color, rect: Rect },
    Text { text: String, font: FontHandle, rect: Rect, color: Color },
    Image { path: PathBuf, rect: Rect },
}

/// Display that records every operation instead of drawing.
///
/// Text metrics are deterministic: each character is half the font size wide
/// and the font size tall. Control characters cannot be measured.
///
/// Useful for:
/// - Unit and integration tests
/// - Running screens without a framebuffer (`--headless`)
#[derive(Debug, Clone)]
pub struct RecordingDisplay {
    width: u32,
    height: u32,
    ops: Vec<DrawOp>,
    /// Log each operation at debug level
    verbose: bool,
}

impl RecordingDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, ops: Vec::new(), verbose: false }
    }

    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    /// (text, rect) of every text render, in order
    pub fn rendered_texts(&self) -> Vec<(String, Rect)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, rect, .. } => Some((text.clone(), *rect)),
                _ => None,
            })
            .collect()
    }

    pub fn fills(&self) -> Vec<(Color, Rect)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Fill { color, rect } => Some((*color, *rect)),
                _ => None,
            })
            .collect()
    }

    fn record(&mut self, op: DrawOp) {
        if self.verbose {
            debug!("draw {:?}", op);
        }
        self.ops.push(op);
    }
}

impl Display for RecordingDisplay {
    fn rect(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    fn measure_text(&mut self, text: &str, font: &FontHandle) -> Result<(i32, i32), DisplayError> {
        if text.chars().any(char::is_control) {
            return Err(DisplayError::UnrenderableText(text.escape_debug().to_string()));
        }
        let size = font.size as i32;
        Ok((text.chars().count() as i32 * size / 2, size))
    }

    fn render_text(&mut self, text: &str, font: &FontHandle, rect: Rect, color: Color) -> Result<(), DisplayError> {
        self.record(DrawOp::Text { text: text.to_string(), font: font.clone(), rect, color });
        Ok(())
    }

    fn fill_rectangle(&mut self, color: Color, rect: Rect) -> Result<(), DisplayError> {
        self.record(DrawOp::Fill { color, rect });
        Ok(())
    }

    fn render_image(&mut self, path: &Path, rect: Rect) -> Result<(), DisplayError> {
        self.record(DrawOp::Image { path: path.to_path_buf(), rect });
        Ok(())
    }

    fn get_font(&mut self, name: Option<&str>, size: u32) -> FontHandle {
        FontHandle { name: name.map(str::to_string), size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let mut display = RecordingDisplay::new(100, 50);
        let font = display.get_font(None, 10);
        assert_eq!(display.measure_text("abcd", &font).unwrap(), (20, 10));
        assert!(display.measure_text("a\tb", &font).is_err());
    }

    #[test]
    fn test_records_in_order() {
        let mut display = RecordingDisplay::new(100, 50);
        let font = display.get_font(Some("lcd"), 8);
        display.fill_rectangle(Color::BLACK, Rect::new(0, 0, 10, 10)).unwrap();
        display.render_text("hi", &font, Rect::new(1, 1, 8, 8), Color::WHITE).unwrap();
        assert_eq!(display.ops().len(), 2);
        assert_eq!(display.rendered_texts(), vec![("hi".to_string(), Rect::new(1, 1, 8, 8))]);
        assert_eq!(display.take_ops().len(), 2);
        assert!(display.ops().is_empty());
    }

    #[test]
    fn test_shut_down_blanks() {
        let mut display = RecordingDisplay::new(100, 50);
        display.shut_down().unwrap();
        assert_eq!(display.fills(), vec![(Color::BLACK, Rect::new(0, 0, 100, 50))]);
    }
}
