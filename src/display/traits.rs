/*
 *  display/traits.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display capability consumed by viewports
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

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use super::color::Color;
use super::error::DisplayError;
use super::geometry::Rect;

/// Font identity handed back by `Display::get_font` and cached per viewport
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontHandle {
    /// Font family name, None for the display's default face
    pub name: Option<String>,

    /// Requested pixel size
    pub size: u32,
}

/// Minimal drawing capability.
///
/// Every call is visible on the device when it returns; there is no separate
/// flush step.
pub trait Display {
    /// Full display rectangle
    fn rect(&self) -> Rect;

    /// Rendered (width, height) of `text`
    fn measure_text(&mut self, text: &str, font: &FontHandle) -> Result<(i32, i32), DisplayError>;

    fn render_text(&mut self, text: &str, font: &FontHandle, rect: Rect, color: Color) -> Result<(), DisplayError>;

    fn fill_rectangle(&mut self, color: Color, rect: Rect) -> Result<(), DisplayError>;

    /// Draw an image file scaled to fit within `rect`
    fn render_image(&mut self, path: &Path, rect: Rect) -> Result<(), DisplayError>;

    fn get_font(&mut self, name: Option<&str>, size: u32) -> FontHandle;

    /// Blank the device before exit
    fn shut_down(&mut self) -> Result<(), DisplayError> {
        let rect = self.rect();
        self.fill_rectangle(Color::BLACK, rect)
    }
}

/// Display shared by every viewport on the tick thread
pub type SharedDisplay = Rc<RefCell<dyn Display>>;
