/*
 *  display/viewport.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Rectangular screen regions with their own display attributes
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

use log::{debug, error};
use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::{Rc, Weak};

use super::color::Color;
use super::geometry::{split, Axis, Margins, Rect};
use super::traits::{FontHandle, SharedDisplay};
use crate::constants::{ELLIPSIS, MISSING_IMAGE_TEXT, PRODUCER_TIMER, UNRENDERABLE_TEXT};
use crate::events::{EventDispatcher, EventHandler, Registration};

/// Partial viewport attributes, only the `Some` fields are applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewportConfig {
    /// Horizontal anchor within the inner rect, 0 = left, 1 = right
    pub fx: Option<f64>,

    /// Vertical anchor within the inner rect, 0 = top, 1 = bottom
    pub fy: Option<f64>,

    pub font_name: Option<String>,
    pub font_size: Option<u32>,
    pub color: Option<Color>,
    pub bg_color: Option<Color>,
    pub border_color: Option<Color>,
    pub margins: Option<Margins>,
}

impl ViewportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fx(mut self, fx: f64) -> Self { self.fx = Some(fx); self }
    pub fn fy(mut self, fy: f64) -> Self { self.fy = Some(fy); self }
    pub fn font(mut self, name: Option<&str>, size: u32) -> Self {
        self.font_name = name.map(str::to_string);
        self.font_size = Some(size);
        self
    }
    pub fn font_size(mut self, size: u32) -> Self { self.font_size = Some(size); self }
    pub fn color(mut self, color: Color) -> Self { self.color = Some(color); self }
    pub fn bg_color(mut self, color: Color) -> Self { self.bg_color = Some(color); self }
    pub fn border_color(mut self, color: Color) -> Self { self.border_color = Some(color); self }
    pub fn margins(mut self, margins: Margins) -> Self { self.margins = Some(margins); self }
}

/// Per-call drawing options for `text_with` and `image_with`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawOptions {
    /// Seconds until the viewport clears itself
    pub duration: Option<f64>,

    /// Draw over existing content instead of clearing first
    pub overwrite: bool,

    /// Text color instead of the viewport foreground
    pub color: Option<Color>,
}

impl DrawOptions {
    pub fn duration(mut self, secs: f64) -> Self { self.duration = Some(secs); self }
    pub fn overwrite(mut self) -> Self { self.overwrite = true; self }
    pub fn color(mut self, color: Color) -> Self { self.color = Some(color); self }
}

/// A screen region bound to the display and the event dispatcher.
///
/// Viewports are values: splitting and overlaying hand out new viewports and
/// nothing points back at the parent. A viewport without a rect is "null" and
/// every drawing operation on it does nothing.
#[derive(Clone)]
pub struct Viewport {
    display: SharedDisplay,
    dispatcher: Weak<EventDispatcher>,
    rect: Option<Rect>,
    inner_rect: Option<Rect>,
    fx: f64,
    fy: f64,
    font_name: Option<String>,
    font_size: u32,
    color: Color,
    bg_color: Color,
    border_color: Color,
    margins: Margins,
    font: RefCell<Option<FontHandle>>,
}

impl Viewport {
    pub fn new(display: SharedDisplay, dispatcher: &Rc<EventDispatcher>, rect: Option<Rect>) -> Self {
        Self::with_weak(display, Rc::downgrade(dispatcher), rect)
    }

    /// Viewport covering the whole display
    pub fn outer(display: SharedDisplay, dispatcher: &Rc<EventDispatcher>) -> Self {
        let rect = display.borrow().rect();
        Self::new(display, dispatcher, Some(rect))
    }

    fn with_weak(display: SharedDisplay, dispatcher: Weak<EventDispatcher>, rect: Option<Rect>) -> Self {
        Self {
            display,
            dispatcher,
            rect,
            inner_rect: rect,
            fx: 0.0,
            fy: 0.0,
            font_name: None,
            font_size: rect.map_or(0, |r| r.height.max(0) as u32),
            color: Color::WHITE,
            bg_color: Color::BLACK,
            border_color: Color::BLACK,
            margins: Margins::None,
            font: RefCell::new(None),
        }
    }

    pub fn rect(&self) -> Option<Rect> { self.rect }
    pub fn inner_rect(&self) -> Option<Rect> { self.inner_rect }
    pub fn is_null(&self) -> bool { self.rect.is_none() }
    pub fn fx(&self) -> f64 { self.fx }
    pub fn fy(&self) -> f64 { self.fy }
    pub fn font_size(&self) -> u32 { self.font_size }
    pub fn color(&self) -> Color { self.color }
    pub fn bg_color(&self) -> Color { self.bg_color }
    pub fn border_color(&self) -> Color { self.border_color }
    pub fn margins(&self) -> Margins { self.margins }

    pub fn display(&self) -> &SharedDisplay {
        &self.display
    }

    pub fn dispatcher(&self) -> Option<Rc<EventDispatcher>> {
        self.dispatcher.upgrade()
    }

    /// Merge the provided attributes, recompute the inner rect and drop the
    /// cached font.
    pub fn configure(&mut self, config: &ViewportConfig) {
        if let Some(fx) = config.fx { self.fx = fx; }
        if let Some(fy) = config.fy { self.fy = fy; }
        if config.font_name.is_some() { self.font_name = config.font_name.clone(); }
        if let Some(size) = config.font_size { self.font_size = size; }
        if let Some(color) = config.color { self.color = color; }
        if let Some(color) = config.bg_color { self.bg_color = color; }
        if let Some(color) = config.border_color { self.border_color = color; }
        if let Some(margins) = config.margins { self.margins = margins; }
        self.inner_rect = self.rect.map(|r| r.inner_rect(&self.margins));
        self.font.replace(None);
    }

    /// Font for the configured name and size, looked up once
    pub fn font(&self) -> FontHandle {
        if let Some(font) = self.font.borrow().as_ref() {
            return font.clone();
        }
        let font = self
            .display
            .borrow_mut()
            .get_font(self.font_name.as_deref(), self.font_size);
        self.font.replace(Some(font.clone()));
        font
    }

    /// Fill with the background, framed by the border color when margins leave a
    /// visible border.
    pub fn clear(&self) {
        let (Some(rect), Some(inner)) = (self.rect, self.inner_rect) else {
            return;
        };
        let mut display = self.display.borrow_mut();
        let framed = self.border_color != self.bg_color
            && (inner.width != rect.width || inner.height != rect.height);
        let result = if framed {
            display
                .fill_rectangle(self.border_color, rect)
                .and_then(|_| display.fill_rectangle(self.bg_color, inner))
        } else {
            display.fill_rectangle(self.bg_color, rect)
        };
        if let Err(e) = result {
            error!("Viewport clear failed: {}", e);
        }
    }

    pub fn text(&self, value: &str) {
        self.text_with(value, &DrawOptions::default());
    }

    /// Draw text at the anchor position, shortened with an ellipsis until it
    /// fits the inner width.
    pub fn text_with(&self, value: &str, options: &DrawOptions) {
        let (Some(rect), Some(inner)) = (self.rect, self.inner_rect) else {
            return;
        };
        if !options.overwrite {
            self.clear();
        }
        let font = self.font();
        let mut text = value.to_string();
        let text_rect = loop {
            let Some((width, height)) = self.measure(&mut text, &font) else {
                return;
            };
            let text_rect = rect
                .sub_rect()
                .fleft(self.fx)
                .ftop(self.fy)
                .width(width)
                .height(height)
                .margins(self.margins)
                .build();
            if text_rect.width <= inner.width {
                break text_rect;
            }
            let shortened = shorten(&text);
            if shortened.is_empty() {
                break text_rect;
            }
            text = format!("{}{}", shortened, ELLIPSIS);
        };
        let color = options.color.unwrap_or(self.color);
        if let Err(e) = self.display.borrow_mut().render_text(&text, &font, text_rect, color) {
            error!("Viewport text \"{}\" failed: {}", text, e);
        }
        if let Some(duration) = options.duration {
            self.schedule_clear(duration);
        }
    }

    // unmeasurable text is swapped for a placeholder
    fn measure(&self, text: &mut String, font: &FontHandle) -> Option<(i32, i32)> {
        let mut display = self.display.borrow_mut();
        match display.measure_text(text, font) {
            Ok(size) => Some(size),
            Err(e) => {
                error!("Bad text for display: {}", e);
                *text = UNRENDERABLE_TEXT.to_string();
                display
                    .measure_text(text, font)
                    .map_err(|e| error!("Placeholder text failed: {}", e))
                    .ok()
            }
        }
    }

    pub fn image(&self, path: &str) {
        self.image_with(path, &DrawOptions::default());
    }

    /// Draw an image file, or the missing placeholder text when it does not
    /// exist.
    pub fn image_with(&self, path: &str, options: &DrawOptions) {
        let Some(rect) = self.rect else {
            return;
        };
        if path.is_empty() || !Path::new(path).is_file() {
            error!("Image file is missing: {}", path);
            self.text_with(MISSING_IMAGE_TEXT, options);
            return;
        }
        if !options.overwrite {
            self.clear();
        }
        let image_rect = rect
            .sub_rect()
            .fleft(self.fx)
            .ftop(self.fy)
            .margins(self.margins)
            .build();
        if let Err(e) = self.display.borrow_mut().render_image(Path::new(path), image_rect) {
            error!("Viewport image failed: {}", e);
        }
        if let Some(duration) = options.duration {
            self.schedule_clear(duration);
        }
    }

    fn schedule_clear(&self, duration: f64) {
        let Some(dispatcher) = self.dispatcher.upgrade() else {
            debug!("Viewport auto-clear skipped, dispatcher is gone.");
            return;
        };
        let viewport = self.clone();
        dispatcher.register(
            PRODUCER_TIMER,
            EventHandler::new(move || viewport.clear()),
            Registration::timer_once(duration),
        );
    }

    /// Side by side child viewports, see `geometry::split`
    pub fn hsplit(&self, sizes: &[f64]) -> Vec<Viewport> {
        self.split(sizes, Axis::Horizontal)
    }

    /// Stacked child viewports, see `geometry::split`
    pub fn vsplit(&self, sizes: &[f64]) -> Vec<Viewport> {
        self.split(sizes, Axis::Vertical)
    }

    fn split(&self, sizes: &[f64], axis: Axis) -> Vec<Viewport> {
        split(self.rect, sizes, axis)
            .into_iter()
            .map(|rect| Viewport::with_weak(self.display.clone(), self.dispatcher.clone(), rect))
            .collect()
    }

    /// Sibling viewport over the same rect, starting from this viewport's
    /// attributes with `overrides` applied.
    pub fn overlay(&self, overrides: &ViewportConfig) -> Viewport {
        let mut overlay = self.clone();
        overlay.configure(overrides);
        overlay
    }
}

fn shorten(text: &str) -> String {
    let drop = if text.ends_with(ELLIPSIS) { ELLIPSIS.len() + 1 } else { 1 };
    let keep = text.chars().count().saturating_sub(drop);
    text.chars().take(keep).collect()
}

impl fmt::Debug for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("rect", &self.rect)
            .field("fx", &self.fx)
            .field("fy", &self.fy)
            .field("color", &self.color)
            .field("bg_color", &self.bg_color)
            .finish()
    }
}
