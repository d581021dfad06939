/*
 *  display/geometry.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Rectangles, margins, sub-rectangles and axis splitting
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

use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;
use log::error;
use serde_yaml::Value;

/// Screen rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> i32 {
        self.left.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.top.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Rectangle minus margins, width and height clamped at zero
    pub fn inner_rect(&self, margins: &Margins) -> Rect {
        let (l, t, r, b) = margins.normalize();
        Rect {
            left: self.left.saturating_add(l),
            top: self.top.saturating_add(t),
            width: self.width.saturating_sub(l).saturating_sub(r).max(0),
            height: self.height.saturating_sub(t).saturating_sub(b).max(0),
        }
    }

    /// Start a sub-rectangle computation within this rectangle
    pub fn sub_rect(&self) -> SubRect {
        SubRect::new(*self)
    }
}

impl From<Rect> for Rectangle {
    fn from(r: Rect) -> Self {
        Rectangle::new(
            Point::new(r.left, r.top),
            Size::new(r.width.max(0) as u32, r.height.max(0) as u32),
        )
    }
}

/// Margin specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Margins {
    #[default]
    None,
    /// Same margin on all four sides
    All(i32),
    /// (horizontal, vertical), each applied to both opposite sides
    Symmetric(i32, i32),
    /// (left, top, right, bottom)
    Sides(i32, i32, i32, i32),
}

impl Margins {
    /// Normalize to (left, top, right, bottom)
    pub fn normalize(&self) -> (i32, i32, i32, i32) {
        match *self {
            Margins::None => (0, 0, 0, 0),
            Margins::All(m) => (m, m, m, m),
            Margins::Symmetric(h, v) => (h, v, h, v),
            Margins::Sides(l, t, r, b) => (l, t, r, b),
        }
    }

    /// Interpret a configuration value: an integer, a 2 or 4 integer list, or
    /// nothing. Anything else is logged and treated as no margins.
    pub fn from_value(value: &Value) -> Margins {
        match value {
            Value::Null => Margins::None,
            Value::Number(_) => match whole(value) {
                Some(m) => Margins::All(m),
                None => bad_margins(value),
            },
            Value::Sequence(items) => {
                let numbers: Option<Vec<i32>> = items.iter().map(whole).collect();
                match numbers.as_deref() {
                    Some([h, v]) => Margins::Symmetric(*h, *v),
                    Some([l, t, r, b]) => Margins::Sides(*l, *t, *r, *b),
                    _ => bad_margins(value),
                }
            }
            _ => bad_margins(value),
        }
    }
}

/// Normalize a configuration margins value, see `Margins::from_value`
pub fn normalize_margins(value: &Value) -> (i32, i32, i32, i32) {
    Margins::from_value(value).normalize()
}

fn whole(value: &Value) -> Option<i32> {
    if let Some(i) = value.as_i64() {
        return i32::try_from(i).ok();
    }
    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() <= i32::MAX as f64)
        .map(|f| f as i32)
}

fn bad_margins(value: &Value) -> Margins {
    error!("Bad margins value: {:?}", value);
    Margins::None
}

/// Sub-rectangle within the inner rectangle of an outer one.
///
/// Absolute pixel values take precedence over fractional ones. Fractional
/// positions anchor proportionally within the free space, so 0.5 centers and
/// 1.0 aligns right or bottom.
#[derive(Debug, Clone, Copy)]
pub struct SubRect {
    outer: Rect,
    left: Option<i32>,
    top: Option<i32>,
    width: Option<i32>,
    height: Option<i32>,
    fleft: Option<f64>,
    ftop: Option<f64>,
    fwidth: Option<f64>,
    fheight: Option<f64>,
    margins: Margins,
}

impl SubRect {
    pub fn new(outer: Rect) -> Self {
        Self {
            outer,
            left: None,
            top: None,
            width: None,
            height: None,
            fleft: None,
            ftop: None,
            fwidth: None,
            fheight: None,
            margins: Margins::None,
        }
    }

    pub fn left(mut self, left: i32) -> Self { self.left = Some(left); self }
    pub fn top(mut self, top: i32) -> Self { self.top = Some(top); self }
    pub fn width(mut self, width: i32) -> Self { self.width = Some(width); self }
    pub fn height(mut self, height: i32) -> Self { self.height = Some(height); self }
    pub fn fleft(mut self, fleft: f64) -> Self { self.fleft = Some(fleft); self }
    pub fn ftop(mut self, ftop: f64) -> Self { self.ftop = Some(ftop); self }
    pub fn fwidth(mut self, fwidth: f64) -> Self { self.fwidth = Some(fwidth); self }
    pub fn fheight(mut self, fheight: f64) -> Self { self.fheight = Some(fheight); self }
    pub fn margins(mut self, margins: Margins) -> Self { self.margins = margins; self }

    pub fn build(&self) -> Rect {
        let inner = self.outer.inner_rect(&self.margins);
        let width = extent(self.width, self.fwidth, inner.width);
        let height = extent(self.height, self.fheight, inner.height);
        Rect {
            left: inner.left.saturating_add(offset(self.left, self.fleft, inner.width.saturating_sub(width))),
            top: inner.top.saturating_add(offset(self.top, self.ftop, inner.height.saturating_sub(height))),
            width,
            height,
        }
    }
}

fn extent(absolute: Option<i32>, fraction: Option<f64>, available: i32) -> i32 {
    match (absolute, fraction) {
        (Some(px), _) => px,
        (None, Some(f)) => (f * available as f64) as i32,
        (None, None) => available,
    }
}

fn offset(absolute: Option<i32>, fraction: Option<f64>, free: i32) -> i32 {
    match (absolute, fraction) {
        (Some(px), _) => px,
        (None, Some(f)) => (f * free as f64).round() as i32,
        (None, None) => 0,
    }
}

/// Split direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Side by side columns (hsplit)
    Horizontal,
    /// Stacked rows (vsplit)
    Vertical,
}

impl Axis {
    fn label(self) -> &'static str {
        match self {
            Axis::Horizontal => "hsplit",
            Axis::Vertical => "vsplit",
        }
    }
}

/// Partition a rectangle along one axis, one slot per size.
///
/// Sizes in (0, 1) are fractions of the whole extent, sizes >= 1 are whole
/// pixels. Bad sizes and sizes that no longer fit give `None` for their slot
/// and consume nothing. Space left after the last size is unused. A `None`
/// parent gives all `None` children.
pub fn split(rect: Option<Rect>, sizes: &[f64], axis: Axis) -> Vec<Option<Rect>> {
    let Some(rect) = rect else {
        return vec![None; sizes.len()];
    };
    let available = match axis {
        Axis::Horizontal => rect.width,
        Axis::Vertical => rect.height,
    };
    let mut consumed = 0i32;
    let mut out = Vec::with_capacity(sizes.len());
    for &size in sizes {
        let pixels = if !(size > 0.0) {
            error!("{}: negative or zero size value: {}", axis.label(), size);
            None
        } else if size < 1.0 {
            Some((size * available as f64) as i32)
        } else if size.fract() != 0.0 || size > i32::MAX as f64 {
            error!("{}: bad pixel size value: {}", axis.label(), size);
            None
        } else {
            Some(size as i32)
        };
        let Some(pixels) = pixels else {
            out.push(None);
            continue;
        };
        if pixels > available - consumed {
            error!("{}: unable to fit size {}.", axis.label(), size);
            consumed = available;
            out.push(None);
            continue;
        }
        out.push(Some(match axis {
            Axis::Horizontal => Rect::new(rect.left + consumed, rect.top, pixels, rect.height),
            Axis::Vertical => Rect::new(rect.left, rect.top + consumed, rect.width, pixels),
        }));
        consumed += pixels;
    }
    out
}
