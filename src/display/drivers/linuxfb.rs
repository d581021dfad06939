/*
 *  display/drivers/linuxfb.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Linux framebuffer display (RGB565 TFT hats on the Pi)
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

use embedded_graphics::mono_font::{iso_8859_1, MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use log::{info, warn};
use memmap2::{MmapMut, MmapOptions};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tiny_skia::{Pixmap, PixmapPaint, Transform};

use crate::display::canvas::Canvas;
use crate::display::color::Color;
use crate::display::error::DisplayError;
use crate::display::geometry::Rect;
use crate::display::traits::{Display, FontHandle};

const BYTES_PER_PIXEL: usize = 2;

// (font, bold variant) by ascending height
const FONTS: &[(&MonoFont<'static>, &MonoFont<'static>)] = &[
    (&iso_8859_1::FONT_4X6, &iso_8859_1::FONT_4X6),
    (&iso_8859_1::FONT_5X8, &iso_8859_1::FONT_5X8),
    (&iso_8859_1::FONT_6X10, &iso_8859_1::FONT_6X10),
    (&iso_8859_1::FONT_6X13, &iso_8859_1::FONT_6X13_BOLD),
    (&iso_8859_1::FONT_7X14, &iso_8859_1::FONT_7X14_BOLD),
    (&iso_8859_1::FONT_9X15, &iso_8859_1::FONT_9X15_BOLD),
    (&iso_8859_1::FONT_9X18, &iso_8859_1::FONT_9X18_BOLD),
    (&iso_8859_1::FONT_10X20, &iso_8859_1::FONT_10X20),
];

/// Mono font plus integer scale giving the tallest text not over `size`
#[derive(Debug, Clone, Copy)]
struct ScaledFont {
    font: &'static MonoFont<'static>,
    scale: u32,
}

impl ScaledFont {
    fn pick(handle: &FontHandle) -> Self {
        let bold = handle
            .name
            .as_deref()
            .is_some_and(|n| n.to_ascii_lowercase().contains("bold"));
        let size = handle.size.max(1);
        let mut best = ScaledFont { font: FONTS[0].0, scale: 1 };
        let mut best_height = 0;
        for &(regular, heavy) in FONTS {
            let font = if bold { heavy } else { regular };
            let h = font.character_size.height;
            let scale = (size / h).max(1);
            let height = h * scale;
            // ties go to the larger native face
            if height <= size && height >= best_height {
                best = ScaledFont { font, scale };
                best_height = height;
            }
        }
        best
    }

    fn native_size(&self, chars: u32) -> (u32, u32) {
        let advance = self.font.character_size.width + self.font.character_spacing;
        let width = (chars * advance).saturating_sub(self.font.character_spacing);
        (width, self.font.character_size.height)
    }

    fn size(&self, chars: u32) -> (i32, i32) {
        let (w, h) = self.native_size(chars);
        ((w * self.scale) as i32, (h * self.scale) as i32)
    }
}

/// Memory mapped `/dev/fbN` with 16 bit RGB565 pixels.
///
/// Writes land straight in the mapping, so every draw call is visible when it
/// returns.
pub struct LinuxFbDisplay {
    map: MmapMut,
    device: PathBuf,
    rect: Rect,
    fb_width: i32,
    fb_height: i32,
    stride: usize,
}

impl LinuxFbDisplay {
    /// Map the device. `rect` is the visible region in framebuffer pixels.
    pub fn open(device: &Path, rect: Rect) -> Result<Self, DisplayError> {
        let (fb_width, fb_height, stride) = match sysfs_geometry(device) {
            Some(geometry) => geometry,
            None => {
                warn!(
                    "No sysfs geometry for {}, assuming {}x{} RGB565.",
                    device.display(),
                    rect.right(),
                    rect.bottom()
                );
                let w = rect.right().max(0) as u32;
                (w, rect.bottom().max(0) as u32, w as usize * BYTES_PER_PIXEL)
            }
        };
        if rect.right() > fb_width as i32 || rect.bottom() > fb_height as i32 {
            return Err(DisplayError::InvalidConfiguration(format!(
                "display region {:?} exceeds framebuffer {}x{}",
                rect, fb_width, fb_height
            )));
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(device)
            .map_err(|e| {
                DisplayError::InitializationFailed(format!("{}: {}", device.display(), e))
            })?;
        let len = stride * fb_height as usize;
        // Safety: the mapping is private to this process for writing and is
        // only accessed through bounds-checked offsets below.
        let map = unsafe { MmapOptions::new().len(len).map_mut(&file)? };
        info!(
            "Framebuffer {} mapped: {}x{}, stride {}.",
            device.display(),
            fb_width,
            fb_height,
            stride
        );
        Ok(Self {
            map,
            device: device.to_path_buf(),
            rect,
            fb_width: fb_width as i32,
            fb_height: fb_height as i32,
            stride,
        })
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    #[inline]
    fn put(&mut self, x: i32, y: i32, bytes: [u8; 2]) {
        if x < 0 || y < 0 || x >= self.fb_width || y >= self.fb_height {
            return;
        }
        let offset = y as usize * self.stride + x as usize * BYTES_PER_PIXEL;
        if let Some(px) = self.map.get_mut(offset..offset + BYTES_PER_PIXEL) {
            px.copy_from_slice(&bytes);
        }
    }

    fn clip(&self, rect: Rect) -> Option<Rect> {
        let left = rect.left.max(self.rect.left);
        let top = rect.top.max(self.rect.top);
        let right = rect.right().min(self.rect.right());
        let bottom = rect.bottom().min(self.rect.bottom());
        (right > left && bottom > top).then(|| Rect::new(left, top, right - left, bottom - top))
    }

    fn load_image(path: &Path, rect: Rect) -> Result<Pixmap, DisplayError> {
        let image_error = |reason: String| DisplayError::ImageError {
            path: path.display().to_string(),
            reason,
        };
        let is_svg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
        if is_svg {
            let data = fs::read(path)?;
            let tree = usvg::Tree::from_data(&data, &usvg::Options::default())
                .map_err(|e| image_error(format!("{:?}", e)))?;
            let size = tree.size();
            let (w, h, scale) = fit(size.width(), size.height(), rect);
            let mut pixmap = Pixmap::new(w, h).ok_or_else(|| image_error("empty target".into()))?;
            resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
            Ok(pixmap)
        } else {
            let source = Pixmap::load_png(path).map_err(|e| image_error(e.to_string()))?;
            let (w, h, scale) = fit(source.width() as f32, source.height() as f32, rect);
            let mut pixmap = Pixmap::new(w, h).ok_or_else(|| image_error("empty target".into()))?;
            pixmap.draw_pixmap(
                0,
                0,
                source.as_ref(),
                &PixmapPaint::default(),
                Transform::from_scale(scale, scale),
                None,
            );
            Ok(pixmap)
        }
    }
}

/// Scaled (width, height, factor) fitting `w` x `h` inside `rect`
fn fit(w: f32, h: f32, rect: Rect) -> (u32, u32, f32) {
    if w <= 0.0 || h <= 0.0 {
        return (0, 0, 1.0);
    }
    let scale = (rect.width as f32 / w).min(rect.height as f32 / h);
    (
        (w * scale).round().max(1.0) as u32,
        (h * scale).round().max(1.0) as u32,
        scale,
    )
}

/// (width, height, stride) from /sys/class/graphics, RGB565 only
fn sysfs_geometry(device: &Path) -> Option<(u32, u32, usize)> {
    let name = device.file_name()?.to_str()?;
    let base = Path::new("/sys/class/graphics").join(name);
    let read = |file: &str| fs::read_to_string(base.join(file)).ok();
    let bpp: u32 = read("bits_per_pixel")?.trim().parse().ok()?;
    if bpp != 16 {
        warn!("{} is {} bpp, only RGB565 is supported.", device.display(), bpp);
        return None;
    }
    let size = read("virtual_size")?;
    let (w, h) = size.trim().split_once(',')?;
    let (w, h): (u32, u32) = (w.parse().ok()?, h.parse().ok()?);
    let stride = read("stride")
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(w as usize * BYTES_PER_PIXEL);
    Some((w, h, stride))
}

fn check_renderable(text: &str) -> Result<(), DisplayError> {
    if text.chars().any(|c| c.is_control() || c as u32 > 0xff) {
        return Err(DisplayError::UnrenderableText(text.escape_debug().to_string()));
    }
    Ok(())
}

impl Display for LinuxFbDisplay {
    fn rect(&self) -> Rect {
        self.rect
    }

    fn measure_text(&mut self, text: &str, font: &FontHandle) -> Result<(i32, i32), DisplayError> {
        check_renderable(text)?;
        Ok(ScaledFont::pick(font).size(text.chars().count() as u32))
    }

    fn render_text(&mut self, text: &str, font: &FontHandle, rect: Rect, color: Color) -> Result<(), DisplayError> {
        check_renderable(text)?;
        let scaled = ScaledFont::pick(font);
        let (w, h) = scaled.native_size(text.chars().count() as u32);
        let mut canvas = Canvas::new(w, h, BinaryColor::Off);
        let style = MonoTextStyle::new(scaled.font, BinaryColor::On);
        let _ = Text::with_baseline(text, Point::zero(), style, Baseline::Top).draw(&mut canvas);

        let Some(clip) = self.clip(rect) else {
            return Ok(());
        };
        let bytes = color.to_rgb565_bytes();
        let s = scaled.scale as i32;
        for (x, y, c) in canvas.pixels() {
            if !c.is_on() {
                continue;
            }
            for dy in 0..s {
                for dx in 0..s {
                    let px = rect.left + x as i32 * s + dx;
                    let py = rect.top + y as i32 * s + dy;
                    if px >= clip.left && px < clip.right() && py >= clip.top && py < clip.bottom() {
                        self.put(px, py, bytes);
                    }
                }
            }
        }
        Ok(())
    }

    fn fill_rectangle(&mut self, color: Color, rect: Rect) -> Result<(), DisplayError> {
        let Some(clip) = self.clip(rect) else {
            return Ok(());
        };
        let bytes = color.to_rgb565_bytes();
        let row: Vec<u8> = bytes.iter().copied().cycle().take(clip.width as usize * BYTES_PER_PIXEL).collect();
        for y in clip.top..clip.bottom() {
            let offset = y as usize * self.stride + clip.left as usize * BYTES_PER_PIXEL;
            if let Some(dst) = self.map.get_mut(offset..offset + row.len()) {
                dst.copy_from_slice(&row);
            }
        }
        Ok(())
    }

    fn render_image(&mut self, path: &Path, rect: Rect) -> Result<(), DisplayError> {
        let pixmap = Self::load_image(path, rect)?;
        let Some(clip) = self.clip(rect) else {
            return Ok(());
        };
        // center the fitted image in the rect
        let left = rect.left + (rect.width - pixmap.width() as i32) / 2;
        let top = rect.top + (rect.height - pixmap.height() as i32) / 2;
        let width = pixmap.width() as usize;
        for (i, px) in pixmap.pixels().iter().enumerate() {
            let c = px.demultiply();
            if c.alpha() < 128 {
                continue;
            }
            let x = left + (i % width) as i32;
            let y = top + (i / width) as i32;
            if x >= clip.left && x < clip.right() && y >= clip.top && y < clip.bottom() {
                self.put(x, y, Color::new(c.red(), c.green(), c.blue()).to_rgb565_bytes());
            }
        }
        Ok(())
    }

    fn get_font(&mut self, name: Option<&str>, size: u32) -> FontHandle {
        FontHandle { name: name.map(str::to_string), size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(size: u32) -> FontHandle {
        FontHandle { name: None, size }
    }

    #[test]
    fn test_font_pick_native() {
        let f = ScaledFont::pick(&handle(10));
        assert_eq!(f.font.character_size.height, 10);
        assert_eq!(f.scale, 1);
    }

    #[test]
    fn test_font_pick_scaled() {
        let f = ScaledFont::pick(&handle(100));
        assert_eq!(f.font.character_size.height * f.scale, 100);
        let f = ScaledFont::pick(&handle(3));
        assert_eq!(f.font.character_size.height, 6);
    }

    #[test]
    fn test_measure_scales() {
        let f = ScaledFont::pick(&handle(40));
        let (w, h) = f.size(5);
        assert_eq!(h, 40);
        assert_eq!(w, 5 * 10 * 2);
    }

    #[test]
    fn test_fit_keeps_aspect() {
        let (w, h, s) = fit(112.0, 112.0, Rect::new(0, 0, 56, 80));
        assert_eq!((w, h), (56, 56));
        assert!((s - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unrenderable() {
        assert!(check_renderable("72°F").is_ok());
        assert!(check_renderable("snow ❄").is_err());
    }
}
