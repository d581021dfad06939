/*
 *  display/mod.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem: drawing capability, geometry and viewports
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod color;
pub mod geometry;

// Offscreen rasterizing
pub mod canvas;

// Rectangular drawing regions
pub mod viewport;

// Display implementations
pub mod drivers;
pub mod factory;

// Button hardware
pub mod buttons;

// Re-exports for convenience
pub use traits::{Display, FontHandle, SharedDisplay};
pub use error::DisplayError;
pub use color::{Color, ColorResolver, ColorSpec};
pub use geometry::{split, Axis, Margins, Rect, SubRect};
pub use viewport::{DrawOptions, Viewport, ViewportConfig};
pub use drivers::{LinuxFbDisplay, RecordingDisplay};
pub use factory::DisplayFactory;
