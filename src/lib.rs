/*
 *  lib.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Library root
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

//! Clock and weather status screens for small framebuffer displays.
//!
//! A single-threaded poll loop ticks an [`events::EventDispatcher`]; screens
//! built from YAML bind [`panels`] to [`display::Viewport`] regions and redraw
//! only what changed.

pub mod config;
pub mod constants;
pub mod controller;
pub mod data_source;
pub mod display;
pub mod events;
pub mod panels;
pub mod screen;

pub use controller::{ExitRequest, MainController};
