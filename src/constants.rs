/*
 *  constants.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Global defaults shared by the event, display and panel modules
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

//! This module contains global constants used across the event, display and panel modules.

use std::time::Duration;

/// Application name, used for config search paths and the user agent.
pub const APP_NAME: &str = "lyclock";

/// Default main loop poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL: f64 = 0.1;
/// Default configuration file check interval in seconds.
pub const DEFAULT_UPDATE_INTERVAL: f64 = 5.0;

/// A producer tick slower than this is reported.
pub const SLOW_TICK_THRESHOLD: Duration = Duration::from_millis(100);

// producer names, registration order matters for tick ordering
pub const PRODUCER_BUTTON: &str = "button";
pub const PRODUCER_TIMER: &str = "timer";
pub const PRODUCER_TICK: &str = "tick";
pub const PRODUCER_TRIGGER: &str = "trigger";

/// Trigger used to request a screen switch at the next tick.
pub const TRIGGER_SCREEN: &str = "screen";

/// Appended to text that had to be shortened to fit.
pub const ELLIPSIS: &str = "...";
/// Rendered when text cannot be measured.
pub const UNRENDERABLE_TEXT: &str = "???";
/// Rendered in place of an image file that does not exist.
pub const MISSING_IMAGE_TEXT: &str = "*missing*";

/// Default display geometry, a 480x320 TFT hat.
pub const DEFAULT_DISPLAY_WIDTH: u32 = 480;
pub const DEFAULT_DISPLAY_HEIGHT: u32 = 320;
pub const DEFAULT_FRAMEBUFFER: &str = "/dev/fb1";

/// On-disk data source cache folder.
pub const CACHE_FOLDER: &str = "/tmp/lyclock-cache";

/// Pause after showing the exit/poweroff message before stopping.
pub const EXIT_MESSAGE_PAUSE: Duration = Duration::from_secs(2);
