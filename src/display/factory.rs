/*
 *  display/factory.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display backend selection from configuration
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

use crate::config::{DisplayConfig, DriverKind};
use crate::display::drivers::{LinuxFbDisplay, RecordingDisplay};
use crate::display::error::DisplayError;
use crate::display::geometry::Rect;
use crate::display::traits::SharedDisplay;
use log::info;
use std::cell::RefCell;
use std::rc::Rc;

/// Factory for creating displays from configuration
pub struct DisplayFactory;

impl DisplayFactory {
    /// Create the configured display backend.
    ///
    /// `linuxfb` maps the framebuffer device and draws into the configured
    /// rectangle; `headless` records drawing calls and is used for trial runs
    /// without hardware.
    pub fn create_from_config(config: &DisplayConfig) -> Result<SharedDisplay, DisplayError> {
        let (width, height) = (config.width(), config.height());
        if width == 0 || height == 0 {
            return Err(DisplayError::InvalidConfiguration(format!(
                "display size {}x{}",
                width, height
            )));
        }

        match config.driver() {
            DriverKind::Headless => {
                info!("Headless display {}x{}.", width, height);
                Ok(Rc::new(RefCell::new(RecordingDisplay::new(width, height).verbose())))
            }
            DriverKind::Linuxfb => {
                let rect = Rect::new(
                    config.left.unwrap_or(0),
                    config.top.unwrap_or(0),
                    width as i32,
                    height as i32,
                );
                let device = config.device();
                info!("Framebuffer display {} at {:?}.", device.display(), rect);
                Ok(Rc::new(RefCell::new(LinuxFbDisplay::open(&device, rect)?)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless() {
        let config = DisplayConfig {
            driver: Some(DriverKind::Headless),
            width: Some(320),
            height: Some(240),
            ..Default::default()
        };
        let display = DisplayFactory::create_from_config(&config).unwrap();
        assert_eq!(display.borrow().rect(), Rect::new(0, 0, 320, 240));
    }

    #[test]
    fn test_zero_size_rejected() {
        let config = DisplayConfig {
            driver: Some(DriverKind::Headless),
            width: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            DisplayFactory::create_from_config(&config),
            Err(DisplayError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_missing_framebuffer() {
        let config = DisplayConfig {
            driver: Some(DriverKind::Linuxfb),
            device: Some("/nonexistent/fb9".into()),
            ..Default::default()
        };
        assert!(DisplayFactory::create_from_config(&config).is_err());
    }
}
