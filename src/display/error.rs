/*
 *  display/error.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error types for the display subsystem
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

use std::io;
use thiserror::Error;

/// Errors raised by display backends and the hardware around them
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Device could not be opened, mapped or set up
    #[error("Display initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Display I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Text could not be measured or rendered with the font
    #[error("Unable to render text \"{0}\"")]
    UnrenderableText(String),

    #[error("Image \"{path}\" error: {reason}")]
    ImageError { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_messages() {
        let err = DisplayError::ImageError { path: "a.png".into(), reason: "bad header".into() };
        assert_eq!(err.to_string(), "Image \"a.png\" error: bad header");
        let err: DisplayError = io::Error::new(io::ErrorKind::NotFound, "fb").into();
        assert!(err.source().is_some());
    }
}
