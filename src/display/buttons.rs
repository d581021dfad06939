/*
 *  display/buttons.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  GPIO push buttons and backlight brightness
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

pub use crate::events::NoButtons;

/// Backlight PWM frequency (Hz)
pub const BRIGHTNESS_FREQUENCY: f64 = 1000.0;

/// Duty cycle for a 0-255 brightness
pub fn brightness_duty_cycle(brightness: u8) -> f64 {
    f64::from(brightness) / 255.0
}

#[cfg(feature = "gpio")]
mod gpio {
    use log::{debug, info};
    use rppal::gpio::{Gpio, InputPin, OutputPin};

    use super::{brightness_duty_cycle, BRIGHTNESS_FREQUENCY};
    use crate::display::error::DisplayError;
    use crate::events::ButtonDevice;

    fn gpio_error(e: rppal::gpio::Error) -> DisplayError {
        DisplayError::InitializationFailed(format!("GPIO: {}", e))
    }

    /// Pull-up inputs on BCM pins, a button reads low while pressed
    pub struct GpioButtons {
        pins: Vec<InputPin>,
        // held so the software PWM keeps running
        _backlight: Option<OutputPin>,
    }

    impl GpioButtons {
        pub fn new(bcm_pins: &[u8], brightness: Option<(u8, u8)>) -> Result<Self, DisplayError> {
            let gpio = Gpio::new().map_err(gpio_error)?;
            debug!("Initialize GPIO buttons {:?}.", bcm_pins);
            let pins = bcm_pins
                .iter()
                .map(|&pin| gpio.get(pin).map(|p| p.into_input_pullup()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(gpio_error)?;

            let backlight = match brightness {
                Some((pin, level)) => {
                    info!("Set brightness to {}.", level);
                    let mut out = gpio.get(pin).map_err(gpio_error)?.into_output();
                    out.set_pwm_frequency(BRIGHTNESS_FREQUENCY, brightness_duty_cycle(level))
                        .map_err(gpio_error)?;
                    Some(out)
                }
                None => None,
            };
            Ok(Self { pins, _backlight: backlight })
        }
    }

    impl ButtonDevice for GpioButtons {
        fn button_count(&self) -> usize {
            self.pins.len()
        }

        fn pressed_buttons(&self) -> Vec<usize> {
            self.pins
                .iter()
                .enumerate()
                .filter(|(_, pin)| pin.is_low())
                .map(|(i, _)| i)
                .collect()
        }
    }
}

#[cfg(feature = "gpio")]
pub use gpio::GpioButtons;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ButtonDevice;

    #[test]
    fn test_duty_cycle_range() {
        assert_eq!(brightness_duty_cycle(0), 0.0);
        assert_eq!(brightness_duty_cycle(255), 1.0);
        assert!((brightness_duty_cycle(128) - 0.502).abs() < 0.001);
    }

    #[test]
    fn test_no_buttons() {
        let buttons = NoButtons;
        assert_eq!(buttons.button_count(), 0);
        assert!(buttons.pressed_buttons().is_empty());
    }
}
