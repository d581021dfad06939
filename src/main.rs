/*
 *  main.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  LyClock binary: CLI, logging, display and poll loop
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

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use std::rc::Rc;

use lyclock::config::{self, ButtonsConfig, Cli, ConfigWatcher};
use lyclock::controller::power_off;
use lyclock::display::DisplayFactory;
use lyclock::events::{ButtonDevice, SystemClock};
use lyclock::{ExitRequest, MainController};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

#[cfg(feature = "gpio")]
fn create_buttons(config: &ButtonsConfig) -> Box<dyn ButtonDevice> {
    use lyclock::display::buttons::{GpioButtons, NoButtons};
    let brightness = config.brightness_pin.zip(config.brightness);
    match GpioButtons::new(&config.pins, brightness) {
        Ok(buttons) => Box::new(buttons),
        Err(e) => {
            error!("Buttons unavailable: {}", e);
            Box::new(NoButtons)
        }
    }
}

#[cfg(not(feature = "gpio"))]
fn create_buttons(config: &ButtonsConfig) -> Box<dyn ButtonDevice> {
    use lyclock::display::buttons::NoButtons;
    if !config.pins.is_empty() {
        log::warn!("Built without the gpio feature, {} button pins ignored.", config.pins.len());
    }
    Box::new(NoButtons)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("{} v.{} built {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), BUILD_DATE);
        return Ok(());
    }

    let loaded = config::load(&cli).context("loading configuration")?;
    if cli.dump_config {
        print!("{}", config::dump(&loaded.config)?);
        return Ok(());
    }

    let level = loaded.config.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("This {} tells the time", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);
    match loaded.path.as_deref() {
        Some(path) => info!("Configuration {}.", path.display()),
        None => info!("No configuration file, using defaults."),
    }

    let display = DisplayFactory::create_from_config(&loaded.config.display())
        .context("opening display")?;
    let buttons = create_buttons(&loaded.config.buttons());
    let watcher = ConfigWatcher::new(loaded, cli);
    let controller = MainController::new(watcher, display.clone(), buttons, Rc::new(SystemClock));

    let request = controller.run(None).await;
    info!("Stopping ({:?}).", request);
    if let Err(e) = display.borrow_mut().shut_down() {
        error!("Display shut down failed: {}", e);
    }
    if request == ExitRequest::PowerOff {
        power_off().await?;
    }
    Ok(())
}
