/*
 *  tests/controller_flow.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Controller wiring with a real configuration file
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

use std::cell::RefCell;
use std::fs::{self, File};
use std::rc::Rc;
use std::time::{Duration, SystemTime};

use lyclock::config::{self, Cli, ConfigWatcher};
use lyclock::display::drivers::DrawOp;
use lyclock::display::{Color, RecordingDisplay};
use lyclock::events::{ManualClock, NoButtons};
use lyclock::MainController;
use tempfile::TempDir;

const CONFIG: &str = r##"
update_interval: 5
display:
  driver: headless
  width: 320
  height: 240
screens:
  - name: main
    rows:
      - height: 200
        panel:
          class: text
          name: title
          color: "#ff0000"
          params:
            text: hello
      - height: 40
        panel:
          class: message
          name: message
  - name: second
    rows:
      - height: 240
        panel: {class: text, name: title, params: {text: second}}
"##;

fn text_colors(display: &Rc<RefCell<RecordingDisplay>>, wanted: &str) -> Vec<Color> {
    display
        .borrow()
        .ops()
        .iter()
        .filter_map(|op| match op {
            DrawOp::Text { text, color, .. } if text == wanted => Some(*color),
            _ => None,
        })
        .collect()
}

#[test]
fn test_reload_refreshes_active_screen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lyclock.yaml");
    fs::write(&path, CONFIG).unwrap();

    let cli = Cli { config: Some(path.clone()), ..Default::default() };
    let loaded = config::load(&cli).unwrap();
    let watcher = ConfigWatcher::new(loaded, cli);
    let display = Rc::new(RefCell::new(RecordingDisplay::new(320, 240)));
    let clock = Rc::new(ManualClock::new());
    let controller = MainController::new(watcher, display.clone(), Box::new(NoButtons), clock.clone());

    controller.start(None);
    assert_eq!(controller.current_screen().as_deref(), Some("main"));
    assert_eq!(text_colors(&display, "hello"), vec![Color::new(0xff, 0, 0)]);

    fs::write(&path, CONFIG.replace("#ff0000", "#0000ff")).unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();

    // reload waits for the update timer
    controller.tick();
    assert_eq!(text_colors(&display, "hello").len(), 1);

    clock.advance_secs(5.0);
    controller.tick();
    assert_eq!(
        text_colors(&display, "hello"),
        vec![Color::new(0xff, 0, 0), Color::new(0, 0, 0xff)]
    );
}

#[test]
fn test_bad_reload_keeps_running() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lyclock.yaml");
    fs::write(&path, CONFIG).unwrap();

    let cli = Cli { config: Some(path.clone()), ..Default::default() };
    let watcher = ConfigWatcher::new(config::load(&cli).unwrap(), cli);
    let display = Rc::new(RefCell::new(RecordingDisplay::new(320, 240)));
    let clock = Rc::new(ManualClock::new());
    let controller = MainController::new(watcher, display.clone(), Box::new(NoButtons), clock.clone());
    controller.start(Some("second"));

    fs::write(&path, "screens: [").unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();
    clock.advance_secs(5.0);
    assert_eq!(controller.tick(), None);
    assert_eq!(controller.current_screen().as_deref(), Some("second"));

    controller.dispatcher().send("trigger", &["screen", "main"]);
    controller.tick();
    assert_eq!(controller.current_screen().as_deref(), Some("main"));
}
