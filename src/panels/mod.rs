/*
 *  panels/mod.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Panels: units of screen content and the class registry
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

pub mod time;
pub mod message;
pub mod text;
pub mod weather;

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

use crate::display::Viewport;
use crate::events::EventDispatcher;

pub use message::MessagePanel;
pub use text::TextPanel;
pub use time::TimePanel;
pub use weather::WeatherPanel;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("unknown panel class \"{0}\"")]
    UnknownClass(String),
    #[error("bad parameters for panel class \"{class}\": {source}")]
    BadParams {
        class: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Stateful screen content.
///
/// A panel never holds its viewport; the screen hands it over on every call.
pub trait Panel {
    /// Register panel-owned handlers (they are dropped on the next screen
    /// switch) and set up anything that depends on the viewport size.
    fn on_initialize(&mut self, dispatcher: &Rc<EventDispatcher>, viewport: &Viewport);

    /// Render the current state
    fn on_display(&mut self, viewport: &Viewport);

    /// True when the state changed since the last `on_display`
    fn on_check(&mut self) -> bool;

    /// Panels able to show transient messages return themselves here
    fn as_message_sink(&mut self) -> Option<&mut dyn MessageSink> {
        None
    }
}

/// A panel that displays operator messages
pub trait MessageSink {
    /// Show `text`, cleared automatically after `duration` seconds if given
    fn set_message(&mut self, text: &str, duration: Option<f64>);
}

pub type PanelFactory = Box<dyn Fn(&serde_yaml::Value) -> Result<Box<dyn Panel>, PanelError>>;

/// Panel class name to constructor.
pub struct PanelRegistry {
    factories: HashMap<String, PanelFactory>,
}

impl PanelRegistry {
    pub fn new() -> Self {
        Self { factories: HashMap::new() }
    }

    /// Registry with the built-in `time`, `message`, `text` and `weather`
    /// classes
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("time", |params| {
            let params: time::TimeParams = parse_params("time", params)?;
            Ok(Box::new(TimePanel::from_params(params)))
        });
        registry.register("message", |_| Ok(Box::new(MessagePanel::new())));
        registry.register("text", |params| {
            let params: text::TextParams = parse_params("text", params)?;
            Ok(Box::new(TextPanel::new(params.text)))
        });
        registry.register("weather", |params| {
            let params: weather::WeatherParams = parse_params("weather", params)?;
            Ok(Box::new(WeatherPanel::new(params)))
        });
        registry
    }

    /// Add or replace a class
    pub fn register<F>(&mut self, class: &str, factory: F)
    where
        F: Fn(&serde_yaml::Value) -> Result<Box<dyn Panel>, PanelError> + 'static,
    {
        self.factories.insert(class.to_string(), Box::new(factory));
    }

    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    pub fn classes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn create(&self, class: &str, params: &serde_yaml::Value) -> Result<Box<dyn Panel>, PanelError> {
        let factory = self
            .factories
            .get(class)
            .ok_or_else(|| PanelError::UnknownClass(class.to_string()))?;
        factory(params)
    }
}

impl Default for PanelRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for PanelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelRegistry").field("classes", &self.classes()).finish()
    }
}

/// Deserialize panel parameters, a missing block reads as an empty mapping
pub fn parse_params<T: DeserializeOwned>(class: &str, params: &serde_yaml::Value) -> Result<T, PanelError> {
    let value = match params {
        serde_yaml::Value::Null => serde_yaml::Value::Mapping(Default::default()),
        other => other.clone(),
    };
    serde_yaml::from_value(value).map_err(|source| PanelError::BadParams { class: class.to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> serde_yaml::Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_default_classes() {
        let registry = PanelRegistry::with_defaults();
        assert_eq!(registry.classes(), vec!["message", "text", "time", "weather"]);
    }

    #[test]
    fn test_create_with_params() {
        let registry = PanelRegistry::with_defaults();
        assert!(registry.create("time", &yaml("format: '%H:%M'\nghost_lcd: true")).is_ok());
        assert!(registry.create("message", &serde_yaml::Value::Null).is_ok());
        assert!(registry.create("text", &yaml("text: hello")).is_ok());
    }

    #[test]
    fn test_unknown_class() {
        let registry = PanelRegistry::with_defaults();
        match registry.create("radar", &serde_yaml::Value::Null) {
            Err(PanelError::UnknownClass(class)) => assert_eq!(class, "radar"),
            _ => panic!("expected UnknownClass"),
        }
    }

    #[test]
    fn test_missing_required_param() {
        let registry = PanelRegistry::with_defaults();
        assert!(matches!(
            registry.create("time", &serde_yaml::Value::Null),
            Err(PanelError::BadParams { .. })
        ));
    }

    #[test]
    fn test_register_custom_class() {
        let mut registry = PanelRegistry::new();
        registry.register("blank", |_| Ok(Box::new(TextPanel::new(String::new()))));
        assert!(registry.contains("blank"));
        assert!(!registry.contains("time"));
    }

    #[test]
    fn test_message_sink_capability() {
        let mut message: Box<dyn Panel> = Box::new(MessagePanel::new());
        let mut text: Box<dyn Panel> = Box::new(TextPanel::new("x".into()));
        assert!(message.as_message_sink().is_some());
        assert!(text.as_message_sink().is_none());
    }
}
