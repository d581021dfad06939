/*
 *  panels/weather.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  NOAA current conditions panel
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

use log::{debug, error};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::Panel;
use crate::constants::{CACHE_FOLDER, PRODUCER_TIMER};
use crate::data_source::{http_client, DataSource, FileDataSource, JsonDataSource, Schema};
use crate::display::Viewport;
use crate::events::{EventDispatcher, EventHandler, Registration};

// cached sources make frequent polls cheap
const POLL_FREQUENCY: f64 = 60.0;
const BASE_URL: &str = "https://api.weather.gov";

const POINTS_URL: &str = "/points/{latitude},{longitude}";
const POINTS_CACHE_TIMEOUT: u64 = 0;
const STATIONS_URL: &str = "/gridpoints/{wfo}/{x},{y}/stations";
const STATIONS_CACHE_TIMEOUT: u64 = 900;
const OBSERVATIONS_URL: &str = "/stations/{station}/observations/latest";
const OBSERVATIONS_CACHE_TIMEOUT: u64 = 900;
const ICON_CACHE_TIMEOUT: u64 = 30 * 86400;
const ICON_EXTENSION: &str = ".png";

/// Format that shows the conditions icon instead of text
pub const ICON_FORMAT: &str = "%I";
const NO_DATA: &str = "--";
const NO_ICON: &str = "(no icon)";

fn default_cache_folder() -> PathBuf {
    PathBuf::from(CACHE_FOLDER)
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherParams {
    pub latitude: f64,
    pub longitude: f64,
    /// `%S` timestamp, `%T` temperature, `%D` description, or `%I` alone
    pub format: String,
    /// Domain and email identify the client to the NOAA API
    pub domain: String,
    pub email: String,
    #[serde(default)]
    pub metric: bool,
    #[serde(default = "default_cache_folder")]
    pub cache_folder: PathBuf,
}

#[derive(Debug, Error)]
enum WeatherError {
    #[error("NOAA {0} data is unavailable")]
    Unavailable(&'static str),
    #[error("bad or unexpected NOAA data: {0}")]
    BadData(String),
}

/// Displayable result of one update
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherReport {
    Text(String),
    /// Icon path, None when the icon could not be downloaded
    Icon(Option<PathBuf>),
}

/// Latest observation, already formatted for display
#[derive(Debug, Clone, PartialEq)]
pub struct Observations {
    pub timestamp: String,
    pub description: String,
    pub temperature: String,
    pub icon: Option<String>,
}

impl Observations {
    /// Extract fields leniently, anything missing or mistyped reads as "--"
    pub fn from_json(data: &Value, metric: bool) -> Option<Self> {
        let properties = data.get("properties")?.as_object()?;
        let text = |key: &str| {
            properties
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(NO_DATA)
                .to_string()
        };
        let temperature = properties
            .get("temperature")
            .and_then(|t| {
                let value = t.get("value")?.as_f64()?;
                let unit = t.get("unitCode").and_then(Value::as_str).unwrap_or_default();
                Some(convert_temperature(value, unit.ends_with(":degC"), metric))
            })
            .unwrap_or_else(|| NO_DATA.to_string());
        Some(Self {
            timestamp: text("timestamp"),
            description: text("textDescription"),
            temperature,
            icon: properties
                .get("icon")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }

    pub fn format(&self, template: &str) -> String {
        template
            .replace("%S", &self.timestamp)
            .replace("%T", &self.temperature)
            .replace("%D", &self.description)
    }
}

fn convert_temperature(value: f64, celsius: bool, metric: bool) -> String {
    let degrees = match (celsius, metric) {
        (true, false) => value * 1.8 + 32.0,
        (false, true) => (value - 32.0) / 1.8,
        _ => value,
    };
    format!("{}\u{00b0}", degrees.trunc() as i64)
}

fn station_id(stations: &Value) -> Result<String, WeatherError> {
    let first = stations
        .get("observationStations")
        .and_then(Value::as_array)
        .ok_or_else(|| WeatherError::BadData("\"observationStations\" is not a list".into()))?
        .first()
        .ok_or_else(|| WeatherError::BadData("no weather stations found".into()))?;
    first
        .as_str()
        .and_then(|url| url.rsplit('/').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| WeatherError::BadData(format!("bad station entry {}", first)))
}

/// Network side of the panel, cloned into each spawned update task.
#[derive(Clone)]
struct WeatherFetcher {
    latitude: f64,
    longitude: f64,
    format: String,
    metric: bool,
    points: JsonDataSource,
    stations: JsonDataSource,
    observations: JsonDataSource,
    icons: FileDataSource,
    // first station near the grid point, resolved once
    station: Arc<Mutex<Option<String>>>,
    results: Sender<WeatherReport>,
}

impl WeatherFetcher {
    fn new(params: &WeatherParams, results: Sender<WeatherReport>) -> Option<Self> {
        let client = match http_client() {
            Ok(client) => client,
            Err(e) => {
                error!("Weather panel unable to create HTTP client: {}", e);
                return None;
            }
        };
        let user_agent = format!("({}, {})", params.domain, params.email);
        let source = |name: &str, parts: &[&str], frequency: u64| {
            DataSource::new(name, client.clone(), parts)
                .user_agent(&user_agent)
                .frequency(frequency)
                .cache_folder(&params.cache_folder)
        };
        Some(Self {
            latitude: params.latitude,
            longitude: params.longitude,
            format: params.format.clone(),
            metric: params.metric,
            points: JsonDataSource::new(source("weather-points", &[BASE_URL, POINTS_URL], POINTS_CACHE_TIMEOUT))
                .schema(Schema::object([(
                    "properties",
                    Schema::object([("gridId", Schema::Any), ("gridX", Schema::Any), ("gridY", Schema::Any)]),
                )])),
            stations: JsonDataSource::new(source("weather-stations", &[BASE_URL, STATIONS_URL], STATIONS_CACHE_TIMEOUT))
                .schema(Schema::object([("observationStations", Schema::list(Schema::Any))])),
            observations: JsonDataSource::new(source(
                "weather-observations",
                &[BASE_URL, OBSERVATIONS_URL],
                OBSERVATIONS_CACHE_TIMEOUT,
            )),
            icons: FileDataSource::new(source("weather-icon", &[], ICON_CACHE_TIMEOUT), ICON_EXTENSION),
            station: Arc::new(Mutex::new(None)),
            results,
        })
    }

    /// Start a background update, the report arrives on the results channel
    fn request(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            error!("Weather update skipped, no async runtime.");
            return;
        };
        let fetcher = self.clone();
        handle.spawn(async move {
            let report = fetcher.update().await;
            if fetcher.results.send(report).is_err() {
                debug!("Weather panel gone, update dropped.");
            }
        });
    }

    async fn update(&self) -> WeatherReport {
        match self.latest_observations().await {
            Ok(observations) if self.format == ICON_FORMAT => match observations.icon {
                Some(url) => WeatherReport::Icon(self.icons.download(Some(&url), &[]).await),
                None => WeatherReport::Icon(None),
            },
            Ok(observations) => WeatherReport::Text(observations.format(&self.format)),
            Err(e) => {
                error!("Weather retrieval error: {}", e);
                WeatherReport::Text(NO_DATA.to_string())
            }
        }
    }

    async fn station(&self) -> Result<String, WeatherError> {
        if let Some(station) = self.station.lock().ok().and_then(|s| s.clone()) {
            return Ok(station);
        }
        let points = self
            .points
            .download(&[
                ("latitude", format!("{:.4}", self.latitude)),
                ("longitude", format!("{:.4}", self.longitude)),
            ])
            .await
            .ok_or(WeatherError::Unavailable("geo"))?;
        let grid = &points["properties"];
        let stations = self
            .stations
            .download(&[
                ("wfo", grid["gridId"].as_str().unwrap_or_default().to_string()),
                ("x", grid["gridX"].to_string()),
                ("y", grid["gridY"].to_string()),
            ])
            .await
            .ok_or(WeatherError::Unavailable("stations"))?;
        let station = station_id(&stations)?;
        if let Ok(mut slot) = self.station.lock() {
            *slot = Some(station.clone());
        }
        Ok(station)
    }

    async fn latest_observations(&self) -> Result<Observations, WeatherError> {
        let station = self.station().await?;
        let data = self
            .observations
            .download(&[("station", station)])
            .await
            .ok_or(WeatherError::Unavailable("observations"))?;
        Observations::from_json(&data, self.metric)
            .ok_or_else(|| WeatherError::BadData("observations missing properties".into()))
    }
}

/// Current conditions from the National Weather Service.
///
/// Updates run on the async runtime and are picked up by `on_check`, so the
/// tick loop never waits on the network.
pub struct WeatherPanel {
    params: WeatherParams,
    fetcher: Option<WeatherFetcher>,
    sender: Sender<WeatherReport>,
    receiver: Receiver<WeatherReport>,
    report: Option<WeatherReport>,
    ready: bool,
}

impl WeatherPanel {
    pub fn new(params: WeatherParams) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            params,
            fetcher: None,
            sender,
            receiver,
            report: None,
            ready: false,
        }
    }
}

impl Panel for WeatherPanel {
    fn on_initialize(&mut self, dispatcher: &Rc<EventDispatcher>, _viewport: &Viewport) {
        self.fetcher = WeatherFetcher::new(&self.params, self.sender.clone());
        let Some(fetcher) = self.fetcher.clone() else {
            self.report = Some(WeatherReport::Text(NO_DATA.to_string()));
            self.ready = true;
            return;
        };
        let poll = fetcher.clone();
        dispatcher.register(
            PRODUCER_TIMER,
            EventHandler::new(move || poll.request()),
            Registration::timer(POLL_FREQUENCY),
        );
        fetcher.request();
    }

    fn on_display(&mut self, viewport: &Viewport) {
        match &self.report {
            Some(WeatherReport::Text(text)) => viewport.text(text),
            Some(WeatherReport::Icon(Some(path))) => viewport.image(&path.to_string_lossy()),
            Some(WeatherReport::Icon(None)) => viewport.text(NO_ICON),
            None => {}
        }
        self.ready = false;
    }

    fn on_check(&mut self) -> bool {
        while let Ok(report) = self.receiver.try_recv() {
            self.report = Some(report);
            self.ready = true;
        }
        self.ready
    }
}
