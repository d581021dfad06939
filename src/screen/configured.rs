/*
 *  screen/configured.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Screens built from the YAML layout tree
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

use log::{debug, error, warn};
use serde_yaml::{Mapping, Value};
use std::rc::Rc;

use crate::config::{Config, NodeConfig, PanelConfig, SharedConfig};
use crate::display::{ColorResolver, Margins, Viewport, ViewportConfig};
use crate::panels::PanelRegistry;
use super::{ScreenBlocks, ScreenLayout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Rows,
    Columns,
}

impl Direction {
    fn size(self, node: &NodeConfig) -> Option<f64> {
        match self {
            Direction::Rows => node.height,
            Direction::Columns => node.width,
        }
    }

    fn split(self, viewport: &Viewport, sizes: &[f64]) -> Vec<Viewport> {
        match self {
            Direction::Rows => viewport.vsplit(sizes),
            Direction::Columns => viewport.hsplit(sizes),
        }
    }
}

/// Layout read from the `screens` section of the configuration.
///
/// The tree is walked again on refresh so edited attributes (colors, fonts,
/// anchors, margins) reach the existing viewports. Structural edits wait for
/// the next time the screen is shown.
pub struct ConfiguredScreen {
    name: String,
    config: SharedConfig,
    registry: Rc<PanelRegistry>,
}

impl ConfiguredScreen {
    pub fn new(name: &str, config: SharedConfig, registry: Rc<PanelRegistry>) -> Self {
        Self { name: name.to_string(), config, registry }
    }

    fn build(&self, config: &Config, colors: &ColorResolver, node: &NodeConfig, viewport: &Viewport, blocks: &mut ScreenBlocks) {
        if let Some(panel) = &node.panel {
            self.add_panel(config, panel, viewport, blocks);
        }
        let (direction, children) = if node.rows.is_empty() {
            (Direction::Columns, &node.columns)
        } else {
            (Direction::Rows, &node.rows)
        };
        if children.is_empty() {
            return;
        }

        let sizes: Vec<f64> = children.iter().filter_map(|c| direction.size(c)).collect();
        let mut parts = direction.split(viewport, &sizes).into_iter();
        let mut previous: Option<Viewport> = None;
        for child in children {
            let mut region = match direction.size(child) {
                Some(_) => match parts.next() {
                    Some(part) => {
                        previous = Some(part.clone());
                        part
                    }
                    None => break,
                },
                None => previous.as_ref().unwrap_or(viewport).overlay(&ViewportConfig::new()),
            };
            if let Some(panel) = &child.panel {
                region.configure(&viewport_config(panel, colors));
            }
            let inner = NodeConfig { panel: None, ..child.clone() };
            if let Some(panel) = &child.panel {
                self.add_panel(config, panel, &region, blocks);
            }
            self.build(config, colors, &inner, &region, blocks);
        }
    }

    fn add_panel(&self, config: &Config, panel: &PanelConfig, viewport: &Viewport, blocks: &mut ScreenBlocks) {
        let (Some(class), Some(name)) = (panel.class_name.as_deref(), panel.name.as_deref()) else {
            error!("Screen \"{}\": panel needs a class and a name, skipped.", self.name);
            return;
        };
        let params = merged_params(config, class, panel.params.as_ref());
        match self.registry.create(class, &params) {
            Ok(created) => {
                debug!("Screen \"{}\": {} panel \"{}\" at {:?}.", self.name, class, name, viewport.rect());
                blocks.add(name, viewport.clone(), created);
            }
            Err(e) => error!("Screen \"{}\": panel \"{}\" skipped: {}", self.name, name, e),
        }
    }

    fn reconfigure(node: &NodeConfig, colors: &ColorResolver, blocks: &mut ScreenBlocks) {
        for child in node.rows.iter().chain(node.columns.iter()) {
            if let Some(panel) = &child.panel {
                match panel.name.as_deref().and_then(|name| blocks.get_mut(name)) {
                    Some(block) => block.viewport.configure(&viewport_config(panel, colors)),
                    None => debug!("No block for panel {:?}.", panel.name),
                }
            }
            Self::reconfigure(child, colors, blocks);
        }
    }
}

impl ScreenLayout for ConfiguredScreen {
    fn on_initialize_viewports(&mut self, outer: &Viewport, blocks: &mut ScreenBlocks) {
        let config = self.config.borrow();
        let Some(screen) = config.screen(&self.name) else {
            error!("Screen \"{}\" is not configured.", self.name);
            return;
        };
        let colors = resolver(&config);
        let root = NodeConfig { panel: None, ..screen.layout.clone() };
        if let Some(panel) = &screen.layout.panel {
            let region = outer.overlay(&viewport_config(panel, &colors));
            self.add_panel(&config, panel, &region, blocks);
        }
        self.build(&config, &colors, &root, outer, blocks);
        if blocks.is_empty() {
            warn!("Screen \"{}\" has no panels.", self.name);
        }
    }

    fn on_configure_viewports(&mut self, blocks: &mut ScreenBlocks) {
        let config = self.config.borrow();
        let Some(screen) = config.screen(&self.name) else {
            warn!("Screen \"{}\" removed from configuration.", self.name);
            return;
        };
        let colors = resolver(&config);
        if let Some(panel) = &screen.layout.panel {
            if let Some(block) = panel.name.as_deref().and_then(|name| blocks.get_mut(name)) {
                block.viewport.configure(&viewport_config(panel, &colors));
            }
        }
        Self::reconfigure(&screen.layout, &colors, blocks);
    }
}

fn resolver(config: &Config) -> ColorResolver {
    config.theme_colors().map(ColorResolver::with_theme).unwrap_or_default()
}

/// Class-wide `panel_params` overlaid with the block's own params
fn merged_params(config: &Config, class: &str, own: Option<&Value>) -> Value {
    let mut params = config.panel_params.get(class).cloned().unwrap_or(Value::Null);
    match own {
        None | Some(Value::Null) => {}
        Some(Value::Mapping(extra)) if params.is_mapping() => {
            if let Value::Mapping(base) = &mut params {
                for (key, value) in extra {
                    base.insert(key.clone(), value.clone());
                }
            }
        }
        Some(other) => params = other.clone(),
    }
    if let Some(folder) = &config.cache_folder {
        if params.is_null() {
            params = Value::Mapping(Mapping::new());
        }
        if let Value::Mapping(map) = &mut params {
            let key = Value::from("cache_folder");
            if !map.contains_key(&key) {
                map.insert(key, Value::from(folder.to_string_lossy().into_owned()));
            }
        }
    }
    params
}

/// "name:size", ":size" or a bare size
fn parse_font(spec: &str) -> Option<(Option<String>, u32)> {
    let (name, size) = match spec.rsplit_once(':') {
        Some((name, size)) => (name.trim(), size),
        None => ("", spec),
    };
    let size = size.trim().parse::<u32>().ok().filter(|s| *s > 0)?;
    Some(((!name.is_empty()).then(|| name.to_string()), size))
}

fn viewport_config(panel: &PanelConfig, colors: &ColorResolver) -> ViewportConfig {
    let mut config = ViewportConfig {
        fx: panel.fx,
        fy: panel.fy,
        color: colors.resolve_opt(panel.color.as_ref()),
        bg_color: colors.resolve_opt(panel.bg_color.as_ref()),
        border_color: colors.resolve_opt(panel.border_color.as_ref()),
        margins: panel.margins.as_ref().map(Margins::from_value),
        ..Default::default()
    };
    if let Some(spec) = &panel.font {
        match parse_font(spec) {
            Some((name, size)) => config = config.font(name.as_deref(), size),
            None => error!("Bad font specification \"{}\".", spec),
        }
    }
    config
}
