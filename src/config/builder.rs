//! Default configuration file creation.
//!
//! Writes a commented config with every setting at its default, aligned so the
//! comments line up in a column.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::constants::*;
use crate::utils::private_path;

/// Create a default config file at `path`.
///
/// When a geo.toml already sits in the same directory the coordinates are left
/// out of the new file, since geo.toml overrides them anyway.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let has_geo_file = path
        .parent()
        .map(|dir| dir.join(GEO_FILE_NAME).exists())
        .unwrap_or(false);

    let mut builder = ConfigBuilder::new().add_section("Location");
    if has_geo_file {
        log_indented!("Coordinates will be read from geo.toml");
    } else {
        builder = builder
            .add_setting(
                "latitude",
                &format!("{DEFAULT_LATITUDE:.6}"),
                "Geographic latitude (-90 to 90)",
            )
            .add_setting(
                "longitude",
                &format!("{DEFAULT_LONGITUDE:.6}"),
                "Geographic longitude (-180 to 180)",
            );
    }

    let config_content = builder
        .add_setting(
            "timezone",
            &format!("\"{DEFAULT_TIMEZONE}\""),
            "Label timezone: \"local\", \"coordinates\", or an IANA name",
        )
        .add_section("Display")
        .add_setting(
            "refresh_interval",
            &DEFAULT_REFRESH_INTERVAL.to_string(),
            &format!(
                "Seconds between redraws ({MINIMUM_REFRESH_INTERVAL}-{MAXIMUM_REFRESH_INTERVAL})"
            ),
        )
        .add_setting(
            "margin",
            &DEFAULT_MARGIN.to_string(),
            &format!("Columns left free on each side of the bar (0-{MAXIMUM_MARGIN})"),
        )
        .add_setting(
            "show_scale",
            &DEFAULT_SHOW_SCALE.to_string(),
            "Percentage scale under the bar",
        )
        .add_setting(
            "show_labels",
            &DEFAULT_SHOW_LABELS.to_string(),
            "Sunrise and sunset labels above the bar",
        )
        .add_setting(
            "label_style",
            &format!("\"{DEFAULT_LABEL_STYLE}\""),
            "Label text: \"time\", \"long\" or \"short\"",
        )
        .build();

    fs::write(path, config_content)
        .with_context(|| format!("Failed to write default config to {}", private_path(path)))?;

    log_block_start!("Created default config at {}", private_path(path));
    Ok(())
}

/// Builder for config files with aligned trailing comments.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        // One space between the widest setting and its comment
        let width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                ConfigEntry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut lines = Vec::new();
        for entry in self.entries {
            match entry {
                ConfigEntry::Section(title) => {
                    if !lines.is_empty() {
                        lines.push(String::new());
                    }
                    lines.push(title);
                }
                ConfigEntry::Setting { line, comment } => {
                    lines.push(format!("{line:<width$}{comment}"));
                }
            }
        }

        let mut content = lines.join("\n");
        content.push('\n');
        content
    }
}
