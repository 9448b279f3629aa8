use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use toml::map::Entry;
use tracing::{debug, warn};

use crate::remote::{ServiceAddress, DEFAULT_RECONNECT_AFTER_FAILURES};

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "tomboy_menu.toml";

/// Environment variable selecting a service preset by name.
pub const SERVICE_ENV: &str = "TOMBOY_MENU_SERVICE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Note applications speaking the `RemoteControl` interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServicePreset {
    #[default]
    Tomboy,
    Gnote,
}

impl ServicePreset {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "tomboy" => Some(ServicePreset::Tomboy),
            "gnote" => Some(ServicePreset::Gnote),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ServicePreset::Tomboy => "tomboy",
            ServicePreset::Gnote => "gnote",
        }
    }

    pub fn address(self) -> ServiceAddress {
        match self {
            ServicePreset::Tomboy => ServiceAddress::new(
                "org.gnome.Tomboy",
                "/org/gnome/Tomboy/RemoteControl",
                "org.gnome.Tomboy.RemoteControl",
            ),
            ServicePreset::Gnote => ServiceAddress::new(
                "org.gnome.Gnote",
                "/org/gnome/Gnote/RemoteControl",
                "org.gnome.Gnote.RemoteControl",
            ),
        }
    }
}

/// Per-field overrides applied on top of the preset address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServicePreset,
    pub address: AddressOverrides,
    /// Consecutive failed calls before the service handle is re-resolved.
    /// `0` keeps the first handle forever.
    pub reconnect_after_failures: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServicePreset::Tomboy,
            address: AddressOverrides::default(),
            reconnect_after_failures: DEFAULT_RECONNECT_AFTER_FAILURES,
        }
    }
}

impl Config {
    /// Loads `tomboy_menu.toml` from the working directory, then applies
    /// the `TOMBOY_MENU_SERVICE` override. Problems are logged and the
    /// defaults are used instead.
    pub fn load() -> Self {
        let service = std::env::var(SERVICE_ENV).ok();
        Self::load_layers(Path::new(CONFIG_FILE), service.as_deref())
    }

    pub fn load_from(path: &Path) -> Self {
        Self::load_layers(path, None)
    }

    /// Stacks the file and the service override over the serialized
    /// defaults, the later layer winning per key.
    pub fn load_layers(path: &Path, service_override: Option<&str>) -> Self {
        let mut merged = match toml::Value::try_from(Self::default()) {
            Ok(value) => value,
            Err(err) => {
                warn!("Failed to serialize default config: {err}");
                return Self::default();
            }
        };

        match read_layer(path) {
            Ok(Some(value)) => merge_value(&mut merged, value),
            Ok(None) => debug!(path = %path.display(), "No config file, using defaults"),
            Err(err) => warn!("Ignoring config file: {err}"),
        }

        if let Some(name) = service_override {
            match ServicePreset::from_name(name) {
                Some(preset) => merge_value(&mut merged, service_layer(preset)),
                None => warn!(name, "Unknown note service preset in {SERVICE_ENV}"),
            }
        }

        merged.try_into().unwrap_or_else(|err| {
            warn!("Falling back to default config due to invalid overrides: {err}");
            Self::default()
        })
    }

    /// Parses `content` as overrides of the default config.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut merged = toml::Value::try_from(Self::default())?;
        merge_value(&mut merged, content.parse::<toml::Value>()?);
        Ok(merged.try_into()?)
    }

    /// Preset address with the configured overrides applied.
    pub fn service_address(&self) -> ServiceAddress {
        let mut address = self.service.address();
        if let Some(service) = &self.address.service {
            address.service = service.clone();
        }
        if let Some(path) = &self.address.path {
            address.path = path.clone();
        }
        if let Some(interface) = &self.address.interface {
            address.interface = interface.clone();
        }
        address
    }
}

fn read_layer(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Some(content.parse::<toml::Value>()?))
}

fn service_layer(preset: ServicePreset) -> toml::Value {
    let mut table = toml::map::Map::new();
    table.insert(
        "service".to_string(),
        toml::Value::String(preset.name().to_string()),
    );
    toml::Value::Table(table)
}

fn merge_value(base: &mut toml::Value, overrides: toml::Value) {
    match (base, overrides) {
        (toml::Value::Table(base_map), toml::Value::Table(override_map)) => {
            for (key, override_value) in override_map {
                match base_map.entry(key) {
                    Entry::Occupied(mut entry) => merge_value(entry.get_mut(), override_value),
                    Entry::Vacant(entry) => {
                        entry.insert(override_value);
                    }
                }
            }
        }
        (base_value, override_value) => {
            *base_value = override_value;
        }
    }
}
