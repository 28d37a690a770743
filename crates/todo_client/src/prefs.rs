//! Stored user preferences selecting the data source.

use crate::storage::{LocalStorage, API_BASE_KEY, DATA_SOURCE_KEY};
use log::warn;
use std::fmt::{Display, Formatter};
use std::io;
use std::str::FromStr;

pub const DEFAULT_API_BASE: &str = "http://localhost:4000";

/// Stored data-source preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Local,
    Api,
    /// Probe the API at startup and pin the result.
    Auto,
}

impl DataSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Api => "api",
            Self::Auto => "auto",
        }
    }
}

impl FromStr for DataSource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "api" => Ok(Self::Api),
            "auto" => Ok(Self::Auto),
            other => Err(format!(
                "unknown data source `{other}`; expected local|api|auto"
            )),
        }
    }
}

impl Display for DataSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view over the preference keys in [`LocalStorage`].
pub struct Preferences<'a> {
    storage: &'a LocalStorage,
}

impl<'a> Preferences<'a> {
    pub fn new(storage: &'a LocalStorage) -> Self {
        Self { storage }
    }

    /// `None` when nothing is stored. An unreadable or unknown value counts
    /// as an explicit `local` choice.
    pub fn data_source(&self) -> Option<DataSource> {
        match self.storage.get_item(DATA_SOURCE_KEY) {
            Ok(Some(value)) => Some(value.parse().unwrap_or_else(|err| {
                warn!("event=prefs_read module=prefs status=fallback key={DATA_SOURCE_KEY} error={err}");
                DataSource::Local
            })),
            Ok(None) => None,
            Err(err) => {
                warn!("event=prefs_read module=prefs status=error key={DATA_SOURCE_KEY} error={err}");
                Some(DataSource::Local)
            }
        }
    }

    pub fn set_data_source(&self, source: DataSource) -> io::Result<()> {
        self.storage.set_item(DATA_SOURCE_KEY, source.as_str())
    }

    /// Forgets the pinned data source so the next start probes again.
    pub fn clear_data_source(&self) -> io::Result<()> {
        self.storage.remove_item(DATA_SOURCE_KEY)
    }

    pub fn api_base(&self) -> String {
        self.storage
            .get_item(API_BASE_KEY)
            .ok()
            .flatten()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }

    pub fn set_api_base(&self, base_url: &str) -> io::Result<()> {
        self.storage.set_item(API_BASE_KEY, base_url.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::{DataSource, Preferences, DEFAULT_API_BASE};
    use crate::storage::{LocalStorage, DATA_SOURCE_KEY};

    #[test]
    fn defaults_when_nothing_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());
        let prefs = Preferences::new(&storage);

        assert_eq!(prefs.data_source(), None);
        assert_eq!(prefs.api_base(), DEFAULT_API_BASE);
    }

    #[test]
    fn stored_values_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());
        let prefs = Preferences::new(&storage);

        prefs.set_data_source(DataSource::Api).unwrap();
        prefs.set_api_base(" http://todo.test:9000 ").unwrap();
        assert_eq!(prefs.data_source(), Some(DataSource::Api));
        assert_eq!(prefs.api_base(), "http://todo.test:9000");

        prefs.clear_data_source().unwrap();
        assert_eq!(prefs.data_source(), None);
    }

    #[test]
    fn unknown_stored_source_counts_as_local() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());
        storage.set_item(DATA_SOURCE_KEY, "cloud").unwrap();

        assert_eq!(
            Preferences::new(&storage).data_source(),
            Some(DataSource::Local)
        );
        assert_eq!("AUTO".parse::<DataSource>().unwrap(), DataSource::Auto);
    }
}
