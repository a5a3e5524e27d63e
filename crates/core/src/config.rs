//! Member configuration, stored as YAML.
use std::fs;
use std::io;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::consts::DEFAULT_DISCOVERY_CAPACITY;
use crate::consts::DEFAULT_MEMBERSHIP_VECTOR_LENGTH;
use crate::consts::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::error::Error;
use crate::error::Result;
use crate::logging::LogLevel;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub membership_vector_length: usize,
    /// Deadline applied to every pending request. `0` waits forever.
    pub request_timeout_ms: u64,
    pub discovery_cache_capacity: usize,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            membership_vector_length: DEFAULT_MEMBERSHIP_VECTOR_LENGTH,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            discovery_cache_capacity: DEFAULT_DISCOVERY_CAPACITY,
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn write_fs<P>(&self, path: P) -> Result<()>
    where P: AsRef<std::path::Path> {
        let f = fs::File::create(path.as_ref())
            .map_err(|e| Error::CreateFileError(e.to_string()))?;
        let f_writer = io::BufWriter::new(f);
        serde_yaml::to_writer(f_writer, self)?;
        Ok(())
    }

    pub fn read_fs<P>(path: P) -> Result<Config>
    where P: AsRef<std::path::Path> {
        tracing::debug!("Read config from: {:?}", path.as_ref());
        let f = fs::File::open(path.as_ref()).map_err(|e| Error::OpenFileError(e.to_string()))?;
        let f_rdr = io::BufReader::new(f);
        Ok(serde_yaml::from_reader(f_rdr)?)
    }
}
