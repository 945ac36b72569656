use crate::source::PairSource;
use radius_pairs::Code;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Default time to wait before killing the child, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Raw module configuration, as it appears in the config file.
///
/// Validation happens in [`ExecConfig::instantiate`]; the raw form is
/// never used for dispatch.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecConfig {
    /// Block for the program's completion and capture its output
    #[serde(default = "default_wait")]
    pub wait: bool,

    /// Program template to execute; `%{Attr-Name}` references are
    /// expanded per invocation
    #[serde(default)]
    pub program: Option<String>,

    /// Attribute list fed to the program ("request", "reply",
    /// "proxy-request", "proxy-reply", "config")
    #[serde(default = "default_input_pairs")]
    pub input_pairs: String,

    /// Attribute list that receives the program's declared output pairs;
    /// requires wait=true
    #[serde(default)]
    pub output_pairs: Option<String>,

    /// Restrict execution to one packet type (e.g. "Access-Request")
    #[serde(default)]
    pub packet_type: Option<String>,

    /// Shell-escape expanded attribute values
    #[serde(default = "default_shell_escape")]
    pub shell_escape: bool,

    /// Seconds to wait before killing the child, in [1,30]
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_wait() -> bool {
    true
}

fn default_input_pairs() -> String {
    "request".to_string()
}

fn default_shell_escape() -> bool {
    true
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ExecConfig {
    fn default() -> Self {
        ExecConfig {
            wait: default_wait(),
            program: None,
            input_pairs: default_input_pairs(),
            output_pairs: None,
            packet_type: None,
            shell_escape: default_shell_escape(),
            timeout: default_timeout(),
        }
    }
}

impl ExecConfig {
    /// Load a raw configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: ExecConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Validate and freeze this configuration into an instance.
    ///
    /// `name` is the instance's second config-section name; an instance
    /// without one is "bare" and participates in marker-attribute
    /// discovery at the accounting stage.
    pub fn instantiate(self, name: Option<&str>) -> Result<ExecInstance, ConfigError> {
        let input = PairSource::from_name(&self.input_pairs).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "Must define input pairs for the external program, got {:?}",
                self.input_pairs
            ))
        })?;

        let output = match &self.output_pairs {
            Some(name) => PairSource::from_name(name),
            None => None,
        };

        if !self.wait && output.is_some() {
            return Err(ConfigError::Invalid(
                "Cannot read output pairs if wait=false".to_string(),
            ));
        }

        let packet_code = match &self.packet_type {
            Some(name) => Some(Code::from_name(name).ok_or_else(|| {
                ConfigError::Invalid(format!("Unknown packet type {:?}", name))
            })?),
            None => None,
        };

        if self.timeout < 1 {
            return Err(ConfigError::Invalid(format!(
                "Timeout {} is too small (minimum: 1)",
                self.timeout
            )));
        }
        // Blocking a request longer than 30 seconds isn't going to help anyone.
        if self.timeout > 30 {
            return Err(ConfigError::Invalid(format!(
                "Timeout {} is too large (maximum: 30)",
                self.timeout
            )));
        }

        Ok(ExecInstance {
            name: name.map(str::to_string),
            bare: name.is_none(),
            wait: self.wait,
            program: self.program,
            input,
            output,
            packet_code,
            shell_escape: self.shell_escape,
            timeout: Duration::from_secs(self.timeout),
        })
    }
}

/// Validated, immutable per-instance configuration.
///
/// Built once at module attach time and read-only thereafter, which is
/// what makes concurrent dispatch over it safe.
#[derive(Debug, Clone)]
pub struct ExecInstance {
    pub name: Option<String>,
    pub bare: bool,
    pub wait: bool,
    pub program: Option<String>,
    pub input: PairSource,
    pub output: Option<PairSource>,
    pub packet_code: Option<Code>,
    pub shell_escape: bool,
    pub timeout: Duration,
}

impl ExecInstance {
    /// Instance name for log messages.
    pub fn log_name(&self) -> &str {
        self.name.as_deref().unwrap_or("exec")
    }
}
