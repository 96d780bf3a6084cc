use std::path::PathBuf;
use std::sync::OnceLock;

use crate::runtime;

///////////////////////////////
/// Global Config Options
pub static CONFIG: OnceLock<Config> = OnceLock::new();

#[derive(Clone, Debug)]
pub struct Config {
    pub log_level: runtime::LogLevel,
    pub log_mode: runtime::LogMode,
    pub log_path: PathBuf,
}

impl Config {
    /// Config of the running binary. Library callers that never set one get the defaults
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::default)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: runtime::LogLevel(log::LevelFilter::Debug),
            log_mode: runtime::LogMode::Path,
            log_path: PathBuf::from(runtime::DEFAULT_LOG_PATH),
        }
    }
}

pub const ENV_TRIMMOMATIC_JAR: &str = "TRIMMOMATIC_JAR";
pub const ENV_TRIMMOMATIC_ADAPTERS: &str = "TRIMMOMATIC_ADAPTERS";
pub const ENV_SLURM_MEM_PER_NODE: &str = "SLURM_MEM_PER_NODE";
pub const ENV_SIQ_CHIP_BASE: &str = "SIQ_CHIP_BASE";
pub const ENV_CHIPEXOQUAL_BASE: &str = "CHIPEXOQUAL_BASE";
pub const ENV_PLOT2DO_BASE: &str = "PLOT2DO_BASE";

pub const DEFAULT_TRIMMOMATIC_JAR: &str = "trimmomatic.jar";

///////////////////////////////
/// Locations of external jars and scripts, taken from the environment
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolConfig {
    pub trimmomatic_jar: Option<String>,
    pub trimmomatic_adapters: Option<String>,
    pub java_mem: Option<String>,
    pub siqchip_base: Option<String>,
    pub chipexoqual_base: Option<String>,
    pub plot2do_base: Option<String>,
}

impl ToolConfig {
    pub fn from_env() -> ToolConfig {
        ToolConfig {
            trimmomatic_jar: env_value(ENV_TRIMMOMATIC_JAR),
            trimmomatic_adapters: env_value(ENV_TRIMMOMATIC_ADAPTERS),
            java_mem: env_value(ENV_SLURM_MEM_PER_NODE),
            siqchip_base: env_value(ENV_SIQ_CHIP_BASE),
            chipexoqual_base: env_value(ENV_CHIPEXOQUAL_BASE),
            plot2do_base: env_value(ENV_PLOT2DO_BASE),
        }
    }

    pub fn trimmomatic_jar(&self) -> &str {
        self.trimmomatic_jar
            .as_deref()
            .unwrap_or(DEFAULT_TRIMMOMATIC_JAR)
    }

    /// Prefix a script name with a base folder, if one is configured
    pub fn in_base(base: &Option<String>, file: &str) -> String {
        match base {
            Some(b) if !b.is_empty() => format!("{}/{}", b.trim_end_matches('/'), file),
            _ => file.to_string(),
        }
    }
}

/// Empty variables count as unset. ~ and $VAR are expanded when possible
fn env_value(key: &str) -> Option<String> {
    let value = std::env::var(key).ok().filter(|v| !v.is_empty())?;
    match shellexpand::full(&value) {
        Ok(expanded) => Some(expanded.into_owned()),
        Err(_) => {
            log::warn!("Could not expand ${}={}, using it as is", key, value);
            Some(value)
        }
    }
}
