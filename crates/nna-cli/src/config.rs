//! Configuration resolution.
//!
//! Layers, lowest to highest precedence: built-in defaults, an optional
//! TOML file, environment variables (after `.env` is loaded), then command
//! line flags. The result is one explicit [`PipelineConfig`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use nna_model::{
    CleaningOptions, ColumnDiscovery, ModelError, PiiPolicy, PipelineConfig, ProfilingOptions,
    QualityThresholds, RegistrySource, SentinelCode, SentinelRegistry, SpatiotemporalOptions,
};

/// Input file location.
pub const ENV_DATA_FILE: &str = "DATA_FILE";
/// Comma-separated sentinel override list.
pub const ENV_SENTINEL_CODES: &str = "SENTINEL_CODES";
/// Output directory.
pub const ENV_OUTPUT_DIR: &str = "NNA_OUTPUT_DIR";

pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no input file configured: pass the INPUT argument or set {ENV_DATA_FILE}")]
    MissingInput,

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Invalid(#[from] ModelError),
}

/// Contents of a TOML configuration file; every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub sentinels: Option<Vec<String>>,
    pub quality: QualityThresholds,
    pub cleaning: CleaningOptions,
    pub profiling: ProfilingOptions,
    pub spatiotemporal: SpatiotemporalOptions,
    pub discovery: ColumnDiscovery,
    pub pii: PiiPolicy,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub sentinels: Option<Vec<String>>,
    pub disable_pii: bool,
}

/// Which layer supplied the sentinel list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelOrigin {
    Default,
    File,
    Environment,
    Flag,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: PipelineConfig,
    pub sentinel_origin: SentinelOrigin,
    /// Facts about the resolution worth keeping in the run log.
    pub notes: Vec<String>,
}

/// Finds `--env-file` in raw process arguments.
///
/// The environment file has to be loaded before clap parses, so that
/// variables it defines (such as `NNA_CONFIG`) feed flag defaults.
pub fn env_file_from_args<I, T>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    while let Some(arg) = args.next() {
        if arg == "--" {
            break;
        }
        if arg == "--env-file" {
            return args.next().map(PathBuf::from);
        }
        if let Some(value) = arg.to_str().and_then(|arg| arg.strip_prefix("--env-file=")) {
            return Some(PathBuf::from(value));
        }
    }
    None
}

fn split_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Resolves the run configuration.
///
/// `env` looks up a variable; `main` passes the process environment, tests
/// pass a map.
pub fn resolve_config<F>(overrides: &ConfigOverrides, env: F) -> Result<ResolvedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut notes = Vec::new();
    let file = match &overrides.config_file {
        Some(path) => {
            notes.push(format!("configuration file {}", path.display()));
            FileConfig::from_file(path)?
        }
        None => FileConfig::default(),
    };

    let input = overrides
        .input
        .clone()
        .or_else(|| non_blank(env(ENV_DATA_FILE)).map(PathBuf::from))
        .or(file.input)
        .ok_or(ConfigError::MissingInput)?;
    let output_dir = overrides
        .output_dir
        .clone()
        .or_else(|| non_blank(env(ENV_OUTPUT_DIR)).map(PathBuf::from))
        .or(file.output_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let (codes, sentinel_origin) = if let Some(codes) = &overrides.sentinels {
        (Some(codes.clone()), SentinelOrigin::Flag)
    } else if let Some(raw) = non_blank(env(ENV_SENTINEL_CODES)) {
        (Some(split_codes(&raw)), SentinelOrigin::Environment)
    } else if let Some(codes) = file.sentinels {
        (Some(codes), SentinelOrigin::File)
    } else {
        (None, SentinelOrigin::Default)
    };
    let sentinels = SentinelRegistry::from_override(codes);
    // an override holding only blank entries falls back to the default registry
    let sentinel_origin = match sentinels.source() {
        RegistrySource::Default => SentinelOrigin::Default,
        RegistrySource::Override => sentinel_origin,
    };
    if sentinel_origin == SentinelOrigin::Default {
        notes.push("using default sentinel registry".to_string());
    } else {
        let literals: Vec<&str> = sentinels.codes().iter().map(SentinelCode::literal).collect();
        notes.push(format!("sentinel codes: {}", literals.join(", ")));
    }

    let mut pii = file.pii;
    if overrides.disable_pii {
        pii.enabled = false;
        notes.push("PII removal disabled".to_string());
    }

    let config = PipelineConfig {
        input_path: input,
        output_dir,
        sentinels,
        quality: file.quality,
        cleaning: file.cleaning,
        profiling: file.profiling,
        spatiotemporal: file.spatiotemporal,
        discovery: file.discovery,
        pii,
    };
    config.validate()?;
    Ok(ResolvedConfig {
        config,
        sentinel_origin,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_input_is_fatal() {
        let err = resolve_config(&ConfigOverrides::default(), env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingInput));
        let message = err.to_string();
        assert!(message.contains("INPUT argument"), "message: {message}");
        assert!(message.contains("DATA_FILE"));
        assert!(!message.contains("--input"));
    }

    #[test]
    fn env_file_is_found_before_parsing() {
        assert_eq!(
            env_file_from_args(["nna", "base.csv", "--env-file", "prod.env"]),
            Some(PathBuf::from("prod.env"))
        );
        assert_eq!(
            env_file_from_args(["nna", "--env-file=prod.env", "base.csv"]),
            Some(PathBuf::from("prod.env"))
        );
        assert_eq!(env_file_from_args(["nna", "base.csv"]), None);
        assert_eq!(env_file_from_args(["nna", "--", "--env-file", "x.env"]), None);
    }

    #[test]
    fn blank_sentinel_list_is_noted_as_default() {
        let env = env_from(&[("DATA_FILE", "env.csv"), ("SENTINEL_CODES", ",")]);
        let resolved = resolve_config(&ConfigOverrides::default(), env).unwrap();
        assert_eq!(resolved.sentinel_origin, SentinelOrigin::Default);
        assert_eq!(resolved.config.sentinels.source(), RegistrySource::Default);
        assert!(
            resolved
                .notes
                .contains(&"using default sentinel registry".to_string())
        );
        assert!(!resolved.notes.iter().any(|note| note.starts_with("sentinel codes")));
    }

    #[test]
    fn environment_supplies_input_and_default_registry_is_noted() {
        let resolved =
            resolve_config(&ConfigOverrides::default(), env_from(&[("DATA_FILE", "base.xlsx")]))
                .unwrap();
        assert_eq!(resolved.config.input_path, PathBuf::from("base.xlsx"));
        assert_eq!(resolved.config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(resolved.sentinel_origin, SentinelOrigin::Default);
        assert!(
            resolved
                .notes
                .contains(&"using default sentinel registry".to_string())
        );
    }

    #[test]
    fn flags_override_environment() {
        let overrides = ConfigOverrides {
            input: Some(PathBuf::from("flag.csv")),
            sentinels: Some(vec!["88888".to_string()]),
            ..ConfigOverrides::default()
        };
        let env = env_from(&[("DATA_FILE", "env.csv"), ("SENTINEL_CODES", "99999, 77777")]);
        let resolved = resolve_config(&overrides, env).unwrap();
        assert_eq!(resolved.config.input_path, PathBuf::from("flag.csv"));
        assert_eq!(resolved.sentinel_origin, SentinelOrigin::Flag);
        assert_eq!(resolved.config.sentinels.primary().literal(), "88888");
    }

    #[test]
    fn environment_sentinel_list_is_split() {
        let env = env_from(&[("DATA_FILE", "env.csv"), ("SENTINEL_CODES", "99999, 77777,")]);
        let resolved = resolve_config(&ConfigOverrides::default(), env).unwrap();
        let literals: Vec<&str> = resolved
            .config
            .sentinels
            .codes()
            .iter()
            .map(SentinelCode::literal)
            .collect();
        assert_eq!(literals, vec!["99999", "77777"]);
        assert_eq!(resolved.sentinel_origin, SentinelOrigin::Environment);
    }

    #[test]
    fn toml_file_is_lowest_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nna.toml");
        std::fs::write(
            &path,
            r#"
input = "from_file.csv"
output_dir = "reports"
sentinels = ["99999", "N/A"]

[spatiotemporal]
alert_threshold = 30.0
"#,
        )
        .unwrap();
        let overrides = ConfigOverrides {
            config_file: Some(path),
            ..ConfigOverrides::default()
        };
        let resolved = resolve_config(&overrides, env_from(&[("NNA_OUTPUT_DIR", "env_out")])).unwrap();
        assert_eq!(resolved.config.input_path, PathBuf::from("from_file.csv"));
        assert_eq!(resolved.config.output_dir, PathBuf::from("env_out"));
        assert_eq!(resolved.sentinel_origin, SentinelOrigin::File);
        assert_eq!(resolved.config.spatiotemporal.alert_threshold, 30.0);
        assert_eq!(resolved.config.spatiotemporal.min_year, 2021);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nna.toml");
        std::fs::write(&path, "input = \"a.csv\"\n[quality]\nnear_empty_percent = 120.0\n").unwrap();
        let overrides = ConfigOverrides {
            config_file: Some(path),
            ..ConfigOverrides::default()
        };
        let err = resolve_config(&overrides, env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_keys_are_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nna.toml");
        std::fs::write(&path, "inptu = \"a.csv\"\n").unwrap();
        let err = FileConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
