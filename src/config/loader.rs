//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::CaviardeurConfig;
use crate::domain::errors::CaviardeurError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into CaviardeurConfig
/// 4. Applies environment variable overrides (CAVIARDEUR_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use caviardeur::config::loader::load_config;
///
/// let config = load_config("caviardeur.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<CaviardeurConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CaviardeurError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        CaviardeurError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: CaviardeurConfig = toml::from_str(&contents)
        .map_err(|e| CaviardeurError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);
    validated(config)
}

/// Builds the configuration used when no file is present
///
/// Defaults plus `CAVIARDEUR_*` overrides, validated the same way as a file.
///
/// # Errors
///
/// Returns an error if an override produces an invalid configuration
pub fn load_default_config() -> Result<CaviardeurConfig> {
    let mut config = CaviardeurConfig::default();
    apply_env_overrides(&mut config);
    validated(config)
}

fn validated(config: CaviardeurConfig) -> Result<CaviardeurConfig> {
    config.validate().map_err(|e| {
        CaviardeurError::Configuration(format!("Configuration validation failed: {}", e))
    })?;
    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        // Comments keep their placeholders
        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(CaviardeurError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Parse an override, keeping the current value when the variable is unset
/// or unparseable
fn override_parsed<T: FromStr>(name: &str, target: &mut T) {
    if let Ok(val) = std::env::var(name) {
        match val.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(variable = name, value = %val, "Ignoring unparseable override"),
        }
    }
}

/// Applies environment variable overrides using CAVIARDEUR_* prefix
///
/// Environment variables follow the pattern: CAVIARDEUR_<SECTION>_<KEY>
/// For example: CAVIARDEUR_DETECTION_MODEL_ID, CAVIARDEUR_OUTPUT_OUTPUT_DIR
fn apply_env_overrides(config: &mut CaviardeurConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("CAVIARDEUR_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    override_parsed("CAVIARDEUR_APPLICATION_DRY_RUN", &mut config.application.dry_run);

    // Detection overrides
    if let Ok(val) = std::env::var("CAVIARDEUR_DETECTION_MODEL_ID") {
        config.detection.model_id = val;
    }
    if let Ok(val) = std::env::var("CAVIARDEUR_DETECTION_MODELS_DIR") {
        config.detection.models_dir = PathBuf::from(val);
    }
    override_parsed("CAVIARDEUR_DETECTION_NER_ENABLED", &mut config.detection.ner_enabled);
    override_parsed(
        "CAVIARDEUR_DETECTION_CONFIDENCE_THRESHOLD",
        &mut config.detection.confidence_threshold,
    );
    override_parsed("CAVIARDEUR_DETECTION_WINDOW_SIZE", &mut config.detection.window_size);
    override_parsed(
        "CAVIARDEUR_DETECTION_WINDOW_OVERLAP",
        &mut config.detection.window_overlap,
    );
    override_parsed(
        "CAVIARDEUR_DETECTION_MAX_SEQUENCE_LENGTH",
        &mut config.detection.max_sequence_length,
    );
    if let Ok(val) = std::env::var("CAVIARDEUR_DETECTION_PATTERN_LIBRARY") {
        config.detection.pattern_library = Some(PathBuf::from(val));
    }

    // Output overrides
    if let Ok(val) = std::env::var("CAVIARDEUR_OUTPUT_OUTPUT_DIR") {
        config.output.output_dir = PathBuf::from(val);
    }
    if let Ok(val) = std::env::var("CAVIARDEUR_OUTPUT_MAPPING_PATH") {
        config.output.mapping_path = Some(PathBuf::from(val));
    }

    // Audit overrides
    override_parsed("CAVIARDEUR_AUDIT_ENABLED", &mut config.audit.enabled);
    if let Ok(val) = std::env::var("CAVIARDEUR_AUDIT_LOG_PATH") {
        config.audit.log_path = PathBuf::from(val);
    }
    override_parsed("CAVIARDEUR_AUDIT_JSON_FORMAT", &mut config.audit.json_format);

    // Logging overrides
    override_parsed("CAVIARDEUR_LOGGING_LOCAL_ENABLED", &mut config.logging.local_enabled);
    if let Ok(val) = std::env::var("CAVIARDEUR_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("CAVIARDEUR_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }
}

/// Serializes tests that read or set `CAVIARDEUR_*` variables
#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_substitute_env_vars() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("CAVIARDEUR_TEST_DIR", "/srv/out");
        let input = "output_dir = \"${CAVIARDEUR_TEST_DIR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "output_dir = \"/srv/out\"\n");
        std::env::remove_var("CAVIARDEUR_TEST_DIR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        std::env::remove_var("CAVIARDEUR_MISSING_VAR");
        let input = "output_dir = \"${CAVIARDEUR_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("CAVIARDEUR_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        std::env::remove_var("CAVIARDEUR_COMMENTED_VAR");
        let input = "# output_dir = \"${CAVIARDEUR_COMMENTED_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${CAVIARDEUR_COMMENTED_VAR}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(matches!(result, Err(CaviardeurError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let temp_file = write_config(
            r#"
[application]
log_level = "debug"
dry_run = true

[detection]
model_id = "local/camembert-ner"
confidence_threshold = 0.85
window_size = 1000
window_overlap = 100

[output]
output_dir = "pseudo"
mapping_path = "pseudo/mapping.json"

[audit]
enabled = true
log_path = "pseudo/audit.log"
"#,
        );

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert!(config.application.dry_run);
        assert_eq!(config.detection.model_id, "local/camembert-ner");
        assert_eq!(config.detection.confidence_threshold, 0.85);
        assert_eq!(config.detection.window_size, 1000);
        assert_eq!(config.detection.window_overlap, 100);
        assert_eq!(config.output.output_dir, PathBuf::from("pseudo"));
        assert_eq!(
            config.output.mapping_path,
            Some(PathBuf::from("pseudo/mapping.json"))
        );
        assert!(config.audit.enabled);
    }

    #[test]
    fn test_load_config_rejects_invalid_windows() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let temp_file = write_config(
            r#"
[detection]
window_size = 100
window_overlap = 100
"#,
        );

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Configuration validation failed"));
    }

    #[test]
    fn test_load_config_rejects_bad_toml() {
        let temp_file = write_config("[detection\nwindow_size = ");
        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));
    }

    #[test]
    fn test_env_override_wins_over_file() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let temp_file = write_config("[detection]\nconfidence_threshold = 0.5\n");

        std::env::set_var("CAVIARDEUR_DETECTION_CONFIDENCE_THRESHOLD", "0.9");
        std::env::set_var("CAVIARDEUR_OUTPUT_OUTPUT_DIR", "/tmp/caviardeur-out");
        let result = load_config(temp_file.path());
        std::env::remove_var("CAVIARDEUR_DETECTION_CONFIDENCE_THRESHOLD");
        std::env::remove_var("CAVIARDEUR_OUTPUT_OUTPUT_DIR");

        let config = result.unwrap();
        assert_eq!(config.detection.confidence_threshold, 0.9);
        assert_eq!(config.output.output_dir, PathBuf::from("/tmp/caviardeur-out"));
    }

    #[test]
    fn test_unparseable_override_is_ignored() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("CAVIARDEUR_DETECTION_WINDOW_SIZE", "large");
        let result = load_default_config();
        std::env::remove_var("CAVIARDEUR_DETECTION_WINDOW_SIZE");

        assert_eq!(result.unwrap().detection.window_size, 2000);
    }

    #[test]
    fn test_default_config_validates_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("CAVIARDEUR_DETECTION_WINDOW_OVERLAP", "5000");
        let result = load_default_config();
        std::env::remove_var("CAVIARDEUR_DETECTION_WINDOW_OVERLAP");

        assert!(result.is_err());
    }
}
