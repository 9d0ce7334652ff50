use crate::config::types::{parse_seed, Config, HttpConfig, InputConfig, OutputConfig, PipelineConfig};
use crate::extract::compile;
use crate::record::RESERVED_KEYS;
use crate::site::{SiteProfile, PRESET_NAMES};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Runs before any network activity; every problem found here is fatal.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let profile = config.site_profile().map_err(|e| match e {
        ConfigError::UnknownPreset(name) => ConfigError::UnknownPreset(format!(
            "{} (expected one of: {})",
            name,
            PRESET_NAMES.join(", ")
        )),
        other => other,
    })?;
    validate_site_profile(&profile)?;
    validate_input_config(&config.input)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the resolved site profile
fn validate_site_profile(profile: &SiteProfile) -> Result<(), ConfigError> {
    let base = Url::parse(&profile.base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", profile.base_url, e))
    })?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must be http or https, got '{}'",
            profile.base_url
        )));
    }

    if profile.listing.item_selector.trim().is_empty() {
        return Err(ConfigError::Validation(
            "listing item-selector cannot be empty".to_string(),
        ));
    }

    for field in profile.listing.fields.iter().chain(&profile.detail.fields) {
        if field.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "field name cannot be empty".to_string(),
            ));
        }
        if RESERVED_KEYS.contains(&field.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "field name '{}' is reserved (reserved names: {})",
                field.name,
                RESERVED_KEYS.join(", ")
            )));
        }
        if field.selectors.is_empty() {
            return Err(ConfigError::Validation(format!(
                "field '{}' needs at least one selector",
                field.name
            )));
        }
    }

    for selector in profile.selectors() {
        compile(selector)?;
    }

    Ok(())
}

/// Validates run input
fn validate_input_config(config: &InputConfig) -> Result<(), ConfigError> {
    if config.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in &config.seeds {
        parse_seed(seed)?;
    }

    if config.per_seed_limit == 0 {
        return Err(ConfigError::Validation(
            "per-seed-limit must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates pipeline tuning
fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("listing-concurrency", config.listing_concurrency),
        ("detail-concurrency", config.detail_concurrency),
    ] {
        if !(1..=64).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and 64, got {}",
                name, value
            )));
        }
    }

    if config.stagnation_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "stagnation-threshold must be >= 1, got {}",
            config.stagnation_threshold
        )));
    }

    if config.max_cursor_advances < 1 {
        return Err(ConfigError::Validation(format!(
            "max-cursor-advances must be >= 1, got {}",
            config.max_cursor_advances
        )));
    }

    if config.field_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "field-timeout-ms must be greater than 0".to_string(),
        ));
    }

    if config.detail_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "detail-attempts must be >= 1, got {}",
            config.detail_attempts
        )));
    }

    Ok(())
}

/// Validates HTTP session configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.load_timeout_ms == 0 || config.connect_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "load-timeout-ms and connect-timeout-ms must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if let Some(prefix) = &config.file_prefix {
        validate_file_prefix(prefix)?;
    }

    Ok(())
}

/// Prefixes become part of file names: alphanumeric, hyphens and underscores only
fn validate_file_prefix(prefix: &str) -> Result<(), ConfigError> {
    if prefix.is_empty()
        || !prefix
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "file-prefix must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            prefix
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::SiteConfig;
    use crate::site::FieldSpec;

    fn config() -> Config {
        Config {
            site: SiteConfig {
                preset: Some("ajio".to_string()),
                ..SiteConfig::default()
            },
            input: InputConfig {
                seeds: vec!["https://www.ajio.com/men-shirts/c/830216013".to_string()],
                per_seed_limit: 5,
            },
            pipeline: PipelineConfig::default(),
            http: HttpConfig::default(),
            output: OutputConfig {
                directory: "./out".to_string(),
                file_prefix: Some("ajio".to_string()),
            },
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&config()).is_ok());
    }

    #[test]
    fn test_missing_seeds() {
        let mut config = config();
        config.input.seeds.clear();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_non_http_seed() {
        let mut config = config();
        config.input.seeds = vec!["ftp://files.example.com/list".to_string()];
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.input.seeds = vec!["not a url".to_string()];
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_zero_limit() {
        let mut config = config();
        config.input.per_seed_limit = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = config();
        config.pipeline.listing_concurrency = 0;
        assert!(validate(&config).is_err());

        config.pipeline.listing_concurrency = 64;
        config.pipeline.detail_concurrency = 65;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_output_directory() {
        let mut config = config();
        config.output.directory = "  ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_file_prefix() {
        assert!(validate_file_prefix("myntra_dresses").is_ok());
        assert!(validate_file_prefix("amazon-in").is_ok());
        assert!(validate_file_prefix("").is_err());
        assert!(validate_file_prefix("../etc").is_err());
        assert!(validate_file_prefix("a b").is_err());
    }

    #[test]
    fn test_unknown_preset() {
        let mut config = config();
        config.site.preset = Some("ebay".to_string());
        match validate(&config) {
            Err(ConfigError::UnknownPreset(message)) => assert!(message.contains("myntra")),
            other => panic!("expected UnknownPreset, got {:?}", other),
        }
    }

    #[test]
    fn test_preset_and_profile_conflict() {
        let mut config = config();
        config.site.profile = crate::site::preset("amazon");
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_invalid_field_selector() {
        let mut config = config();
        let mut profile = crate::site::preset("ajio").unwrap();
        profile.detail.fields.push(FieldSpec::text("Broken", &["div[["]));
        config.site.preset = None;
        config.site.profile = Some(profile);
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_reserved_field_names_rejected() {
        for reserved in RESERVED_KEYS {
            let mut config = config();
            let mut profile = crate::site::preset("ajio").unwrap();
            profile
                .listing
                .fields
                .push(FieldSpec::text(reserved, &["div.sku"]));
            config.site.preset = None;
            config.site.profile = Some(profile);

            match validate(&config) {
                Err(ConfigError::Validation(message)) => assert!(message.contains(reserved)),
                other => panic!("expected '{}' to be rejected, got {:?}", reserved, other),
            }
        }

        let mut config = config();
        let mut profile = crate::site::preset("ajio").unwrap();
        profile.detail.fields.push(FieldSpec::text("error", &["p.error"]));
        config.site.preset = None;
        config.site.profile = Some(profile);
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_base_url_override_validated() {
        let mut config = config();
        config.site.base_url = Some("mailto:shop@example.com".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }
}
