//! Configuration file loader for wiki-pages-sync
//!
//! This module provides configuration loading, validation, and template writing.

use super::config::*;
use crate::core::error::SyncError;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".pages-sync.yaml";

/// Guards against `extends` cycles
const MAX_EXTENDS_DEPTH: usize = 8;

/// Configuration load options
#[derive(Debug, Clone, Default)]
pub struct ConfigLoadOptions {
    /// Project path to load config from
    pub project_path: PathBuf,

    /// CLI arguments (highest priority)
    pub cli_args: Option<SyncConfigFile>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    /// Is configuration valid?
    pub valid: bool,

    /// Validation errors
    pub errors: Vec<ConfigValidationError>,

    /// Validation warnings
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field path (e.g., "sourceBranch")
    pub field: String,

    /// Error message
    pub message: String,

    /// Expected type/value
    pub expected: Option<String>,

    /// Actual type/value
    pub actual: Option<String>,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    /// Field path
    pub field: String,

    /// Warning message
    pub message: String,

    /// Suggestion
    pub suggestion: Option<String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables (`PAGES_SYNC_*`)
    /// 3. Project config (./.pages-sync.yaml, including its `extends` chain)
    /// 4. Default values
    ///
    /// Relative directories are resolved against the project path.
    pub async fn load(options: ConfigLoadOptions) -> Result<SyncConfig, SyncError> {
        let base = Self::absolute(&options.project_path)?;
        let mut config = SyncConfig::default();

        // 3. Project config
        for layer in Self::load_config_chain(&base.join(CONFIG_FILENAME), 0).await? {
            config.apply(layer);
        }

        // 2. Environment variables
        if let Some(env_config) = Self::load_env_config(&options.env) {
            config.apply(env_config);
        }

        // 1. CLI arguments (highest priority)
        if let Some(cli_config) = options.cli_args {
            config.apply(cli_config);
        }

        config.resolve_paths(&base);
        Ok(config)
    }

    fn absolute(path: &Path) -> Result<PathBuf, SyncError> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let cwd = env::current_dir().map_err(|e| {
            SyncError::ConfigError(format!("Failed to read current directory: {}", e))
        })?;
        Ok(cwd.join(path))
    }

    /// Load a configuration file and the files it extends, base first
    fn load_config_chain(
        file_path: &Path,
        depth: usize,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<Output = Result<Vec<SyncConfigFile>, SyncError>> + Send + '_,
        >,
    > {
        Box::pin(async move {
            if depth > MAX_EXTENDS_DEPTH {
                return Err(SyncError::ConfigError(format!(
                    "extends chain deeper than {} levels at {}",
                    MAX_EXTENDS_DEPTH,
                    file_path.display()
                )));
            }

            if !file_path.exists() {
                // A missing base file is an error; a missing project file is not
                if depth > 0 {
                    return Err(SyncError::ConfigError(format!(
                        "Extended config file not found: {}",
                        file_path.display()
                    )));
                }
                return Ok(Vec::new());
            }

            let content = fs::read_to_string(file_path).await.map_err(|e| {
                SyncError::ConfigError(format!("Failed to read config file: {}", e))
            })?;

            let config: SyncConfigFile = serde_yaml::from_str(&content).map_err(|e| {
                SyncError::ConfigError(format!("Failed to parse YAML config: {}", e))
            })?;

            let mut chain = Vec::new();
            if let Some(extends_path) = &config.extends {
                let base_path = file_path
                    .parent()
                    .ok_or_else(|| SyncError::ConfigError("Invalid config file path".to_string()))?
                    .join(extends_path);

                chain.extend(Self::load_config_chain(&base_path, depth + 1).await?);
            }
            chain.push(config);

            Ok(chain)
        })
    }

    /// Load configuration from environment variables
    fn load_env_config(env: &HashMap<String, String>) -> Option<SyncConfigFile> {
        let mut config = SyncConfigFile::default();
        let mut has_changes = false;

        if let Some(repo) = env.get("PAGES_SYNC_SOURCE_REPO") {
            config.source_repo = Some(repo.clone());
            has_changes = true;
        }

        if let Some(repo) = env.get("PAGES_SYNC_DESTINATION_REPO") {
            config.destination_repo = Some(repo.clone());
            has_changes = true;
        }

        if let Some(workspace) = env.get("PAGES_SYNC_WORKSPACE") {
            config.workspace = Some(PathBuf::from(workspace));
            has_changes = true;
        }

        if let Some(prune) = env.get("PAGES_SYNC_PRUNE_STALE") {
            config.prune_stale = Some(prune == "true");
            has_changes = true;
        }

        if env.get("PAGES_SYNC_DRY_RUN").map(|s| s.as_str()) == Some("true") {
            config.dry_run = Some(true);
            has_changes = true;
        }

        if has_changes { Some(config) } else { None }
    }

    /// Write the default configuration file into `project_path`
    pub async fn write_template(project_path: &Path, force: bool) -> Result<PathBuf, SyncError> {
        let target = project_path.join(CONFIG_FILENAME);

        if target.exists() && !force {
            return Err(SyncError::ConfigError(format!(
                "{} already exists (use --force to overwrite)",
                target.display()
            )));
        }

        let yaml = serde_yaml::to_string(&SyncConfig::template()).map_err(|e| {
            SyncError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(&target, yaml).await.map_err(|e| {
            SyncError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(target)
    }

    /// Validate configuration
    pub fn validate(config: &SyncConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Repositories
        if config.source_repo.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "sourceRepo".to_string(),
                message: "Source repository is required".to_string(),
                expected: Some("git URL".to_string()),
                actual: Some("empty".to_string()),
            });
        }

        if let Some(destination) = &config.destination_repo
            && let Ok(parsed) = url::Url::parse(destination)
            && (!parsed.username().is_empty() || parsed.password().is_some())
        {
            warnings.push(ConfigValidationWarning {
                field: "destinationRepo".to_string(),
                message: "Repository URL contains credentials".to_string(),
                suggestion: Some(format!("Provide the token through {}", config.token_env)),
            });
        }

        // 2. Branches
        for (field, branch) in [
            ("sourceBranch", &config.source_branch),
            ("destinationBranch", &config.destination_branch),
        ] {
            if branch.trim().is_empty() {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: "Branch name is required".to_string(),
                    expected: Some("non-empty string".to_string()),
                    actual: Some("empty".to_string()),
                });
            }
        }

        if config.source_branch == config.destination_branch {
            errors.push(ConfigValidationError {
                field: "destinationBranch".to_string(),
                message: "Destination branch must differ from the source branch".to_string(),
                expected: Some(format!("anything but \"{}\"", config.source_branch)),
                actual: Some(config.destination_branch.clone()),
            });
        }

        // 3. Workspace layout
        if config.source_dir == config.dest_dir {
            errors.push(ConfigValidationError {
                field: "destDir".to_string(),
                message: "Source and destination checkouts need separate folders".to_string(),
                expected: Some(format!("anything but \"{}\"", config.source_dir)),
                actual: Some(config.dest_dir.clone()),
            });
        }

        if config.workspace.parent().is_none() {
            errors.push(ConfigValidationError {
                field: "workspace".to_string(),
                message: "Workspace cannot be a filesystem root".to_string(),
                expected: Some("dedicated scratch directory".to_string()),
                actual: Some(config.workspace.display().to_string()),
            });
        }

        // 4. Published files
        let suffix = format!(".{}", config.markdown_extension);
        if !config.index_source.ends_with(&suffix) {
            errors.push(ConfigValidationError {
                field: "indexSource".to_string(),
                message: "Index source must be a markdown page".to_string(),
                expected: Some(format!("*{}", suffix)),
                actual: Some(config.index_source.clone()),
            });
        }

        if !config.index_target.ends_with(&suffix) {
            warnings.push(ConfigValidationWarning {
                field: "indexTarget".to_string(),
                message: "Index target will not be staged".to_string(),
                suggestion: Some(format!("Use a *{} file name", suffix)),
            });
        }

        if !config.marker_file.ends_with(&suffix) {
            warnings.push(ConfigValidationWarning {
                field: "markerFile".to_string(),
                message: "Update marker will not be staged".to_string(),
                suggestion: Some(format!("Use a *{} file name", suffix)),
            });
        }

        if config.commit_message.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "commitMessage".to_string(),
                message: "Commit message is required".to_string(),
                expected: Some("non-empty string".to_string()),
                actual: Some("empty".to_string()),
            });
        }

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Format validation result as human-readable string
    pub fn format_validation_result(result: &ConfigValidationResult) -> String {
        let mut lines = Vec::new();

        if result.valid {
            lines.push("✅ Configuration validation succeeded".to_string());
        } else {
            lines.push("❌ Configuration has errors".to_string());
        }

        if !result.errors.is_empty() {
            lines.push("\n🔴 Errors:".to_string());
            for error in &result.errors {
                lines.push(format!("  - [{}] {}", error.field, error.message));
                if let (Some(expected), Some(actual)) = (&error.expected, &error.actual) {
                    lines.push(format!("    Expected: {}", expected));
                    lines.push(format!("    Actual: {}", actual));
                }
            }
        }

        if !result.warnings.is_empty() {
            lines.push("\n🟡 Warnings:".to_string());
            for warning in &result.warnings {
                lines.push(format!("  - [{}] {}", warning.field, warning.message));
                if let Some(suggestion) = &warning.suggestion {
                    lines.push(format!("    Suggestion: {}", suggestion));
                }
            }
        }

        lines.join("\n")
    }
}
