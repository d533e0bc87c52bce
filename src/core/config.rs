//! Configuration structures and types for wiki-pages-sync
//!
//! This module provides type-safe configuration management with serde support.
//! [`SyncConfigFile`] is the on-disk shape where everything is optional;
//! [`SyncConfig`] is the resolved form the orchestrator runs with.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default wiki repository synchronized into the pages branch
pub const DEFAULT_SOURCE_REPO: &str = "https://github.com/qualipool/swissrets.wiki.git";

/// Default commit message for the pages branch
pub const DEFAULT_COMMIT_MESSAGE: &str = "Updating posts from wiki pages";

/// Configuration file as written in `.pages-sync.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfigFile {
    /// Schema version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Extend from base configuration file (relative to this file)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Wiki repository to read from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_repo: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_branch: Option<String>,

    /// Pages repository; discovered from `remote.origin.url` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_repo: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_branch: Option<String>,

    /// Scratch directory, recreated on every run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_dir: Option<String>,

    /// Wiki page published as the site index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_source: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_target: Option<String>,

    /// File stamped with the run timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_file: Option<String>,

    /// Extension (without dot) of files that get published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_extension: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,

    /// Environment variable holding the access token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Checkout whose origin is the destination repository
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_dir: Option<PathBuf>,

    /// Remove published markdown files that no longer exist in the wiki
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prune_stale: Option<bool>,

    /// Prepare and stage everything but skip commit and push
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,

    /// Per-command timeout in seconds (no timeout when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,
}

/// Resolved configuration for one sync run
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub source_repo: String,
    pub source_branch: String,
    pub destination_repo: Option<String>,
    pub destination_branch: String,
    pub workspace: PathBuf,
    pub source_dir: String,
    pub dest_dir: String,
    pub index_source: String,
    pub index_target: String,
    pub marker_file: String,
    pub markdown_extension: String,
    pub commit_message: String,
    pub token_env: String,
    pub origin_dir: PathBuf,
    pub prune_stale: bool,
    pub dry_run: bool,
    pub command_timeout_secs: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source_repo: DEFAULT_SOURCE_REPO.to_string(),
            source_branch: "master".to_string(),
            destination_repo: None,
            destination_branch: "gh-pages".to_string(),
            workspace: PathBuf::from(".tmp"),
            source_dir: "source".to_string(),
            dest_dir: "dest".to_string(),
            index_source: "Home.md".to_string(),
            index_target: "index.md".to_string(),
            marker_file: "UPDATED.md".to_string(),
            markdown_extension: "md".to_string(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            token_env: crate::security::token_manager::DEFAULT_TOKEN_ENV.to_string(),
            origin_dir: PathBuf::from("."),
            prune_stale: false,
            dry_run: false,
            command_timeout_secs: None,
        }
    }
}

impl SyncConfig {
    /// Apply a file/env/CLI layer on top of this configuration
    pub fn apply(&mut self, layer: SyncConfigFile) {
        if let Some(v) = layer.source_repo {
            self.source_repo = v;
        }
        if let Some(v) = layer.source_branch {
            self.source_branch = v;
        }
        if layer.destination_repo.is_some() {
            self.destination_repo = layer.destination_repo;
        }
        if let Some(v) = layer.destination_branch {
            self.destination_branch = v;
        }
        if let Some(v) = layer.workspace {
            self.workspace = v;
        }
        if let Some(v) = layer.source_dir {
            self.source_dir = v;
        }
        if let Some(v) = layer.dest_dir {
            self.dest_dir = v;
        }
        if let Some(v) = layer.index_source {
            self.index_source = v;
        }
        if let Some(v) = layer.index_target {
            self.index_target = v;
        }
        if let Some(v) = layer.marker_file {
            self.marker_file = v;
        }
        if let Some(v) = layer.markdown_extension {
            self.markdown_extension = v.trim_start_matches('.').to_string();
        }
        if let Some(v) = layer.commit_message {
            self.commit_message = v;
        }
        if let Some(v) = layer.token_env {
            self.token_env = v;
        }
        if let Some(v) = layer.origin_dir {
            self.origin_dir = v;
        }
        if let Some(v) = layer.prune_stale {
            self.prune_stale = v;
        }
        if let Some(v) = layer.dry_run {
            self.dry_run = v;
        }
        if layer.command_timeout_secs.is_some() {
            self.command_timeout_secs = layer.command_timeout_secs;
        }
    }

    /// Make relative directories absolute against `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.workspace.is_relative() {
            self.workspace = base.join(&self.workspace);
        }
        if self.origin_dir.is_relative() {
            self.origin_dir = base.join(&self.origin_dir);
        }
    }

    /// The configuration written by `init`
    pub fn template() -> SyncConfigFile {
        let defaults = Self::default();
        SyncConfigFile {
            version: Some("1.0".to_string()),
            extends: None,
            source_repo: Some(defaults.source_repo),
            source_branch: Some(defaults.source_branch),
            destination_repo: None,
            destination_branch: Some(defaults.destination_branch),
            workspace: Some(defaults.workspace),
            source_dir: None,
            dest_dir: None,
            index_source: Some(defaults.index_source),
            index_target: Some(defaults.index_target),
            marker_file: Some(defaults.marker_file),
            markdown_extension: None,
            commit_message: Some(defaults.commit_message),
            token_env: Some(defaults.token_env),
            origin_dir: None,
            prune_stale: Some(false),
            dry_run: None,
            command_timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.source_branch, "master");
        assert_eq!(config.destination_branch, "gh-pages");
        assert_eq!(config.index_source, "Home.md");
        assert_eq!(config.index_target, "index.md");
        assert_eq!(config.marker_file, "UPDATED.md");
        assert_eq!(config.token_env, "GITHUB_ACCESS_TOKEN");
        assert_eq!(config.commit_message, "Updating posts from wiki pages");
        assert!(config.destination_repo.is_none());
        assert!(!config.prune_stale);
    }

    #[test]
    fn test_apply_overrides_only_present_fields() {
        let mut config = SyncConfig::default();
        config.apply(SyncConfigFile {
            source_repo: Some("https://github.com/acme/handbook.wiki.git".to_string()),
            markdown_extension: Some(".markdown".to_string()),
            prune_stale: Some(true),
            ..Default::default()
        });

        assert_eq!(config.source_repo, "https://github.com/acme/handbook.wiki.git");
        assert_eq!(config.markdown_extension, "markdown");
        assert!(config.prune_stale);
        assert_eq!(config.source_branch, "master");
    }

    #[test]
    fn test_resolve_paths() {
        let mut config = SyncConfig::default();
        config.origin_dir = PathBuf::from("/already/absolute");
        config.resolve_paths(Path::new("/srv/site"));

        assert_eq!(config.workspace, PathBuf::from("/srv/site/.tmp"));
        assert_eq!(config.origin_dir, PathBuf::from("/already/absolute"));
    }

    #[test]
    fn test_yaml_uses_camel_case() {
        let yaml = "sourceRepo: https://github.com/acme/wiki.git\nindexSource: README.md\npruneStale: true\n";
        let file: SyncConfigFile = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(file.source_repo.as_deref(), Some("https://github.com/acme/wiki.git"));
        assert_eq!(file.index_source.as_deref(), Some("README.md"));
        assert_eq!(file.prune_stale, Some(true));
    }

    #[test]
    fn test_template_round_trips_through_yaml() {
        let yaml = serde_yaml::to_string(&SyncConfig::template()).unwrap();
        assert!(yaml.contains("sourceRepo"));
        assert!(!yaml.contains("destinationRepo"));

        let mut config = SyncConfig::default();
        config.apply(serde_yaml::from_str(&yaml).unwrap());
        assert_eq!(config, SyncConfig::default());
    }
}
