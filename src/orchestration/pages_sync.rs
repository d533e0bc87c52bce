//! Pages Sync - Main orchestrator for publishing wiki pages
//!
//! Manages the complete sync workflow:
//! - Workspace preparation
//! - Cloning the wiki and the pages branch
//! - Index rename, filtered overlay copy and update marker
//! - Staging, then commit and push as one guarded unit
//!
//! Every step except the commit/push unit is fail-fast.

use crate::core::config::SyncConfig;
use crate::core::error::{FailureClass, SyncError};
use crate::core::traits::CommandRunner;
use crate::git::{GitClient, RepositoryHandle};
use crate::orchestration::copy_filter::{self, CopyFilter, CopyReport};
use crate::orchestration::workspace::Workspace;
use crate::security::credential_injector::redact_url;
use crate::security::token_manager::SecureTokenManager;
use chrono::{DateTime, SecondsFormat, Utc};
use console::style;
use secrecy::SecretString;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// What happened to the pages branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A commit was created and pushed
    Published,
    /// Commit or push failed inside the guarded unit (usually nothing changed)
    NothingPublished { reason: String },
    /// Dry run: changes were staged but not committed
    DryRun,
}

/// Report returned after a sync run
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub source_repo: String,
    pub destination_repo: String,
    pub workspace: PathBuf,
    /// Files copied by the filtered overlay, relative to the pages checkout
    pub copied: Vec<PathBuf>,
    /// Files removed by `prune_stale`
    pub pruned: Vec<PathBuf>,
    pub outcome: SyncOutcome,
}

/// Process exit status for a finished run
pub fn exit_code(result: &Result<SyncReport, SyncError>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// Update-marker content for `at`, e.g. `2024-03-01T08:15:30.123Z`
pub fn marker_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Main wiki-to-pages orchestrator
pub struct PagesSync {
    config: SyncConfig,
    git: GitClient,
    token: Option<SecretString>,
}

impl PagesSync {
    /// Create a new PagesSync
    ///
    /// # Arguments
    ///
    /// * `config` - Resolved configuration
    /// * `runner` - Executes git
    /// * `token` - Access token; `None` disables authentication
    pub fn new(
        config: SyncConfig,
        runner: Arc<dyn CommandRunner>,
        token: Option<SecretString>,
    ) -> Self {
        Self {
            config,
            git: GitClient::new(runner),
            token,
        }
    }

    /// Create a PagesSync reading the token named by `config.token_env` from `env`
    pub fn from_env(
        config: SyncConfig,
        runner: Arc<dyn CommandRunner>,
        env: &HashMap<String, String>,
    ) -> Self {
        let manager = SecureTokenManager::with_env_var(config.token_env.clone());
        let token = manager.get_token(env);
        if token.is_none() {
            debug!("{} is not set, running without authentication", manager.token_name());
        }
        Self::new(config, runner, token)
    }

    /// Run the sync workflow
    ///
    /// # Returns
    ///
    /// A report on success, including the "nothing to commit" case. Any
    /// error returned here should end the process with a non-zero status.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();
        let token = self.token.as_ref();

        // 1. Workspace
        let workspace = Workspace::from_config(&self.config);
        workspace.recreate().await?;

        // 2. Wiki checkout
        let source = RepositoryHandle::new(
            &self.config.source_repo,
            &self.config.source_branch,
            workspace.source().to_path_buf(),
        );
        self.git
            .clone_branch(workspace.root(), &source, token)
            .await?;

        // 3. Pages checkout
        let destination_repo = self.destination_repo().await?;
        let destination = RepositoryHandle::new(
            &destination_repo,
            &self.config.destination_branch,
            workspace.dest().to_path_buf(),
        );
        self.git
            .clone_branch(workspace.root(), &destination, token)
            .await?;

        // 4. Content
        let copy_report = self.copy_content(&workspace).await?;
        let pruned = if self.config.prune_stale {
            self.prune(&workspace, &copy_report).await?
        } else {
            Vec::new()
        };
        self.write_marker(workspace.dest(), started_at).await?;

        // 5. Stage
        self.git
            .stage(workspace.dest(), &self.pathspecs(&pruned))
            .await?;

        // 6. Commit and push
        let outcome = if self.config.dry_run {
            info!("🧪 Dry run: skipping commit and push");
            SyncOutcome::DryRun
        } else {
            match self.commit_and_push(&destination).await {
                Ok(()) => SyncOutcome::Published,
                Err(e) => {
                    match e.class() {
                        FailureClass::SoftFailure => info!("{}", e),
                        _ => warn!("{}", style(&e).yellow()),
                    }
                    SyncOutcome::NothingPublished {
                        reason: e.to_string(),
                    }
                }
            }
        };

        Ok(SyncReport {
            started_at,
            source_repo: redact_url(&source.url),
            destination_repo: redact_url(&destination.url),
            workspace: workspace.root().to_path_buf(),
            copied: copy_report.copied,
            pruned,
            outcome,
        })
    }

    /// Top-level pages, plus every pruned file since deletions below the
    /// top level fall outside the glob
    fn pathspecs(&self, pruned: &[PathBuf]) -> Vec<String> {
        let mut pathspecs = vec![format!(":(glob)*.{}", self.config.markdown_extension)];
        pathspecs.extend(
            pruned
                .iter()
                .filter(|path| path.components().count() > 1)
                .map(|path| format!(":(literal){}", path.to_string_lossy())),
        );
        pathspecs
    }

    async fn destination_repo(&self) -> Result<String, SyncError> {
        match &self.config.destination_repo {
            Some(url) => Ok(url.clone()),
            None => self.git.remote_origin_url(&self.config.origin_dir).await,
        }
    }

    /// Index rename followed by the filtered overlay copy
    async fn copy_content(&self, workspace: &Workspace) -> Result<CopyReport, SyncError> {
        let index_source = workspace.source().join(&self.config.index_source);
        let index_target = workspace.dest().join(&self.config.index_target);

        info!(
            "📄 Copying {} to {}",
            style(&self.config.index_source).cyan(),
            style(&self.config.index_target).cyan()
        );
        fs::copy(&index_source, &index_target)
            .await
            .map_err(|e| SyncError::CopyFailed {
                path: index_source.clone(),
                message: e.to_string(),
            })?;

        let filter = CopyFilter::new(
            workspace.source(),
            &self.config.index_source,
            &self.config.markdown_extension,
        );
        let dest_root = workspace.dest().to_path_buf();

        let report = tokio::task::spawn_blocking(move || {
            copy_filter::overlay_copy(&filter, &dest_root)
        })
        .await
        .map_err(|e| SyncError::CopyFailed {
            path: workspace.source().to_path_buf(),
            message: e.to_string(),
        })??;

        info!(
            "📚 Copied {} pages ({} files skipped)",
            style(report.copied.len()).yellow().bold(),
            report.skipped
        );

        Ok(report)
    }

    async fn prune(
        &self,
        workspace: &Workspace,
        report: &CopyReport,
    ) -> Result<Vec<PathBuf>, SyncError> {
        let mut keep: HashSet<PathBuf> = report.copied.iter().cloned().collect();
        keep.insert(PathBuf::from(&self.config.index_target));
        keep.insert(PathBuf::from(&self.config.marker_file));

        let dest_root = workspace.dest().to_path_buf();
        let extension = self.config.markdown_extension.clone();

        let pruned = tokio::task::spawn_blocking(move || {
            copy_filter::prune_stale(&dest_root, &keep, &extension)
        })
        .await
        .map_err(|e| SyncError::CopyFailed {
            path: workspace.dest().to_path_buf(),
            message: e.to_string(),
        })??;

        for path in &pruned {
            info!("🗑️  Removed stale page {}", style(path.display()).cyan());
        }

        Ok(pruned)
    }

    async fn write_marker(&self, dest: &Path, at: DateTime<Utc>) -> Result<(), SyncError> {
        let marker = dest.join(&self.config.marker_file);
        fs::write(&marker, marker_timestamp(at))
            .await
            .map_err(|e| SyncError::MarkerWriteFailed {
                path: marker,
                message: e.to_string(),
            })
    }

    /// Push only runs after a successful commit
    async fn commit_and_push(&self, destination: &RepositoryHandle) -> Result<(), SyncError> {
        self.git
            .commit(&destination.checkout, &self.config.commit_message)
            .await?;
        self.git
            .push(
                &destination.checkout,
                &destination.url,
                &destination.branch,
                self.token.as_ref(),
            )
            .await
    }
}
