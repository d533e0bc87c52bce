//! Error handling for wiki synchronization
//!
//! This module provides the error taxonomy for a sync run with recovery guidance
//! using the thiserror crate for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

/// How a failure is treated by the sync workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Clone/push failures: raw detail logged locally, generic detail propagated
    AuthRedactionBoundary,
    /// Commit failures inside the guarded commit/push unit: logged only
    SoftFailure,
    /// Everything else: aborts the run with a non-zero exit status
    FatalUnhandled,
}

/// Main error type for sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    // Configuration errors
    #[error("設定エラー: {0}")]
    ConfigError(String),

    // Workspace errors
    #[error("[{}] 作業ディレクトリの準備に失敗しました: {message}", path.display())]
    WorkspaceError { path: PathBuf, message: String },

    // Repository errors
    #[error("[{repository}] ブランチ {branch} のクローンに失敗しました: {message}")]
    CloneFailed {
        repository: String,
        branch: String,
        message: String,
    },

    #[error("[{repository}] プッシュに失敗しました: {message}")]
    PushFailed { repository: String, message: String },

    #[error("リモートURLの取得に失敗しました: {message}")]
    RemoteDiscoveryFailed { message: String },

    // Content errors
    #[error("[{}] ファイルのコピーに失敗しました: {message}", path.display())]
    CopyFailed { path: PathBuf, message: String },

    #[error("[{}] 更新マーカーの書き込みに失敗しました: {message}", path.display())]
    MarkerWriteFailed { path: PathBuf, message: String },

    // Commit errors
    #[error("変更のステージングに失敗しました: {message}")]
    StageFailed { message: String },

    #[error("コミットに失敗しました: {message}")]
    CommitFailed { message: String },
}

impl SyncError {
    /// Classify this error according to the workflow's propagation policy
    pub fn class(&self) -> FailureClass {
        match self {
            Self::CloneFailed { .. } | Self::PushFailed { .. } => {
                FailureClass::AuthRedactionBoundary
            }
            Self::CommitFailed { .. } => FailureClass::SoftFailure,
            _ => FailureClass::FatalUnhandled,
        }
    }

    /// Check if this error is recoverable without operator intervention
    pub fn is_recoverable(&self) -> bool {
        matches!(self.class(), FailureClass::SoftFailure)
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::ConfigError(_) => vec![
                ".pages-sync.yamlを確認してください",
                "checkコマンドで設定を検証してください",
            ],
            Self::WorkspaceError { .. } => vec![
                "作業ディレクトリの書き込み権限を確認してください",
                "別のプロセスが作業ディレクトリを使用していないか確認してください",
            ],
            Self::CloneFailed { .. } => vec![
                "リポジトリURLとブランチ名を確認してください",
                "GITHUB_ACCESS_TOKENが正しく設定されているか確認してください",
                "ネットワーク接続を確認してください",
            ],
            Self::PushFailed { .. } => vec![
                "GITHUB_ACCESS_TOKENに書き込み権限があるか確認してください",
                "リモートブランチが保護されていないか確認してください",
            ],
            Self::RemoteDiscoveryFailed { .. } => vec![
                "gitリポジトリ内で実行してください",
                "remote.originが設定されているか確認してください",
                "destination_repoを設定ファイルで指定することもできます",
            ],
            Self::CopyFailed { .. } => vec![
                "ソースリポジトリにインデックスファイルが存在するか確認してください",
                "ディスク容量を確認してください",
            ],
            Self::MarkerWriteFailed { .. } => {
                vec!["公開先チェックアウトの書き込み権限を確認してください"]
            }
            Self::StageFailed { .. } => vec!["git addの出力を確認してください"],
            Self::CommitFailed { .. } => vec![
                "変更がない場合は対応不要です",
                "git user.name / user.emailが設定されているか確認してください",
            ],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::WorkspaceError { .. } => "WORKSPACE_ERROR",
            Self::CloneFailed { .. } => "CLONE_FAILED",
            Self::PushFailed { .. } => "PUSH_FAILED",
            Self::RemoteDiscoveryFailed { .. } => "REMOTE_DISCOVERY_FAILED",
            Self::CopyFailed { .. } => "COPY_FAILED",
            Self::MarkerWriteFailed { .. } => "MARKER_WRITE_FAILED",
            Self::StageFailed { .. } => "STAGE_FAILED",
            Self::CommitFailed { .. } => "COMMIT_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_failed_is_redaction_boundary() {
        let error = SyncError::CloneFailed {
            repository: "https://github.com/acme/docs.wiki.git".to_string(),
            branch: "master".to_string(),
            message: "Command failed: git clone (exit code 128)".to_string(),
        };

        assert_eq!(error.class(), FailureClass::AuthRedactionBoundary);
        assert!(!error.is_recoverable());
        assert_eq!(error.code(), "CLONE_FAILED");
        assert!(error.suggested_actions().len() >= 3);
    }

    #[test]
    fn test_push_failed_is_redaction_boundary() {
        let error = SyncError::PushFailed {
            repository: "git@github.com:acme/docs.git".to_string(),
            message: "Command failed: git push (exit code 1)".to_string(),
        };

        assert_eq!(error.class(), FailureClass::AuthRedactionBoundary);
        assert_eq!(error.code(), "PUSH_FAILED");
    }

    #[test]
    fn test_commit_failed_is_soft_failure() {
        let error = SyncError::CommitFailed {
            message: "nothing to commit".to_string(),
        };

        assert_eq!(error.class(), FailureClass::SoftFailure);
        assert!(error.is_recoverable());
        assert_eq!(error.code(), "COMMIT_FAILED");
    }

    #[test]
    fn test_copy_and_stage_failures_are_fatal() {
        let copy = SyncError::CopyFailed {
            path: PathBuf::from("/tmp/source/Home.md"),
            message: "No such file or directory".to_string(),
        };
        let stage = SyncError::StageFailed {
            message: "exit code 128".to_string(),
        };

        assert_eq!(copy.class(), FailureClass::FatalUnhandled);
        assert_eq!(stage.class(), FailureClass::FatalUnhandled);
        assert!(!copy.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let error = SyncError::CloneFailed {
            repository: "https://github.com/acme/docs.wiki.git".to_string(),
            branch: "master".to_string(),
            message: "exit code 128".to_string(),
        };

        let display = format!("{}", error);
        assert!(display.contains("https://github.com/acme/docs.wiki.git"));
        assert!(display.contains("master"));
        assert!(display.contains("クローンに失敗"));
    }

    #[test]
    fn test_workspace_error_display_includes_path() {
        let error = SyncError::WorkspaceError {
            path: PathBuf::from("/srv/pages/.tmp"),
            message: "permission denied".to_string(),
        };

        assert!(error.to_string().contains("/srv/pages/.tmp"));
        assert_eq!(error.code(), "WORKSPACE_ERROR");
    }
}
