//! Git operations used by the sync workflow
//!
//! Clone and push are the two operations that may carry a token. Both follow
//! the same contract: the raw stderr is logged locally with the token masked,
//! and the error that travels upward is rebuilt from the generic command
//! failure and the unauthenticated URL only.

use crate::core::error::SyncError;
use crate::core::traits::{CommandRunner, ExecOptions};
use crate::security::command_executor::CommandError;
use crate::security::credential_injector::{authenticate, redact_url};
use crate::security::token_manager::SecureTokenManager;
use console::style;
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A remote/branch pair and where it is checked out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    pub url: String,
    pub branch: String,
    pub checkout: PathBuf,
}

impl RepositoryHandle {
    pub fn new(url: impl Into<String>, branch: impl Into<String>, checkout: PathBuf) -> Self {
        Self {
            url: url.into(),
            branch: branch.into(),
            checkout,
        }
    }
}

/// Thin git client on top of a [`CommandRunner`]
#[derive(Clone)]
pub struct GitClient {
    runner: Arc<dyn CommandRunner>,
    masker: SecureTokenManager,
}

impl GitClient {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            masker: SecureTokenManager::new(),
        }
    }

    /// Clone `handle.branch` of `handle.url` into `handle.checkout`
    ///
    /// `cwd` is the directory git is started in. Both paths are relative to
    /// the process working directory; the target handed to git is rewritten
    /// relative to `cwd` when the checkout sits below it.
    pub async fn clone_branch(
        &self,
        cwd: &Path,
        handle: &RepositoryHandle,
        token: Option<&SecretString>,
    ) -> Result<(), SyncError> {
        info!(
            "📥 Cloning {} into {}",
            style(redact_url(&handle.url)).cyan(),
            style(handle.checkout.display()).cyan()
        );

        if token.is_some() {
            info!("🔑 Using token");
        }

        let remote = authenticate(&handle.url, token);
        let target = handle
            .checkout
            .strip_prefix(cwd)
            .unwrap_or(handle.checkout.as_path());
        let args = vec![
            "clone".to_string(),
            "-b".to_string(),
            handle.branch.clone(),
            remote.expose_secret().to_string(),
            target.to_string_lossy().to_string(),
        ];

        self.runner
            .run(cwd, "git", &args, ExecOptions::quiet())
            .await
            .map(|_| ())
            .map_err(|err| {
                let message = self.redacted_message(&err, token);
                SyncError::CloneFailed {
                    repository: redact_url(&handle.url),
                    branch: handle.branch.clone(),
                    message,
                }
            })
    }

    /// Push the checked-out branch in `checkout` to `repo_url`
    pub async fn push(
        &self,
        checkout: &Path,
        repo_url: &str,
        branch: &str,
        token: Option<&SecretString>,
    ) -> Result<(), SyncError> {
        info!("📤 Pushing changes to {}", style(redact_url(repo_url)).cyan());

        if token.is_some() {
            info!("🔑 Using token");
        }

        let remote = authenticate(repo_url, token);
        let args = vec![
            "push".to_string(),
            remote.expose_secret().to_string(),
            branch.to_string(),
        ];

        self.runner
            .run(checkout, "git", &args, ExecOptions::quiet())
            .await
            .map(|_| ())
            .map_err(|err| SyncError::PushFailed {
                repository: redact_url(repo_url),
                message: self.redacted_message(&err, token),
            })
    }

    /// URL of `remote.origin` in the checkout at `cwd`
    pub async fn remote_origin_url(&self, cwd: &Path) -> Result<String, SyncError> {
        let args = vec![
            "config".to_string(),
            "--get".to_string(),
            "remote.origin.url".to_string(),
        ];

        let output = self
            .runner
            .run(cwd, "git", &args, ExecOptions::quiet())
            .await
            .map_err(|e| SyncError::RemoteDiscoveryFailed {
                message: e.to_string(),
            })?;

        let url = output.stdout.trim().to_string();
        if url.is_empty() {
            return Err(SyncError::RemoteDiscoveryFailed {
                message: format!("remote.origin.url is empty in {}", cwd.display()),
            });
        }

        debug!("Discovered destination repository {}", redact_url(&url));
        Ok(url)
    }

    /// Stage added, modified and deleted files matching any of `pathspecs`
    pub async fn stage(&self, checkout: &Path, pathspecs: &[String]) -> Result<(), SyncError> {
        let mut args = vec!["add".to_string(), "-A".to_string(), "--".to_string()];
        args.extend(pathspecs.iter().cloned());

        self.runner
            .run(checkout, "git", &args, ExecOptions::loud())
            .await
            .map(|_| ())
            .map_err(|e| SyncError::StageFailed {
                message: e.to_string(),
            })
    }

    /// Commit whatever is staged
    pub async fn commit(&self, checkout: &Path, message: &str) -> Result<(), SyncError> {
        let args = vec!["commit".to_string(), "-m".to_string(), message.to_string()];

        self.runner
            .run(checkout, "git", &args, ExecOptions::loud())
            .await
            .map(|_| ())
            .map_err(|e| SyncError::CommitFailed {
                message: e.to_string(),
            })
    }

    /// Log the raw failure locally and return the message allowed to travel upward
    fn redacted_message(&self, err: &CommandError, token: Option<&SecretString>) -> String {
        if let Some(stderr) = self.masked_stderr(err, token) {
            warn!("{}", style(stderr).yellow());
        }
        self.mask(err.to_string(), token)
    }

    /// The stderr line logged for a failed command, with the token masked
    fn masked_stderr(&self, err: &CommandError, token: Option<&SecretString>) -> Option<String> {
        err.result()
            .filter(|result| !result.stderr.is_empty())
            .map(|result| self.mask(result.stderr.clone(), token))
    }

    fn mask(&self, text: String, token: Option<&SecretString>) -> String {
        match token {
            Some(token) => self.masker.mask_secret_in(&text, token),
            None => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::CommandOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const TOKEN: &str = "ghp_TopSecretToken123";

    /// Fails every call with stderr that echoes the arguments back
    #[derive(Default)]
    struct EchoingFailureRunner {
        calls: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl CommandRunner for EchoingFailureRunner {
        async fn run(
            &self,
            _cwd: &Path,
            program: &str,
            args: &[String],
            _options: ExecOptions,
        ) -> Result<CommandOutput, CommandError> {
            self.calls.lock().unwrap().push(args.to_vec());
            Err(CommandError::NonZeroExit {
                command: crate::security::command_executor::command_label(program, args),
                code: 128,
                result: CommandOutput {
                    code: Some(128),
                    stdout: String::new(),
                    stderr: format!("fatal: repository '{}' not found", args.join(" ")),
                },
            })
        }
    }

    /// Succeeds every call with a fixed stdout
    struct FixedOutputRunner(String);

    #[async_trait]
    impl CommandRunner for FixedOutputRunner {
        async fn run(
            &self,
            _cwd: &Path,
            _program: &str,
            _args: &[String],
            _options: ExecOptions,
        ) -> Result<CommandOutput, CommandError> {
            Ok(CommandOutput {
                code: Some(0),
                stdout: self.0.clone(),
                stderr: String::new(),
            })
        }
    }

    fn token() -> SecretString {
        SecretString::new(TOKEN.into())
    }

    #[tokio::test]
    async fn test_clone_failure_never_carries_token() {
        let runner = Arc::new(EchoingFailureRunner::default());
        let git = GitClient::new(runner.clone());
        let handle = RepositoryHandle::new(
            "https://github.com/acme/docs.wiki.git",
            "master",
            PathBuf::from("source"),
        );

        let err = git
            .clone_branch(Path::new("."), &handle, Some(&token()))
            .await
            .unwrap_err();

        let calls = runner.calls.lock().unwrap();
        assert!(calls[0].iter().any(|arg| arg.contains(TOKEN)));

        assert!(matches!(err, SyncError::CloneFailed { .. }));
        assert!(!err.to_string().contains(TOKEN));
        assert!(!format!("{:?}", err).contains(TOKEN));
        assert!(err.to_string().contains("https://github.com/acme/docs.wiki.git"));
    }

    #[tokio::test]
    async fn test_clone_arguments() {
        let runner = Arc::new(EchoingFailureRunner::default());
        let git = GitClient::new(runner.clone());
        let handle = RepositoryHandle::new(
            "git@github.com:acme/site.git",
            "gh-pages",
            PathBuf::from("dest"),
        );

        let _ = git.clone_branch(Path::new("."), &handle, None).await;

        let calls = runner.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            vec!["clone", "-b", "gh-pages", "git@github.com:acme/site.git", "dest"]
        );
    }

    #[tokio::test]
    async fn test_clone_target_is_relative_to_cwd() {
        let runner = Arc::new(EchoingFailureRunner::default());
        let git = GitClient::new(runner.clone());
        let handle = RepositoryHandle::new(
            "https://github.com/acme/docs.wiki.git",
            "master",
            PathBuf::from(".tmp/source"),
        );

        let _ = git.clone_branch(Path::new(".tmp"), &handle, None).await;

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0][4], "source");
    }

    #[tokio::test]
    async fn test_clone_target_outside_cwd_is_kept() {
        let runner = Arc::new(EchoingFailureRunner::default());
        let git = GitClient::new(runner.clone());
        let handle = RepositoryHandle::new(
            "https://github.com/acme/docs.wiki.git",
            "master",
            PathBuf::from("/srv/checkouts/source"),
        );

        let _ = git.clone_branch(Path::new("/tmp"), &handle, None).await;

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0][4], "/srv/checkouts/source");
    }

    #[tokio::test]
    async fn test_logged_stderr_is_fully_masked() {
        let runner = Arc::new(EchoingFailureRunner::default());
        let git = GitClient::new(runner.clone());
        let args = vec![
            "push".to_string(),
            format!("https://{}@github.com/acme/site.git", TOKEN),
        ];
        let err = runner
            .run(Path::new("."), "git", &args, ExecOptions::quiet())
            .await
            .unwrap_err();
        assert!(err.result().unwrap().stderr.contains(TOKEN));

        let logged = git.masked_stderr(&err, Some(&token())).unwrap();

        assert!(!logged.contains(TOKEN));
        assert!(!logged.contains("123"));
        assert!(logged.contains("https://****@github.com/acme/site.git"));
    }

    #[tokio::test]
    async fn test_stage_passes_every_pathspec() {
        let runner = Arc::new(EchoingFailureRunner::default());
        let git = GitClient::new(runner.clone());

        let _ = git
            .stage(
                Path::new("."),
                &[":(glob)*.md".to_string(), ":(literal)old/Gone.md".to_string()],
            )
            .await;

        let calls = runner.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            vec!["add", "-A", "--", ":(glob)*.md", ":(literal)old/Gone.md"]
        );
    }

    #[tokio::test]
    async fn test_push_failure_never_carries_token() {
        let runner = Arc::new(EchoingFailureRunner::default());
        let git = GitClient::new(runner.clone());

        let err = git
            .push(
                Path::new("."),
                "git@github.com:acme/site.git",
                "gh-pages",
                Some(&token()),
            )
            .await
            .unwrap_err();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0][0], "push");
        assert_eq!(calls[0][1], format!("{}@github.com:acme/site.git", TOKEN));
        assert_eq!(calls[0][2], "gh-pages");

        assert_eq!(err.code(), "PUSH_FAILED");
        assert!(!format!("{:?}", err).contains(TOKEN));
    }

    #[tokio::test]
    async fn test_remote_origin_url_is_trimmed() {
        let git = GitClient::new(Arc::new(FixedOutputRunner(
            "  git@github.com:acme/site.git\n".to_string(),
        )));

        let url = git.remote_origin_url(Path::new(".")).await.unwrap();
        assert_eq!(url, "git@github.com:acme/site.git");
    }

    #[tokio::test]
    async fn test_remote_origin_url_empty_is_error() {
        let git = GitClient::new(Arc::new(FixedOutputRunner(String::new())));

        let result = git.remote_origin_url(Path::new(".")).await;
        assert!(matches!(
            result,
            Err(SyncError::RemoteDiscoveryFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_commit_failure_maps_to_soft_failure() {
        let git = GitClient::new(Arc::new(EchoingFailureRunner::default()));

        let err = git
            .commit(Path::new("."), "Updating posts from wiki pages")
            .await
            .unwrap_err();

        assert!(err.is_recoverable());
    }
}
