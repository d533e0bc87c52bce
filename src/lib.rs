pub mod core;
pub mod git;
pub mod orchestration;
pub mod security;

pub use self::core::*;
pub use git::{GitClient, RepositoryHandle};
pub use orchestration::{PagesSync, SyncOutcome, SyncReport, Workspace};
pub use security::{CommandError, SafeCommandExecutor, SecureTokenManager};
