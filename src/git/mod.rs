//! Git plumbing for cloning, staging, committing and pushing

pub mod repository;

pub use repository::{GitClient, RepositoryHandle};
