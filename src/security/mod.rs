pub mod command_executor;
pub mod credential_injector;
pub mod token_manager;

pub use command_executor::{CommandError, SafeCommandExecutor};
pub use credential_injector::{authenticate, inject_token, redact_url};
pub use token_manager::SecureTokenManager;
