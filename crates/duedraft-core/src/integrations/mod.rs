pub mod notion;
pub mod traits;

pub use notion::NotionClient;
pub use traits::{NewTask, TaskSink, WorkspaceSource};

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    use crate::error::WorkspaceError;

    const SERVICE: &str = "duedraft";

    /// Keyring entry holding the Notion integration token.
    pub const NOTION_TOKEN_KEY: &str = "notion_token";

    /// Environment variable that takes precedence over the keyring.
    pub const NOTION_TOKEN_ENV: &str = "NOTION_TOKEN";

    pub fn get(key: &str) -> Result<Option<String>, WorkspaceError> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), WorkspaceError> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    pub fn delete(key: &str) -> Result<(), WorkspaceError> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Where the active token came from.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum TokenSource {
        Env,
        Keyring,
    }

    /// Resolve the Notion token: `NOTION_TOKEN` first, then the keyring.
    ///
    /// # Errors
    /// `MissingCredentials` when neither is set.
    pub fn resolve_notion_token() -> Result<(String, TokenSource), WorkspaceError> {
        if let Some(token) = std::env::var(NOTION_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
        {
            return Ok((token, TokenSource::Env));
        }
        match get(NOTION_TOKEN_KEY)? {
            Some(token) if !token.trim().is_empty() => Ok((token, TokenSource::Keyring)),
            _ => Err(WorkspaceError::MissingCredentials),
        }
    }
}
