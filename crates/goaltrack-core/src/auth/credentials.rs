use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "goaltrack";

/// Remembered passwords, kept in the OS keychain.
///
/// Entries are scoped to a server so the same username on two backends
/// does not share a password.
pub struct CredentialStore {
    server: String,
}

impl CredentialStore {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
        }
    }

    fn entry(&self, username: &str) -> Result<Entry> {
        let account = format!("{}|{}", self.server, username);
        Entry::new(SERVICE_NAME, &account).context("Failed to create keyring entry")
    }

    /// Store username and password in the OS keychain
    pub fn store(&self, username: &str, password: &str) -> Result<()> {
        self.entry(username)?
            .set_password(password)
            .context("Failed to store password in keychain")
    }

    pub fn get_password(&self, username: &str) -> Result<String> {
        self.entry(username)?
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Forget the password for a username. A missing entry is not an error.
    pub fn delete(&self, username: &str) -> Result<()> {
        match self.entry(username)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete credential from keychain"),
        }
    }

    pub fn has_credentials(&self, username: &str) -> bool {
        self.entry(username)
            .and_then(|entry| Ok(entry.get_password()?))
            .is_ok()
    }
}
