use engine::Authenticator;

use crate::client::Credentials;

/// Credentials of the logged in user. Empty until a login succeeds.
#[derive(Debug, Default)]
pub struct Session {
    credentials: Option<Credentials>,
}

impl Session {
    pub fn login(&mut self, credentials: Credentials) {
        tracing::info!(username = %credentials.username, "logged in");
        self.credentials = Some(credentials);
    }

    /// Forgets the credentials. Returns the name of the user that was logged in.
    pub fn logout(&mut self) -> Option<String> {
        let credentials = self.credentials.take()?;
        tracing::info!(username = %credentials.username, "logged out");
        Some(credentials.username)
    }
}

impl Authenticator for Session {
    fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    fn identity(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }
}
