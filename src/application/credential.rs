use crate::application::error::SyncError;
use crate::infrastructure::credential_store::CredentialStore;

/// Bearer token scoped to the calendar service, passed into every remote call.
#[derive(Clone, PartialEq, Eq)]
pub struct CalendarCredential {
    access_token: String,
}

impl CalendarCredential {
    pub fn new(access_token: impl Into<String>) -> Result<Self, SyncError> {
        let access_token = access_token.into().trim().to_string();
        if access_token.is_empty() {
            return Err(SyncError::NoCredential);
        }
        Ok(Self { access_token })
    }

    pub fn from_store(store: &dyn CredentialStore) -> Result<Self, SyncError> {
        let token = store
            .load_access_token()
            .map_err(|error| SyncError::Credential(error.to_string()))?
            .ok_or(SyncError::NoCredential)?;
        Self::new(token)
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl std::fmt::Debug for CalendarCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarCredential")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::credential_store::InMemoryCredentialStore;

    #[test]
    fn blank_token_fails_fast() {
        assert_eq!(CalendarCredential::new(" \t"), Err(SyncError::NoCredential));
    }

    #[test]
    fn empty_store_reports_no_credential() {
        let store = InMemoryCredentialStore::default();
        assert_eq!(
            CalendarCredential::from_store(&store),
            Err(SyncError::NoCredential)
        );

        store.save_access_token("ya29.abc").expect("save token");
        let credential = CalendarCredential::from_store(&store).expect("credential");
        assert_eq!(credential.access_token(), "ya29.abc");
        assert!(!format!("{credential:?}").contains("ya29"));
    }
}
