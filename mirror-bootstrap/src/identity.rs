use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use uuid::Uuid;

/// File under the state directory holding the identity token.
const IDENTITY_FILE: &str = "replica_identity";

/// An opaque random token identifying this replica across restarts.
///
/// Generated once on the first fresh bootstrap and reused thereafter. The
/// token is purely diagnostic; replication correctness does not depend on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaIdentity(String);

impl ReplicaIdentity {
    /// Reads the persisted identity, if one exists.
    pub fn load(state_dir: &Path) -> Result<Option<Self>, io::Error> {
        let path = state_dir.join(IDENTITY_FILE);
        match fs::read_to_string(&path) {
            Ok(token) => {
                let token = token.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Self(token.to_string())))
                }
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Reads the persisted identity, generating and persisting a new one if
    /// absent.
    pub fn load_or_create(state_dir: &Path) -> Result<Self, io::Error> {
        if let Some(identity) = Self::load(state_dir)? {
            return Ok(identity);
        }

        fs::create_dir_all(state_dir)?;
        let identity = Self(Uuid::new_v4().to_string());
        fs::write(state_dir.join(IDENTITY_FILE), identity.as_str())?;

        Ok(identity)
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReplicaIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_returns_none_when_absent() {
        let state_dir = TempDir::new().unwrap();
        assert_eq!(ReplicaIdentity::load(state_dir.path()).unwrap(), None);
    }

    #[test]
    fn test_load_or_create_persists_token() {
        let state_dir = TempDir::new().unwrap();

        let created = ReplicaIdentity::load_or_create(state_dir.path()).unwrap();
        let reloaded = ReplicaIdentity::load_or_create(state_dir.path()).unwrap();

        assert_eq!(created, reloaded);
        assert_eq!(
            ReplicaIdentity::load(state_dir.path()).unwrap(),
            Some(created)
        );
    }

    #[test]
    fn test_load_or_create_creates_missing_state_dir() {
        let parent = TempDir::new().unwrap();
        let state_dir = parent.path().join("nested/state");

        let identity = ReplicaIdentity::load_or_create(&state_dir).unwrap();
        assert!(!identity.as_str().is_empty());
    }

    #[test]
    fn test_blank_identity_file_is_regenerated() {
        let state_dir = TempDir::new().unwrap();
        fs::write(state_dir.path().join(IDENTITY_FILE), "  \n").unwrap();

        let identity = ReplicaIdentity::load_or_create(state_dir.path()).unwrap();
        assert!(!identity.as_str().is_empty());
    }
}
