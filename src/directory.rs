//! Username directory
//!
//! Enforces name validity, the reserved-name list and uniqueness across
//! registered sessions.

use std::collections::HashSet;

use crate::error::NameError;
use crate::registry::SessionRegistry;
use crate::types::ClientId;

/// Names no client may take
pub const RESERVED_NAMES: [&str; 3] = ["server", "admin", "moderator"];

#[derive(Debug, Clone)]
pub struct UsernameDirectory {
    forbidden: HashSet<String>,
}

impl Default for UsernameDirectory {
    fn default() -> Self {
        Self::new(RESERVED_NAMES.iter().map(|n| n.to_string()))
    }
}

impl UsernameDirectory {
    pub fn new(forbidden: impl IntoIterator<Item = String>) -> Self {
        Self {
            forbidden: forbidden.into_iter().collect(),
        }
    }

    pub fn is_forbidden(&self, name: &str) -> bool {
        self.forbidden.contains(name)
    }

    /// Validate `requested` and assign it to the session
    ///
    /// Checks run in order: invalid, forbidden, unchanged, taken. On any
    /// error the session keeps its current name.
    pub fn try_set_name(
        &self,
        registry: &mut SessionRegistry,
        id: ClientId,
        requested: &str,
    ) -> Result<(), NameError> {
        if requested.is_empty() || requested.chars().any(char::is_whitespace) {
            return Err(NameError::Invalid);
        }
        if self.is_forbidden(requested) {
            return Err(NameError::Forbidden);
        }

        let current = registry.get(id).map(|s| s.name.as_str()).unwrap_or("");
        if current == requested {
            return Err(NameError::Unchanged);
        }
        if registry.find_by_name(requested).is_some() {
            return Err(NameError::Taken);
        }

        registry.set_name(id, requested.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::SocketAddr;

    use tokio::sync::mpsc;

    fn setup() -> (SessionRegistry, ClientId, ClientId) {
        let mut registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(8);
        let a = ClientId::new();
        let b = ClientId::new();
        registry.register(a, SocketAddr::from(([127, 0, 0, 1], 6001)), tx.clone());
        registry.register(b, SocketAddr::from(([127, 0, 0, 1], 6002)), tx);
        (registry, a, b)
    }

    #[test]
    fn test_set_name_success() {
        let (mut registry, a, _) = setup();
        let directory = UsernameDirectory::default();

        assert_eq!(directory.try_set_name(&mut registry, a, "alice"), Ok(()));
        assert_eq!(registry.get(a).unwrap().name, "alice");

        // Renaming later is allowed
        assert_eq!(directory.try_set_name(&mut registry, a, "alicia"), Ok(()));
        assert_eq!(registry.get(a).unwrap().name, "alicia");
    }

    #[test]
    fn test_forbidden_names_rejected() {
        let (mut registry, a, _) = setup();
        let directory = UsernameDirectory::default();
        directory.try_set_name(&mut registry, a, "alice").unwrap();

        for name in RESERVED_NAMES {
            assert_eq!(
                directory.try_set_name(&mut registry, a, name),
                Err(NameError::Forbidden)
            );
        }
        assert_eq!(registry.get(a).unwrap().name, "alice");

        // Case-sensitive
        assert_eq!(directory.try_set_name(&mut registry, a, "Admin"), Ok(()));
    }

    #[test]
    fn test_unchanged_and_taken() {
        let (mut registry, a, b) = setup();
        let directory = UsernameDirectory::default();
        directory.try_set_name(&mut registry, a, "alice").unwrap();
        directory.try_set_name(&mut registry, b, "bob").unwrap();

        assert_eq!(
            directory.try_set_name(&mut registry, a, "alice"),
            Err(NameError::Unchanged)
        );
        assert_eq!(
            directory.try_set_name(&mut registry, a, "bob"),
            Err(NameError::Taken)
        );
        assert_eq!(registry.get(a).unwrap().name, "alice");
    }

    #[test]
    fn test_invalid_names() {
        let (mut registry, a, _) = setup();
        let directory = UsernameDirectory::default();

        for name in ["", "two words", "tab\there"] {
            assert_eq!(
                directory.try_set_name(&mut registry, a, name),
                Err(NameError::Invalid)
            );
        }
        assert!(!registry.get(a).unwrap().is_registered());
    }

    #[test]
    fn test_custom_forbidden_list() {
        let (mut registry, a, _) = setup();
        let directory = UsernameDirectory::new(["root".to_string()]);

        assert_eq!(
            directory.try_set_name(&mut registry, a, "root"),
            Err(NameError::Forbidden)
        );
        assert_eq!(directory.try_set_name(&mut registry, a, "admin"), Ok(()));
    }
}
