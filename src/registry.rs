//! Session registry
//!
//! Holds every active connection and its registration state. Owned by the
//! `ChatServer` actor, so all access is serialized through its command loop.

use std::collections::HashMap;
use std::net::SocketAddr;

use tokio::sync::mpsc;

use crate::message::ServerMessage;
use crate::session::Session;
use crate::types::ClientId;

/// Registry of active sessions keyed by connection handle
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<ClientId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unnamed session
    ///
    /// Returns false if the handle is already registered; the existing
    /// session is left untouched.
    pub fn register(
        &mut self,
        id: ClientId,
        addr: SocketAddr,
        sender: mpsc::Sender<ServerMessage>,
    ) -> bool {
        if self.sessions.contains_key(&id) {
            return false;
        }
        self.sessions.insert(id, Session::new(id, addr, sender));
        true
    }

    /// Overwrite a session's name without validation
    ///
    /// Callers go through `UsernameDirectory::try_set_name`.
    pub fn set_name(&mut self, id: ClientId, name: String) -> bool {
        match self.sessions.get_mut(&id) {
            Some(session) => {
                session.name = name;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: ClientId) -> Option<Session> {
        self.sessions.remove(&id)
    }

    pub fn get(&self, id: ClientId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn find<P>(&self, predicate: P) -> Option<&Session>
    where
        P: Fn(&Session) -> bool,
    {
        self.sessions.values().find(|&s| predicate(s))
    }

    /// Find the registered session holding `name`
    pub fn find_by_name(&self, name: &str) -> Option<&Session> {
        if name.is_empty() {
            return None;
        }
        self.find(|s| s.name == name)
    }

    /// Point-in-time copy of all sessions
    pub fn all(&self) -> Snapshot {
        Snapshot {
            sessions: self.sessions.values().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Restartable snapshot of the registry
///
/// Later registry mutations are not reflected; iterate as many times as
/// needed.
#[derive(Debug, Clone)]
pub struct Snapshot {
    sessions: Vec<Session>,
}

impl Snapshot {
    pub fn iter(&self) -> std::slice::Iter<'_, Session> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Session;
    type IntoIter = std::slice::Iter<'a, Session>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(registry: &mut SessionRegistry, port: u16) -> ClientId {
        let (tx, _rx) = mpsc::channel(8);
        let id = ClientId::new();
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        assert!(registry.register(id, addr, tx));
        id
    }

    #[test]
    fn test_register_once_per_handle() {
        let mut registry = SessionRegistry::new();
        let id = add(&mut registry, 5001);
        registry.set_name(id, "alice".to_string());

        let (tx, _rx) = mpsc::channel(8);
        assert!(!registry.register(id, SocketAddr::from(([10, 0, 0, 1], 1)), tx));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(id).unwrap().name, "alice");
    }

    #[test]
    fn test_find_by_name_skips_unregistered() {
        let mut registry = SessionRegistry::new();
        let alice = add(&mut registry, 5001);
        add(&mut registry, 5002);
        registry.set_name(alice, "alice".to_string());

        assert_eq!(registry.find_by_name("alice").unwrap().id, alice);
        assert!(registry.find_by_name("").is_none());
        assert!(registry.find_by_name("bob").is_none());
    }

    #[test]
    fn test_snapshot_is_point_in_time() {
        let mut registry = SessionRegistry::new();
        let a = add(&mut registry, 5001);
        add(&mut registry, 5002);

        let snapshot = registry.all();
        registry.remove(a);
        add(&mut registry, 5003);
        add(&mut registry, 5004);

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().any(|s| s.id == a));
        // Restartable
        assert_eq!(snapshot.iter().count(), (&snapshot).into_iter().count());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_remove_and_set_name_unknown() {
        let mut registry = SessionRegistry::new();
        let ghost = ClientId::new();
        assert!(registry.remove(ghost).is_none());
        assert!(!registry.set_name(ghost, "x".to_string()));
        assert!(registry.is_empty());
    }
}
