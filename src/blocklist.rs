//! Block list manager
//!
//! Per-session sets of blocked peer addresses. A block targets the address
//! a name resolved to at block time, so it survives the target renaming.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;

use crate::error::BlockError;
use crate::registry::SessionRegistry;
use crate::types::ClientId;

#[derive(Debug, Default)]
pub struct BlockListManager {
    blocked: HashMap<ClientId, HashSet<SocketAddr>>,
}

impl BlockListManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an empty block set for a new session
    pub fn insert(&mut self, id: ClientId) {
        self.blocked.entry(id).or_default();
    }

    /// Drop a session's block set
    pub fn remove(&mut self, id: ClientId) {
        self.blocked.remove(&id);
    }

    /// Check whether `id` has blocked `addr`
    pub fn is_blocked(&self, id: ClientId, addr: SocketAddr) -> bool {
        self.blocked
            .get(&id)
            .is_some_and(|set| set.contains(&addr))
    }

    pub fn block(
        &mut self,
        registry: &SessionRegistry,
        id: ClientId,
        target: &str,
    ) -> Result<(), BlockError> {
        let addr = self.resolve(registry, id, target)?;
        let set = self.blocked.entry(id).or_default();
        if !set.insert(addr) {
            return Err(BlockError::AlreadyBlocked);
        }
        Ok(())
    }

    pub fn unblock(
        &mut self,
        registry: &SessionRegistry,
        id: ClientId,
        target: &str,
    ) -> Result<(), BlockError> {
        let addr = self.resolve(registry, id, target)?;
        let removed = self
            .blocked
            .get_mut(&id)
            .is_some_and(|set| set.remove(&addr));
        if !removed {
            return Err(BlockError::NotBlocked);
        }
        Ok(())
    }

    fn resolve(
        &self,
        registry: &SessionRegistry,
        id: ClientId,
        target: &str,
    ) -> Result<SocketAddr, BlockError> {
        let session = registry
            .find_by_name(target)
            .ok_or(BlockError::UnknownUser)?;
        if session.id == id {
            return Err(BlockError::SelfBlock);
        }
        Ok(session.addr)
    }

    #[cfg(test)]
    fn has_entry(&self, id: ClientId) -> bool {
        self.blocked.contains_key(&id)
    }
}
