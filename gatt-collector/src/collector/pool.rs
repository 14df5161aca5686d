//! Fixed-capacity set of connection contexts.

use {
    super::{ConnectionContext, ProfileError, TaskId},
    crate::{gatt::ConnHandle, profile::Profile},
    heapless::Vec,
};

/// Holds at most `N` contexts, at most one per connection.
#[derive(Debug)]
pub struct Pool<P: Profile, const N: usize> {
    contexts: Vec<ConnectionContext<P>, N>,
}

impl<P: Profile, const N: usize> Pool<P, N> {
    pub fn new() -> Self {
        Self {
            contexts: Vec::new(),
        }
    }

    /// Drops every context, without notifying anyone.
    pub fn reset_all(&mut self) {
        self.contexts.clear();
    }

    /// Creates the context of `conn`.
    ///
    /// Fails with `AllocationExhausted` if the pool is full or `conn` already has a context.
    pub fn create(
        &mut self,
        conn: ConnHandle,
        owner: TaskId,
    ) -> Result<&mut ConnectionContext<P>, ProfileError> {
        if self.lookup(conn).is_some() {
            return Err(ProfileError::AllocationExhausted);
        }
        self.contexts
            .push(ConnectionContext::new(conn, owner))
            .map_err(|_| ProfileError::AllocationExhausted)?;
        let last = self.contexts.len() - 1;
        Ok(&mut self.contexts[last])
    }

    /// Removes and returns the context of `conn`.
    pub fn destroy(&mut self, conn: ConnHandle) -> Option<ConnectionContext<P>> {
        let index = self.contexts.iter().position(|ctx| ctx.conn() == conn)?;
        Some(self.contexts.swap_remove(index))
    }

    pub fn lookup(&self, conn: ConnHandle) -> Option<&ConnectionContext<P>> {
        self.contexts.iter().find(|ctx| ctx.conn() == conn)
    }

    pub fn lookup_mut(&mut self, conn: ConnHandle) -> Option<&mut ConnectionContext<P>> {
        self.contexts.iter_mut().find(|ctx| ctx.conn() == conn)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectionContext<P>> {
        self.contexts.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ConnectionContext<P>> {
        self.contexts.iter_mut()
    }
}

impl<P: Profile, const N: usize> Default for Pool<P, N> {
    fn default() -> Self {
        Self::new()
    }
}
