use core::fmt;
use std::sync::Arc;

use dashmap::DashMap;

/// Connections bound to a distributed transaction, one per datasource.
///
/// Keyed by `(xid, datasource)`. Safe to share; a transaction may hop
/// between threads.
pub struct ConnectionRegistry<C> {
    connections: DashMap<(String, String), Arc<C>>,
}

impl<C> ConnectionRegistry<C> {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    pub fn get(&self, xid: &str, datasource: &str) -> Option<Arc<C>> {
        self.connections
            .get(&(xid.to_owned(), datasource.to_owned()))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Binds `connection`, returning whichever connection it replaced.
    pub fn put(
        &self,
        xid: impl Into<String>,
        datasource: impl Into<String>,
        connection: Arc<C>,
    ) -> Option<Arc<C>> {
        self.connections
            .insert((xid.into(), datasource.into()), connection)
    }

    /// Drops every connection bound to `xid`, returning how many there were.
    pub fn release(&self, xid: &str) -> usize {
        let mut released = 0;
        self.connections.retain(|(bound, _), _| {
            let keep = bound != xid;
            if !keep {
                released += 1;
            }
            keep
        });
        released
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl<C> Default for ConnectionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for ConnectionRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("len", &self.connections.len())
            .finish()
    }
}
