use core::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    BoxError, Connection, ConnectionRegistry, CurrentDatasourceInfo, DataSource,
    DynamicDatasourceContextHolder, Error, GroupDataSource, LoadBalanceStrategy, Result, group_of,
};

/// Hands out connections from whichever datasource the calling thread's
/// context selects.
///
/// Names are resolved in this order: a group with that name, a datasource
/// with that name, then the primary (or [`Error::DatasourceNotFound`] when
/// strict). Inside a distributed transaction each datasource hands out one
/// connection, shared through the [`ConnectionRegistry`]. Nothing here learns
/// when a transaction ends: the transaction manager must call
/// [`release_transaction`](Self::release_transaction) on commit or rollback,
/// or the bound connections stay alive with the router.
pub struct RoutingDataSource<D: DataSource> {
    context: Arc<DynamicDatasourceContextHolder>,
    data_sources: DashMap<String, Arc<D>>,
    groups: DashMap<String, GroupDataSource<D>>,
    registry: ConnectionRegistry<D::Connection>,
    strategy: LoadBalanceStrategy,
    strict: bool,
    writes: Mutex<()>,
}

impl<D: DataSource> RoutingDataSource<D> {
    pub fn new(context: Arc<DynamicDatasourceContextHolder>) -> Self {
        Self {
            context,
            data_sources: DashMap::new(),
            groups: DashMap::new(),
            registry: ConnectionRegistry::new(),
            strategy: LoadBalanceStrategy::default(),
            strict: false,
            writes: Mutex::new(()),
        }
    }

    /// Strategy for groups created after this call.
    pub fn with_strategy(mut self, strategy: LoadBalanceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Fail on unknown names instead of falling back to the primary.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn context(&self) -> &DynamicDatasourceContextHolder {
        &self.context
    }

    /// Connections bound to open distributed transactions. Entries are only
    /// dropped by [`release_transaction`](Self::release_transaction).
    pub fn registry(&self) -> &ConnectionRegistry<D::Connection> {
        &self.registry
    }

    /// Drops every connection bound to `xid` once its transaction has
    /// completed, returning how many were released.
    pub fn release_transaction(&self, xid: &str) -> usize {
        let released = self.registry.release(xid);
        debug!(%xid, released, "released transaction connections");
        released
    }

    pub fn primary(&self) -> &str {
        self.context.topology().primary()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Registered datasource names, sorted.
    pub fn data_source_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.data_sources.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }

    /// Group names, sorted.
    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.groups.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }

    /// Registers `source` as `name`, closing the datasource it replaces.
    ///
    /// A name of the form `group_member` also joins `group`.
    pub fn add_data_source(&self, name: impl Into<String>, source: D) {
        let name = name.into();
        let source = Arc::new(source);
        let _writes = self.writes.lock();

        if let Some(replaced) = self.data_sources.insert(name.clone(), Arc::clone(&source)) {
            replaced.close();
            info!(datasource = %name, "replaced datasource");
        }
        if let Some(group) = group_of(&name) {
            self.groups
                .entry(group.to_owned())
                .or_insert_with(|| GroupDataSource::new(group, self.strategy))
                .add(name.clone(), source);
        }
        info!(datasource = %name, "added datasource");
    }

    /// Removes and closes the datasource called `name`.
    ///
    /// Returns whether anything was removed.
    ///
    /// # Errors
    /// - [`Error::RemovePrimary`] when `name` is the primary
    pub fn remove_data_source(&self, name: &str) -> Result<bool> {
        if name == self.primary() {
            return Err(Error::RemovePrimary(name.to_owned()));
        }
        let _writes = self.writes.lock();

        let Some((_, removed)) = self.data_sources.remove(name) else {
            warn!(datasource = name, "could not remove unknown datasource");
            return Ok(false);
        };
        removed.close();
        if let Some(group) = group_of(name) {
            let drained = self.groups.get(group).is_some_and(|members| {
                members.remove(name);
                members.is_empty()
            });
            if drained {
                self.groups.remove(group);
            }
        }
        info!(datasource = name, "removed datasource");
        Ok(true)
    }

    /// Closes and forgets every datasource.
    pub fn close_all(&self) {
        let _writes = self.writes.lock();
        self.groups.clear();
        let names: Vec<_> = self.data_sources.iter().map(|e| e.key().clone()).collect();
        for name in names {
            if let Some((_, source)) = self.data_sources.remove(&name) {
                source.close();
                debug!(datasource = %name, "closed datasource");
            }
        }
        info!("closed all datasources");
    }

    /// The datasource the calling thread is routed to.
    pub fn determine_data_source(&self) -> Result<Arc<D>> {
        let target = self.context.peek();
        self.get_data_source(target.as_ref().map(CurrentDatasourceInfo::datasource))
    }

    /// Resolves `name` to a datasource; `None` or blank means the primary.
    ///
    /// # Errors
    /// - [`Error::DatasourceNotFound`] for an unknown name in strict mode
    /// - [`Error::PrimaryNotFound`] when falling back to a missing primary
    pub fn get_data_source(&self, name: Option<&str>) -> Result<Arc<D>> {
        let Some(name) = name.filter(|name| !name.trim().is_empty()) else {
            return self.primary_data_source();
        };
        if let Some((member, source)) = self.groups.get(name).and_then(|group| group.select()) {
            debug!(group = name, datasource = %member, "selected group member");
            return Ok(source);
        }
        if let Some(source) = self.data_sources.get(name) {
            debug!(datasource = name, "selected datasource");
            return Ok(Arc::clone(source.value()));
        }
        if self.strict {
            return Err(Error::DatasourceNotFound(name.to_owned()));
        }
        debug!(datasource = name, "unknown datasource, using primary");
        self.primary_data_source()
    }

    /// A connection routed by the calling thread's context.
    pub fn connection(&self) -> Result<Arc<D::Connection>> {
        self.acquire(|source| source.connection())
    }

    pub fn connection_with_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Arc<D::Connection>> {
        self.acquire(|source| source.connection_with_credentials(username, password))
    }

    fn primary_data_source(&self) -> Result<Arc<D>> {
        let primary = self.primary();
        if let Some(source) = self.data_sources.get(primary) {
            return Ok(Arc::clone(source.value()));
        }
        self.groups
            .get(primary)
            .and_then(|group| group.select())
            .map(|(_, source)| source)
            .ok_or_else(|| Error::PrimaryNotFound(primary.to_owned()))
    }

    fn acquire(
        &self,
        open: impl Fn(&D) -> Result<D::Connection, BoxError>,
    ) -> Result<Arc<D::Connection>> {
        let target = self.context.peek();
        let xid = self.context.transactions().current_xid();
        let routed = target
            .as_ref()
            .map_or_else(|| self.primary(), CurrentDatasourceInfo::datasource);

        let connection = match (xid, &target) {
            (Some(xid), Some(_)) => match self.registry.get(&xid, routed) {
                Some(bound) => {
                    debug!(%xid, datasource = routed, "reusing transaction connection");
                    bound
                }
                None => {
                    let opened = Arc::new(self.open(routed, &open)?);
                    self.registry.put(xid, routed, Arc::clone(&opened));
                    opened
                }
            },
            _ => Arc::new(self.open(routed, &open)?),
        };

        let catalog = target
            .as_ref()
            .and_then(CurrentDatasourceInfo::catalog)
            .or_else(|| self.context.topology().default_catalog(routed));
        if let Some(catalog) = catalog {
            connection
                .set_catalog(catalog)
                .map_err(|source| Error::Catalog {
                    datasource: routed.to_owned(),
                    catalog: catalog.to_owned(),
                    source,
                })?;
        }
        Ok(connection)
    }

    fn open(
        &self,
        routed: &str,
        open: &impl Fn(&D) -> Result<D::Connection, BoxError>,
    ) -> Result<D::Connection> {
        let source = self.get_data_source(Some(routed))?;
        open(&source).map_err(|source| Error::Connection {
            datasource: routed.to_owned(),
            source,
        })
    }
}

impl<D: DataSource> fmt::Debug for RoutingDataSource<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingDataSource")
            .field("primary", &self.primary())
            .field("data_sources", &self.data_source_names())
            .field("groups", &self.group_names())
            .field("strategy", &self.strategy)
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}
