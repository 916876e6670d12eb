use core::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use portable_atomic::{AtomicU64, Ordering};
use tracing::{error, info, warn};

use super::stack;
use crate::{
    CurrentDatasourceInfo, DatasourceInterceptor, DatasourceScope, DatasourceTopology, Error,
    NoTransaction, Result, TransactionProbe,
};

static NEXT_HOLDER_ID: AtomicU64 = AtomicU64::new(0);

/// Owns the per-thread datasource stack and the transition hook.
///
/// The holder itself is shared freely between threads; each thread sees only
/// the entries it pushed. An empty stack means "use the primary datasource",
/// and a thread whose stack drains to empty keeps no state at all.
///
/// Every successful [`push`](Self::push) must be balanced by a
/// [`poll`](Self::poll) on the same thread. [`enter`](Self::enter) does the
/// balancing with a guard.
pub struct DynamicDatasourceContextHolder {
    id: u64,
    topology: DatasourceTopology,
    interceptor: RwLock<Option<Arc<dyn DatasourceInterceptor>>>,
    transactions: Arc<dyn TransactionProbe>,
}

impl DynamicDatasourceContextHolder {
    pub fn new(topology: DatasourceTopology) -> Self {
        Self {
            id: NEXT_HOLDER_ID.fetch_add(1, Ordering::Relaxed),
            topology,
            interceptor: RwLock::new(None),
            transactions: Arc::new(NoTransaction),
        }
    }

    pub fn with_transaction_probe(mut self, probe: impl TransactionProbe + 'static) -> Self {
        self.transactions = Arc::new(probe);
        self
    }

    pub fn with_interceptor(self, interceptor: impl DatasourceInterceptor + 'static) -> Self {
        self.register_interceptor(interceptor);
        self
    }

    /// Installs the hook consulted on every transition, replacing any previous
    /// one.
    pub fn register_interceptor(&self, interceptor: impl DatasourceInterceptor + 'static) {
        *self.interceptor.write() = Some(Arc::new(interceptor));
    }

    pub fn topology(&self) -> &DatasourceTopology {
        &self.topology
    }

    pub fn transactions(&self) -> &dyn TransactionProbe {
        self.transactions.as_ref()
    }

    /// Switches the calling thread to `datasource`, keeping the default
    /// catalog.
    pub fn push(&self, datasource: &str) -> Result<()> {
        self.push_info(CurrentDatasourceInfo::new(datasource))
    }

    /// Switches the calling thread to `target`.
    ///
    /// # Errors
    /// - [`Error::EmptyDatasourceName`] for a blank datasource name
    /// - [`Error::SwitchRejected`] when the interceptor vetoes; the stack is
    ///   left as it was before the call
    pub fn push_info(&self, target: CurrentDatasourceInfo) -> Result<()> {
        if target.datasource().trim().is_empty() {
            return Err(Error::EmptyDatasourceName);
        }
        let current = self.current();
        stack::push(self.id, target.clone());

        match self.interceptor() {
            Some(interceptor) => {
                let rollback = Rollback::arm(|| {
                    stack::pop(self.id);
                });
                self.consult(interceptor.as_ref(), &current, &target)?;
                rollback.disarm();
            }
            None => {
                if current.datasource() != target.datasource()
                    && self.transactions.is_actual_transaction_active()
                {
                    warn!(
                        from = %current,
                        to = %target,
                        "switching datasource inside an active transaction may break its atomicity"
                    );
                }
            }
        }

        info!("switch datasource to {target}");
        Ok(())
    }

    /// The calling thread's routing target, or `None` for the primary.
    pub fn peek(&self) -> Option<CurrentDatasourceInfo> {
        stack::peek(self.id)
    }

    /// Pops the calling thread's routing target and returns it.
    ///
    /// # Errors
    /// - [`Error::EmptyStack`] when nothing was pushed on this thread
    /// - [`Error::SwitchRejected`] when the interceptor vetoes switching back;
    ///   the popped entry is restored
    pub fn poll(&self) -> Result<CurrentDatasourceInfo> {
        let popped = stack::pop(self.id).ok_or(Error::EmptyStack)?;
        let current = self.current();

        if let Some(interceptor) = self.interceptor() {
            let rollback = Rollback::arm(|| stack::push(self.id, popped.clone()));
            self.consult(interceptor.as_ref(), &popped, &current)?;
            rollback.disarm();
        }

        info!("switch back to datasource {current}");
        Ok(popped)
    }

    /// Drops the calling thread's whole stack, returning how many entries it
    /// held. No interceptor is consulted.
    pub fn clear(&self) -> usize {
        let dropped = stack::remove(self.id);
        if dropped > 0 {
            warn!(dropped, "cleared unbalanced datasource stack");
        }
        dropped
    }

    /// Pushes `datasource` and polls it again when the returned scope drops.
    pub fn enter(&self, datasource: &str) -> Result<DatasourceScope<'_>> {
        self.enter_info(CurrentDatasourceInfo::new(datasource))
    }

    pub fn enter_info(&self, target: CurrentDatasourceInfo) -> Result<DatasourceScope<'_>> {
        self.push_info(target)?;
        Ok(DatasourceScope::new(self))
    }

    /// Runs `f` routed to `datasource`.
    pub fn with_datasource<R>(&self, datasource: &str, f: impl FnOnce() -> R) -> Result<R> {
        let scope = self.enter(datasource)?;
        let out = f();
        scope.exit()?;
        Ok(out)
    }

    /// Number of entries on the calling thread's stack.
    pub fn depth(&self) -> usize {
        stack::depth(self.id)
    }

    /// Whether the calling thread holds any stack storage for this holder.
    pub fn has_thread_state(&self) -> bool {
        stack::contains(self.id)
    }

    fn current(&self) -> CurrentDatasourceInfo {
        self.peek().unwrap_or_else(|| self.topology.primary_info())
    }

    fn interceptor(&self) -> Option<Arc<dyn DatasourceInterceptor>> {
        self.interceptor.read().clone()
    }

    fn consult(
        &self,
        interceptor: &dyn DatasourceInterceptor,
        from: &CurrentDatasourceInfo,
        to: &CurrentDatasourceInfo,
    ) -> Result<()> {
        let reason = match interceptor.handle(from, to) {
            Ok(true) => return Ok(()),
            Ok(false) => None,
            Err(e) => Some(e),
        };
        error!(%from, %to, "datasource switch rejected by interceptor");
        Err(Error::SwitchRejected {
            from: from.clone(),
            to: to.clone(),
            reason,
        })
    }
}

impl Default for DynamicDatasourceContextHolder {
    fn default() -> Self {
        Self::new(DatasourceTopology::default())
    }
}

impl Drop for DynamicDatasourceContextHolder {
    fn drop(&mut self) {
        stack::remove(self.id);
    }
}

impl fmt::Debug for DynamicDatasourceContextHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicDatasourceContextHolder")
            .field("id", &self.id)
            .field("topology", &self.topology)
            .field("interceptor", &self.interceptor.read().is_some())
            .finish_non_exhaustive()
    }
}

/// Undoes a stack mutation unless disarmed, including while unwinding out of
/// a panicking interceptor.
struct Rollback<F: FnOnce()> {
    undo: Option<F>,
}

impl<F: FnOnce()> Rollback<F> {
    fn arm(undo: F) -> Self {
        Self { undo: Some(undo) }
    }

    fn disarm(mut self) {
        self.undo = None;
    }
}

impl<F: FnOnce()> Drop for Rollback<F> {
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            undo();
        }
    }
}
