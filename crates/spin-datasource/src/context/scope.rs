use tracing::error;

use crate::{CurrentDatasourceInfo, DynamicDatasourceContextHolder, Result};

/// A pushed datasource that is polled again when the scope ends.
///
/// Dropping the scope polls and logs any failure. Call
/// [`exit`](Self::exit) to see the failure instead.
#[must_use = "the datasource is switched back as soon as the scope is dropped"]
#[derive(Debug)]
pub struct DatasourceScope<'a> {
    holder: &'a DynamicDatasourceContextHolder,
    active: bool,
}

impl<'a> DatasourceScope<'a> {
    pub(crate) fn new(holder: &'a DynamicDatasourceContextHolder) -> Self {
        Self {
            holder,
            active: true,
        }
    }

    /// Polls the scope's entry, surfacing an interceptor veto.
    ///
    /// A vetoed exit leaves the entry in place; the scope is spent either way.
    pub fn exit(mut self) -> Result<CurrentDatasourceInfo> {
        self.active = false;
        self.holder.poll()
    }
}

impl Drop for DatasourceScope<'_> {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = self.holder.poll() {
                error!(error = %e, "failed to switch datasource back on scope exit");
            }
        }
    }
}
