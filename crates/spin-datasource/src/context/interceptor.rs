use crate::{BoxError, CurrentDatasourceInfo};

/// A hook consulted on every datasource transition.
///
/// Returning `Ok(false)` or an error vetoes the transition; the holder rolls
/// the stack back before reporting [`Error::SwitchRejected`].
///
/// [`Error::SwitchRejected`]: crate::Error::SwitchRejected
pub trait DatasourceInterceptor: Send + Sync {
    fn handle(
        &self,
        current: &CurrentDatasourceInfo,
        target: &CurrentDatasourceInfo,
    ) -> Result<bool, BoxError>;
}

impl<F> DatasourceInterceptor for F
where
    F: Fn(&CurrentDatasourceInfo, &CurrentDatasourceInfo) -> Result<bool, BoxError> + Send + Sync,
{
    fn handle(
        &self,
        current: &CurrentDatasourceInfo,
        target: &CurrentDatasourceInfo,
    ) -> Result<bool, BoxError> {
        self(current, target)
    }
}
