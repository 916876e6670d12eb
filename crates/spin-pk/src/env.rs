use std::collections::HashMap;

/// Name of the variable that overrides every provider's own resolution.
pub const MACHINE_ID_OVERRIDE: &str = "MACHINE_ID";

/// Lower-camel alias consulted by [`crate::ExternalMachineIdProvider`] before
/// [`MACHINE_ID_OVERRIDE`].
pub const MACHINE_ID_ENV: &str = "machineId";

/// A source of environment variables.
///
/// Machine-id resolution reads the environment through this trait so that the
/// resolution order can be exercised without touching the process
/// environment.
///
/// # Example
///
/// ```
/// use spin_pk::{EnvSource, MapEnv};
///
/// let env = MapEnv::from_iter([("MACHINE_ID", "5")]);
/// assert_eq!(env.var("MACHINE_ID").as_deref(), Some("5"));
/// assert_eq!(env.var("machineId"), None);
/// ```
pub trait EnvSource {
    /// Returns the value of `key`, or `None` when it is unset or not unicode.
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl EnvSource for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// An in-memory environment.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

impl<E: EnvSource + ?Sized> EnvSource for &E {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}

impl<E: EnvSource + ?Sized> EnvSource for std::sync::Arc<E> {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}
