use crate::{EnvSource, Error, MACHINE_ID_OVERRIDE, Result};

/// The only key recognized in init params and properties files.
pub const MACHINE_ID_KEY: &str = "machineId";

/// Largest machine id representable in the 10-bit machine field.
pub const MAX_MACHINE_ID: u64 = (1 << 10) - 1;

/// A pluggable strategy for resolving this node's machine id.
///
/// Implementations are initialized once with a free-form `key=value` string
/// and then queried by the generator. Resolution must be deterministic: two
/// nodes resolving the same id would generate colliding ids.
///
/// # Example
///
/// ```
/// use spin_pk::{MachineIdProvider, MapEnv, PropertyMachineIdProvider};
///
/// let mut provider = PropertyMachineIdProvider::with_env(MapEnv::default());
/// provider.init("machineId=42").unwrap();
/// assert_eq!(provider.machine_id().unwrap(), 42);
///
/// // An environment override wins over the provider's own resolution.
/// let mut provider =
///     PropertyMachineIdProvider::with_env(MapEnv::from_iter([("MACHINE_ID", "5")]));
/// provider.init("machineId=42").unwrap();
/// assert_eq!(provider.resolve_machine_id().unwrap(), 5);
/// ```
pub trait MachineIdProvider {
    /// Configures the provider from its init params.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the params are malformed or name a
    /// machine id outside `[0, 1023]`.
    fn init(&mut self, init_params: &str) -> Result<()>;

    /// Returns the machine id resolved by this provider alone.
    ///
    /// # Errors
    ///
    /// Returns an error when the provider cannot produce an id, e.g. the local
    /// IP is not mapped.
    fn machine_id(&self) -> Result<u64>;

    /// The environment this provider consults.
    fn env(&self) -> &dyn EnvSource;

    /// Returns the `MACHINE_ID` override when it is set and non-negative,
    /// otherwise delegates to [`MachineIdProvider::machine_id`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMachineId`] when the override is not a number or
    /// is larger than [`MAX_MACHINE_ID`], and otherwise whatever
    /// [`MachineIdProvider::machine_id`] returns.
    fn resolve_machine_id(&self) -> Result<u64> {
        match override_machine_id(self.env())? {
            Some(id) => Ok(id),
            None => self.machine_id(),
        }
    }
}

impl<P: MachineIdProvider + ?Sized> MachineIdProvider for Box<P> {
    fn init(&mut self, init_params: &str) -> Result<()> {
        (**self).init(init_params)
    }

    fn machine_id(&self) -> Result<u64> {
        (**self).machine_id()
    }

    fn env(&self) -> &dyn EnvSource {
        (**self).env()
    }

    fn resolve_machine_id(&self) -> Result<u64> {
        (**self).resolve_machine_id()
    }
}

/// Reads the `MACHINE_ID` override. Blank and negative values count as unset.
pub(crate) fn override_machine_id(env: &dyn EnvSource) -> Result<Option<u64>> {
    let Some(raw) = env.var(MACHINE_ID_OVERRIDE) else {
        return Ok(None);
    };
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<i64>() {
        Ok(id) if id < 0 => Ok(None),
        Ok(_) => parse_machine_id(value, MACHINE_ID_OVERRIDE).map(Some),
        Err(_) => Err(invalid(MACHINE_ID_OVERRIDE, value)),
    }
}

/// Parses a machine id, rejecting anything that is not a number in
/// `[0, MAX_MACHINE_ID]`.
pub(crate) fn parse_machine_id(value: &str, source_name: &str) -> Result<u64> {
    let value = value.trim();
    match value.parse::<u64>() {
        Ok(id) if id <= MAX_MACHINE_ID => Ok(id),
        _ => Err(invalid(source_name, value)),
    }
}

fn invalid(source_name: &str, value: &str) -> Error {
    Error::InvalidMachineId {
        source_name: source_name.to_owned(),
        value: value.to_owned(),
    }
}
