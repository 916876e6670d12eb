use crate::{
    EnvSource, Error, Result, SystemEnv,
    provider::{MACHINE_ID_KEY, MachineIdProvider, parse_machine_id},
};

/// Resolves the machine id from an inline `machineId=<n>` init param.
///
/// Fails fast on anything else: a different key, extra `=` signs, a
/// non-numeric value or a value outside `[0, 1023]`. Nothing is clamped.
#[derive(Debug, Clone)]
pub struct PropertyMachineIdProvider<E = SystemEnv> {
    machine_id: Option<u64>,
    env: E,
}

impl PropertyMachineIdProvider {
    pub fn new() -> Self {
        Self::with_env(SystemEnv)
    }
}

impl Default for PropertyMachineIdProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EnvSource> PropertyMachineIdProvider<E> {
    pub fn with_env(env: E) -> Self {
        Self {
            machine_id: None,
            env,
        }
    }
}

impl<E: EnvSource> MachineIdProvider for PropertyMachineIdProvider<E> {
    fn init(&mut self, init_params: &str) -> Result<()> {
        let illegal = || Error::InvalidInitParams {
            provider: "PropertyMachineIdProvider",
            params: init_params.to_owned(),
        };

        let mut parts = init_params.split('=');
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(illegal());
        };
        if key.trim() != MACHINE_ID_KEY {
            return Err(illegal());
        }

        self.machine_id = Some(parse_machine_id(value, "init params")?);
        Ok(())
    }

    fn machine_id(&self) -> Result<u64> {
        self.machine_id.ok_or(Error::Uninitialized {
            provider: "PropertyMachineIdProvider",
        })
    }

    fn env(&self) -> &dyn EnvSource {
        &self.env
    }
}
