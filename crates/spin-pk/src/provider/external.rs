use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    EnvSource, Error, MACHINE_ID_ENV, MACHINE_ID_OVERRIDE, Properties, Result, SystemEnv,
    provider::{MACHINE_ID_KEY, MachineIdProvider, parse_machine_id},
};

/// File name of the bundled resource consulted after an explicit config file.
pub const IDGEN_PROPERTIES: &str = "idgen.properties";

/// Well-known per-host settings file.
#[cfg(windows)]
pub const SERVER_PROPERTIES: &str = r"C:\opt\settings\server.properties";
/// Well-known per-host settings file.
#[cfg(not(windows))]
pub const SERVER_PROPERTIES: &str = "/opt/settings/server.properties";

const CONFIG_FILE_KEY: &str = "configFile";

/// Resolves the machine id from files and the environment.
///
/// Sources are tried in order and the first one that yields a value wins:
///
/// 1. the file named by `configFile=<path>` in the init params (must exist),
/// 2. [`IDGEN_PROPERTIES`] in the resource directories (the working directory,
///    then the executable's directory),
/// 3. [`SERVER_PROPERTIES`],
/// 4. the `machineId` and then `MACHINE_ID` environment variables.
///
/// A value that is present but malformed stops resolution with an error at
/// any stage. When every source comes up empty the id falls back to `0`,
/// which can collide with other nodes configured the same way; the fallback is
/// logged as a warning.
#[derive(Debug, Clone)]
pub struct ExternalMachineIdProvider<E = SystemEnv> {
    machine_id: Option<u64>,
    resource_dirs: Vec<PathBuf>,
    server_properties: PathBuf,
    env: E,
}

impl ExternalMachineIdProvider {
    pub fn new() -> Self {
        Self::with_env(SystemEnv)
    }
}

impl Default for ExternalMachineIdProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EnvSource> ExternalMachineIdProvider<E> {
    pub fn with_env(env: E) -> Self {
        Self {
            machine_id: None,
            resource_dirs: default_resource_dirs(),
            server_properties: PathBuf::from(SERVER_PROPERTIES),
            env,
        }
    }

    /// Replaces the directories searched for [`IDGEN_PROPERTIES`].
    pub fn with_resource_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.resource_dirs = dirs.into_iter().collect();
        self
    }

    /// Replaces the location of the per-host settings file.
    pub fn with_server_properties(mut self, path: impl Into<PathBuf>) -> Self {
        self.server_properties = path.into();
        self
    }

    fn from_explicit_file(&self, init_params: &str) -> Result<Option<u64>> {
        let init_params = init_params.trim();
        if init_params.is_empty() {
            return Ok(None);
        }

        let illegal = || Error::InvalidInitParams {
            provider: "ExternalMachineIdProvider",
            params: init_params.to_owned(),
        };
        let (key, path) = init_params.split_once('=').ok_or_else(illegal)?;
        if key.trim() != CONFIG_FILE_KEY || path.contains('=') {
            return Err(illegal());
        }
        let path = Path::new(path.trim());
        if path.as_os_str().is_empty() {
            return Err(Error::ConfigFile {
                path: path.to_path_buf(),
                reason: "the configuration file name is empty".to_owned(),
            });
        }

        let properties = Properties::load(path).map_err(|e| Error::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        machine_id_from(&properties, path)
    }

    fn from_optional_file(path: &Path) -> Result<Option<u64>> {
        match Properties::load(path) {
            Ok(properties) => machine_id_from(&properties, path),
            Err(e) => {
                debug!("skipping machine id file {}: {e}", path.display());
                Ok(None)
            }
        }
    }

    fn from_env(&self) -> Result<Option<u64>> {
        for key in [MACHINE_ID_ENV, MACHINE_ID_OVERRIDE] {
            if let Some(value) = self.env.var(key).filter(|v| !v.trim().is_empty()) {
                return parse_machine_id(&value, key).map(Some);
            }
        }
        Ok(None)
    }

    fn resolve(&self, init_params: &str) -> Result<u64> {
        if let Some(id) = self.from_explicit_file(init_params)? {
            return Ok(id);
        }
        for dir in &self.resource_dirs {
            if let Some(id) = Self::from_optional_file(&dir.join(IDGEN_PROPERTIES))? {
                return Ok(id);
            }
        }
        if let Some(id) = Self::from_optional_file(&self.server_properties)? {
            return Ok(id);
        }
        if let Some(id) = self.from_env()? {
            return Ok(id);
        }

        warn!(
            "no machine id configured in any file or environment variable, defaulting to 0; \
             nodes sharing this default will generate colliding ids"
        );
        Ok(0)
    }
}

impl<E: EnvSource> MachineIdProvider for ExternalMachineIdProvider<E> {
    fn init(&mut self, init_params: &str) -> Result<()> {
        self.machine_id = Some(self.resolve(init_params)?);
        Ok(())
    }

    fn machine_id(&self) -> Result<u64> {
        self.machine_id.ok_or(Error::Uninitialized {
            provider: "ExternalMachineIdProvider",
        })
    }

    fn env(&self) -> &dyn EnvSource {
        &self.env
    }
}

fn machine_id_from(properties: &Properties, path: &Path) -> Result<Option<u64>> {
    match properties.get(MACHINE_ID_KEY) {
        Some(value) if !value.is_empty() => {
            parse_machine_id(value, &path.display().to_string()).map(Some)
        }
        _ => Ok(None),
    }
}

fn default_resource_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::with_capacity(2);
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs
}
