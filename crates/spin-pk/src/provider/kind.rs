use core::{fmt, str::FromStr};

use crate::{
    EnvSource, Error, Result,
    provider::{
        ExternalMachineIdProvider, IpConfigurableMachineIdProvider, MachineIdProvider,
        PropertyMachineIdProvider,
    },
};

/// The closed set of machine-id strategies, selectable by name from
/// configuration.
///
/// ```
/// use spin_pk::ProviderKind;
///
/// assert_eq!("property".parse::<ProviderKind>().unwrap(), ProviderKind::Property);
/// assert_eq!("ip".parse::<ProviderKind>().unwrap(), ProviderKind::IpConfigurable);
/// assert!("zookeeper".parse::<ProviderKind>().is_err());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProviderKind {
    /// [`PropertyMachineIdProvider`]
    Property,
    /// [`ExternalMachineIdProvider`]
    #[default]
    External,
    /// [`IpConfigurableMachineIdProvider`]
    IpConfigurable,
}

/// A provider chosen at runtime.
pub type BoxedMachineIdProvider = Box<dyn MachineIdProvider + Send + Sync>;

impl ProviderKind {
    /// Instantiates and initializes the provider this kind names.
    ///
    /// # Errors
    ///
    /// Propagates the provider's [`MachineIdProvider::init`] error.
    pub fn build<E>(self, init_params: &str, env: E) -> Result<BoxedMachineIdProvider>
    where
        E: EnvSource + Send + Sync + 'static,
    {
        let mut provider: BoxedMachineIdProvider = match self {
            Self::Property => Box::new(PropertyMachineIdProvider::with_env(env)),
            Self::External => Box::new(ExternalMachineIdProvider::with_env(env)),
            Self::IpConfigurable => Box::new(IpConfigurableMachineIdProvider::with_env(env)),
        };
        provider.init(init_params)?;
        Ok(provider)
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "property" => Ok(Self::Property),
            "external" => Ok(Self::External),
            "ip" | "ip-configurable" => Ok(Self::IpConfigurable),
            _ => Err(Error::UnknownProvider(s.to_owned())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Property => "property",
            Self::External => "external",
            Self::IpConfigurable => "ip-configurable",
        })
    }
}
