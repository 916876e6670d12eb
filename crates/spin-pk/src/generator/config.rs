use crate::{GenMethod, IdType, ProviderKind};

/// Everything needed to stand up a [`crate::DistributedIdGenerator`].
///
/// `init_params` is handed verbatim to the provider named by `provider`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdGeneratorConfig {
    pub provider: ProviderKind,
    pub init_params: String,
    pub id_type: IdType,
    pub gen_method: GenMethod,
    /// Single-bit layout version.
    pub version: u64,
}

impl IdGeneratorConfig {
    pub fn new(provider: ProviderKind, init_params: impl Into<String>) -> Self {
        Self {
            provider,
            init_params: init_params.into(),
            ..Self::default()
        }
    }

    pub fn with_id_type(mut self, id_type: IdType) -> Self {
        self.id_type = id_type;
        self
    }

    pub fn with_gen_method(mut self, gen_method: GenMethod) -> Self {
        self.gen_method = gen_method;
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }
}
