//! Distributed primary key generation.
//!
//! A [`DistributedIdGenerator`] packs a timestamp, a per-time-unit sequence and
//! a 10-bit machine id into a single `u64`. The machine id is resolved once at
//! startup by one of the [`MachineIdProvider`] strategies:
//!
//! - [`PropertyMachineIdProvider`]: `machineId=<n>` given inline.
//! - [`ExternalMachineIdProvider`]: properties files, then the environment.
//! - [`IpConfigurableMachineIdProvider`]: position of the local IP in a list.
//!
//! Any provider is short-circuited by a `MACHINE_ID` environment override.
//!
//! ```
//! use spin_pk::{
//!     Backoff, DistributedIdGenerator, IdGeneratorConfig, IdType, MapEnv, ProviderKind,
//!     SystemClock,
//! };
//!
//! let config = IdGeneratorConfig::new(ProviderKind::Property, "machineId=7")
//!     .with_id_type(IdType::MinGranularity);
//! let generator = DistributedIdGenerator::from_config(&config, &MapEnv::default(), SystemClock)
//!     .unwrap();
//!
//! let raw = generator.next_id(Backoff::Yield).unwrap();
//! assert_eq!(generator.expand_id(raw).unwrap().machine(), 7);
//! ```

mod env;
mod error;
mod generator;
mod id;
mod properties;
mod provider;
mod time;

pub use crate::env::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::properties::*;
pub use crate::provider::*;
pub use crate::time::*;
