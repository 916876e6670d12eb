use core::fmt;

use crate::{Error, Result};

/// Time granularity of a distributed id, which also selects its bit layout.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum IdType {
    /// Second granularity with a 20-bit sequence: about one million ids per
    /// second per machine, and 30 bits of time (~34 years).
    #[default]
    MaxPeak,
    /// Millisecond granularity with a 10-bit sequence: 1024 ids per
    /// millisecond per machine, and 40 bits of time (~34 years).
    MinGranularity,
}

impl IdType {
    /// Value stored in the type bit.
    pub const fn value(self) -> u64 {
        match self {
            Self::MaxPeak => 0,
            Self::MinGranularity => 1,
        }
    }

    pub const fn meta(self) -> &'static IdMeta {
        match self {
            Self::MaxPeak => &IdMeta::MAX_PEAK,
            Self::MinGranularity => &IdMeta::MIN_GRANULARITY,
        }
    }

    /// Milliseconds per time unit.
    pub const fn unit_millis(self) -> u64 {
        match self {
            Self::MaxPeak => 1000,
            Self::MinGranularity => 1,
        }
    }

    pub const fn unit_name(self) -> &'static str {
        match self {
            Self::MaxPeak => "second",
            Self::MinGranularity => "millisecond",
        }
    }
}

impl TryFrom<u64> for IdType {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self> {
        match value {
            0 => Ok(Self::MaxPeak),
            1 => Ok(Self::MinGranularity),
            _ => Err(Error::UnknownVariant {
                kind: "id type",
                value,
            }),
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MaxPeak => "max-peak",
            Self::MinGranularity => "min-granularity",
        })
    }
}

/// How the id was produced. Stored in a 2-bit field.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum GenMethod {
    /// Generated in-process.
    #[default]
    Embedded,
    /// Generated by a central id service.
    CentralServer,
    /// Generated behind a REST endpoint.
    RestApi,
}

impl GenMethod {
    pub const fn value(self) -> u64 {
        match self {
            Self::Embedded => 0,
            Self::CentralServer => 1,
            Self::RestApi => 2,
        }
    }
}

impl TryFrom<u64> for GenMethod {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self> {
        match value {
            0 => Ok(Self::Embedded),
            1 => Ok(Self::CentralServer),
            2 => Ok(Self::RestApi),
            _ => Err(Error::UnknownVariant {
                kind: "generation method",
                value,
            }),
        }
    }
}

/// Bit layout of a distributed id, least significant field first.
///
/// ```text
///  MaxPeak:         | version (1) | type (1) | method (2) | time (30) | seq (20) | machine (10) |
///  MinGranularity:  | version (1) | type (1) | method (2) | time (40) | seq (10) | machine (10) |
///                   |<-- MSB ------------------------- 64 bits ------------------------- LSB -->|
/// ```
///
/// The version and type bits sit at the same position in both layouts, so
/// the layout of any raw id can be read from the id itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdMeta {
    pub machine_bits: u8,
    pub seq_bits: u8,
    pub time_bits: u8,
    pub gen_method_bits: u8,
    pub type_bits: u8,
    pub version_bits: u8,
}

impl IdMeta {
    pub const MAX_PEAK: Self = Self {
        machine_bits: 10,
        seq_bits: 20,
        time_bits: 30,
        gen_method_bits: 2,
        type_bits: 1,
        version_bits: 1,
    };

    pub const MIN_GRANULARITY: Self = Self {
        machine_bits: 10,
        seq_bits: 10,
        time_bits: 40,
        gen_method_bits: 2,
        type_bits: 1,
        version_bits: 1,
    };

    const fn mask(bits: u8) -> u64 {
        (1 << bits) - 1
    }

    pub const fn machine_mask(&self) -> u64 {
        Self::mask(self.machine_bits)
    }

    pub const fn seq_start(&self) -> u8 {
        self.machine_bits
    }

    pub const fn seq_mask(&self) -> u64 {
        Self::mask(self.seq_bits)
    }

    pub const fn time_start(&self) -> u8 {
        self.seq_start() + self.seq_bits
    }

    pub const fn time_mask(&self) -> u64 {
        Self::mask(self.time_bits)
    }

    pub const fn gen_method_start(&self) -> u8 {
        self.time_start() + self.time_bits
    }

    pub const fn gen_method_mask(&self) -> u64 {
        Self::mask(self.gen_method_bits)
    }

    pub const fn type_start(&self) -> u8 {
        self.gen_method_start() + self.gen_method_bits
    }

    pub const fn type_mask(&self) -> u64 {
        Self::mask(self.type_bits)
    }

    pub const fn version_start(&self) -> u8 {
        self.type_start() + self.type_bits
    }

    pub const fn version_mask(&self) -> u64 {
        Self::mask(self.version_bits)
    }

    pub const fn total_bits(&self) -> u8 {
        self.version_start() + self.version_bits
    }
}

const _: () = assert!(IdMeta::MAX_PEAK.total_bits() == 64);
const _: () = assert!(IdMeta::MIN_GRANULARITY.total_bits() == 64);
const _: () = assert!(IdMeta::MAX_PEAK.type_start() == IdMeta::MIN_GRANULARITY.type_start());
