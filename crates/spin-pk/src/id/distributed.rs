use core::fmt;

use crate::{GenMethod, IdMeta, IdType, Result};

/// The unpacked fields of a distributed id.
///
/// # Example
///
/// ```
/// use spin_pk::{DistributedId, GenMethod, IdType};
///
/// let id = DistributedId::new(IdType::MinGranularity, 12_345, 7, 42);
/// let raw = id.to_raw();
///
/// let back = DistributedId::from_raw(raw).unwrap();
/// assert_eq!(back, id);
/// assert_eq!(back.time(), 12_345);
/// assert_eq!(back.seq(), 7);
/// assert_eq!(back.machine(), 42);
/// assert_eq!(back.gen_method(), GenMethod::Embedded);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DistributedId {
    machine: u64,
    seq: u64,
    time: u64,
    gen_method: GenMethod,
    id_type: IdType,
    version: u64,
}

impl DistributedId {
    /// Creates an embedded, version 0 id. Fields wider than the layout allows
    /// are truncated when packed.
    pub const fn new(id_type: IdType, time: u64, seq: u64, machine: u64) -> Self {
        Self {
            machine,
            seq,
            time,
            gen_method: GenMethod::Embedded,
            id_type,
            version: 0,
        }
    }

    pub const fn with_gen_method(mut self, gen_method: GenMethod) -> Self {
        self.gen_method = gen_method;
        self
    }

    pub const fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub const fn machine(&self) -> u64 {
        self.machine
    }

    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Time units since [`crate::SPIN_EPOCH`], in the unit of [`Self::id_type`].
    pub const fn time(&self) -> u64 {
        self.time
    }

    pub const fn gen_method(&self) -> GenMethod {
        self.gen_method
    }

    pub const fn id_type(&self) -> IdType {
        self.id_type
    }

    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Packs the fields into a `u64` using the layout of [`Self::id_type`].
    pub const fn to_raw(&self) -> u64 {
        let meta = self.id_type.meta();
        (self.machine & meta.machine_mask())
            | ((self.seq & meta.seq_mask()) << meta.seq_start())
            | ((self.time & meta.time_mask()) << meta.time_start())
            | ((self.gen_method.value() & meta.gen_method_mask()) << meta.gen_method_start())
            | ((self.id_type.value() & meta.type_mask()) << meta.type_start())
            | ((self.version & meta.version_mask()) << meta.version_start())
    }

    /// Unpacks a raw id, reading its layout from the embedded type bit.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownVariant`] if the generation method
    /// field holds the unassigned value `3`.
    pub fn from_raw(raw: u64) -> Result<Self> {
        // Both layouts agree on where the type bit lives.
        let probe = IdMeta::MAX_PEAK;
        let id_type = IdType::try_from((raw >> probe.type_start()) & probe.type_mask())?;
        Self::from_raw_with(raw, id_type)
    }

    /// Unpacks a raw id using the layout of `id_type`, ignoring the type bit.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownVariant`] if the generation method
    /// field holds the unassigned value `3`.
    pub fn from_raw_with(raw: u64, id_type: IdType) -> Result<Self> {
        let meta = id_type.meta();
        Ok(Self {
            machine: raw & meta.machine_mask(),
            seq: (raw >> meta.seq_start()) & meta.seq_mask(),
            time: (raw >> meta.time_start()) & meta.time_mask(),
            gen_method: GenMethod::try_from(
                (raw >> meta.gen_method_start()) & meta.gen_method_mask(),
            )?,
            id_type,
            version: (raw >> meta.version_start()) & meta.version_mask(),
        })
    }
}

impl fmt::Display for DistributedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[machine={}, seq={}, time={}, method={:?}, type={}, version={}]",
            self.machine, self.seq, self.time, self.gen_method, self.id_type, self.version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_peak_layout_places_fields_lsb_first() {
        let id = DistributedId::new(IdType::MaxPeak, 1, 1, 1);
        assert_eq!(id.to_raw(), 1 | (1 << 10) | (1 << 30));
    }

    #[test]
    fn min_granularity_sets_type_bit() {
        let id = DistributedId::new(IdType::MinGranularity, 0, 0, 0);
        assert_eq!(id.to_raw(), 1 << 62);
        assert_eq!(
            DistributedId::from_raw(id.to_raw()).unwrap().id_type(),
            IdType::MinGranularity
        );
    }

    #[test]
    fn extreme_fields_survive_packing() {
        let meta = IdType::MinGranularity.meta();
        let id = DistributedId::new(
            IdType::MinGranularity,
            meta.time_mask(),
            meta.seq_mask(),
            meta.machine_mask(),
        )
        .with_gen_method(GenMethod::RestApi)
        .with_version(1);
        assert_eq!(DistributedId::from_raw(id.to_raw()).unwrap(), id);
    }

    #[test]
    fn oversized_fields_are_truncated_not_spilled() {
        let id = DistributedId::new(IdType::MaxPeak, 0, 0, 1024);
        assert_eq!(id.to_raw(), 0);
    }

    #[test]
    fn later_time_sorts_higher_for_the_same_machine() {
        let earlier = DistributedId::new(IdType::MaxPeak, 10, 999, 5).to_raw();
        let later = DistributedId::new(IdType::MaxPeak, 11, 0, 5).to_raw();
        assert!(later > earlier);
    }

    #[test]
    fn unassigned_gen_method_is_rejected() {
        let raw = 3_u64 << IdType::MaxPeak.meta().gen_method_start();
        assert!(DistributedId::from_raw(raw).is_err());
    }
}
