use core::{cmp::Ordering, time::Duration};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
#[cfg(feature = "instrument")]
use tracing::instrument;
use tracing::{info, trace};

use crate::{
    Backoff, DistributedId, EnvSource, Error, GenMethod, IdGenStatus, IdGeneratorConfig, IdType,
    MAX_MACHINE_ID, MachineIdProvider, Result, SPIN_EPOCH, TimeSource,
};

#[derive(Debug, Default)]
struct State {
    /// Time unit of the last issued id; `None` until the first id.
    last_time: Option<u64>,
    sequence: u64,
}

/// A lock-based distributed id generator.
///
/// Each id packs the current time unit (seconds or milliseconds since
/// [`SPIN_EPOCH`], per [`IdType`]), a sequence number within that unit and the
/// machine id. For a fixed machine id the ids are strictly increasing as long
/// as the clock does not step backwards; if it does, generation fails with
/// [`Error::ClockMovedBackwards`] instead of risking a duplicate.
///
/// The generator is `Sync`; share it behind an `Arc`.
///
/// ## See Also
/// - [`IdGeneratorConfig`] for resolving the machine id through a provider.
#[derive(Debug)]
pub struct DistributedIdGenerator<T: TimeSource> {
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<Mutex<State>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Mutex<State>,
    machine_id: u64,
    id_type: IdType,
    gen_method: GenMethod,
    version: u64,
    time: T,
}

impl<T: TimeSource> DistributedIdGenerator<T> {
    /// Creates an embedded, version 0 generator for an already known machine
    /// id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMachineId`] when `machine_id` does not fit in
    /// 10 bits.
    pub fn new(machine_id: u64, id_type: IdType, time: T) -> Result<Self> {
        if machine_id > MAX_MACHINE_ID {
            return Err(Error::InvalidMachineId {
                source_name: "generator".to_owned(),
                value: machine_id.to_string(),
            });
        }
        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(Mutex::new(State::default())),
            #[cfg(not(feature = "cache-padded"))]
            state: Mutex::new(State::default()),
            machine_id,
            id_type,
            gen_method: GenMethod::Embedded,
            version: 0,
            time,
        })
    }

    /// Resolves the machine id once through `provider` and creates a
    /// generator for it.
    ///
    /// # Errors
    ///
    /// Refuses to start when the provider cannot resolve a machine id.
    pub fn with_provider<P>(provider: &P, id_type: IdType, time: T) -> Result<Self>
    where
        P: MachineIdProvider + ?Sized,
    {
        let machine_id = provider.resolve_machine_id()?;
        info!("resolved machine id {machine_id} for {id_type} ids");
        Self::new(machine_id, id_type, time)
    }

    /// Builds the provider named in `config`, resolves the machine id and
    /// applies the remaining settings.
    ///
    /// # Errors
    ///
    /// Fails on any provider configuration error or an unresolvable machine
    /// id.
    pub fn from_config<E>(config: &IdGeneratorConfig, env: &E, time: T) -> Result<Self>
    where
        E: EnvSource + Clone + Send + Sync + 'static,
    {
        let provider = config.provider.build(&config.init_params, env.clone())?;
        Ok(Self::with_provider(&provider, config.id_type, time)?
            .with_gen_method(config.gen_method)
            .with_version(config.version))
    }

    pub fn with_gen_method(mut self, gen_method: GenMethod) -> Self {
        self.gen_method = gen_method;
        self
    }

    /// Sets the layout version bit. Only the lowest bit is kept.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version & self.id_type.meta().version_mask();
        self
    }

    pub fn machine_id(&self) -> u64 {
        self.machine_id
    }

    pub fn id_type(&self) -> IdType {
        self.id_type
    }

    pub fn gen_method(&self) -> GenMethod {
        self.gen_method
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Attempts to generate the next id without blocking.
    ///
    /// # Returns
    /// - `Ok(IdGenStatus::Ready { id })`: a new id is available
    /// - `Ok(IdGenStatus::Pending { yield_for })`: the sequence for the current
    ///   time unit is exhausted; retry after `yield_for` milliseconds
    ///
    /// # Errors
    /// - [`Error::ClockMovedBackwards`] when the clock reads an earlier time
    ///   unit than the last issued id.
    /// - [`Error::TimeOverflow`] when the time unit no longer fits the id's
    ///   time field.
    #[cfg_attr(feature = "instrument", instrument(level = "trace", skip(self)))]
    pub fn try_next_id(&self) -> Result<IdGenStatus> {
        let meta = self.id_type.meta();

        // Read the clock under the lock; an earlier reading may trail the
        // last issued id.
        let mut state = self.state.lock();
        let now_millis = self.time.current_millis();
        let now = self.time_unit(now_millis);
        if now > meta.time_mask() {
            return Err(self.cold_time_overflow(now, meta.time_mask()));
        }

        let Some(last) = state.last_time else {
            state.last_time = Some(now);
            state.sequence = 0;
            return Ok(self.ready(now, 0));
        };

        match now.cmp(&last) {
            Ordering::Equal => {
                if state.sequence < meta.seq_mask() {
                    state.sequence += 1;
                    Ok(self.ready(now, state.sequence))
                } else {
                    Ok(IdGenStatus::Pending {
                        yield_for: self.millis_until(last + 1, now_millis),
                    })
                }
            }
            Ordering::Greater => {
                state.last_time = Some(now);
                state.sequence = 0;
                Ok(self.ready(now, 0))
            }
            Ordering::Less => Err(self.cold_clock_behind(last, now)),
        }
    }

    /// Generates the next id, waiting with `backoff` whenever the sequence
    /// for the current time unit is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockMovedBackwards`] if the clock steps backwards.
    pub fn next_id(&self, backoff: Backoff) -> Result<u64> {
        let mut waiting = false;
        loop {
            match self.try_next_id()? {
                IdGenStatus::Ready { id } => {
                    if waiting {
                        info!("next {} is up", self.id_type.unit_name());
                    }
                    return Ok(id);
                }
                IdGenStatus::Pending { yield_for } => {
                    if !waiting {
                        info!(
                            "ids are used up in machine {}, waiting {yield_for}ms for the next {}",
                            self.machine_id,
                            self.id_type.unit_name()
                        );
                        waiting = true;
                    }
                    backoff.wait(yield_for);
                }
            }
        }
    }

    /// Unpacks an id using this generator's layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the id holds an unassigned generation method.
    pub fn expand_id(&self, id: u64) -> Result<DistributedId> {
        DistributedId::from_raw_with(id, self.id_type)
    }

    /// Packs an id for an explicit time unit and sequence on this machine.
    pub fn make_id(&self, time: u64, seq: u64) -> u64 {
        self.make_id_for(time, seq, self.machine_id)
    }

    /// Packs an id for an explicit time unit, sequence and machine.
    pub fn make_id_for(&self, time: u64, seq: u64, machine: u64) -> u64 {
        DistributedId::new(self.id_type, time, seq, machine)
            .with_gen_method(self.gen_method)
            .with_version(self.version)
            .to_raw()
    }

    /// Converts the time field of an id back to wall-clock time.
    pub fn trans_time(&self, time: u64) -> SystemTime {
        UNIX_EPOCH
            + SPIN_EPOCH
            + Duration::from_millis(time.saturating_mul(self.id_type.unit_millis()))
    }

    fn ready(&self, time: u64, seq: u64) -> IdGenStatus {
        let id = DistributedId::new(self.id_type, time, seq, self.machine_id)
            .with_gen_method(self.gen_method)
            .with_version(self.version);
        let raw = id.to_raw();
        trace!("distributed id: {id} => {raw}");
        IdGenStatus::Ready { id: raw }
    }

    fn time_unit(&self, millis: u64) -> u64 {
        millis.saturating_sub(SPIN_EPOCH.as_millis() as u64) / self.id_type.unit_millis()
    }

    fn millis_until(&self, unit: u64, now_millis: u64) -> u64 {
        let target = SPIN_EPOCH.as_millis() as u64 + unit * self.id_type.unit_millis();
        target.saturating_sub(now_millis).max(1)
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(&self, last: u64, now: u64) -> Error {
        let err = Error::ClockMovedBackwards {
            behind: last - now,
            unit: self.id_type.unit_name(),
        };
        tracing::error!("{err}");
        err
    }

    #[cold]
    #[inline(never)]
    fn cold_time_overflow(&self, now: u64, max: u64) -> Error {
        let err = Error::TimeOverflow {
            time: now,
            max,
            unit: self.id_type.unit_name(),
        };
        tracing::error!("{err}");
        err
    }
}
