use crate::clock::{Clock, SystemClock};
use crate::error::SnowflakeError;
use crate::snowflake::Snowflake;
use std::marker::PhantomData;
use std::sync::Mutex;
use std::time::Duration;

pub enum SnowflakeOperation<S> {
    Ready(S),
    Pending(Duration),
}

struct GeneratorState {
    last_timestamp: i64,
    sequence: u64,
}

pub struct SnowflakeGenerator<S: Snowflake, C: Clock = SystemClock> {
    machine_id: u64,
    data_center_id: u64,
    state: Mutex<GeneratorState>,
    epoch: i64,
    clock: C,
    _marker: PhantomData<S>,
}

impl<S: Snowflake> SnowflakeGenerator<S> {
    /// Creates a new SnowflakeGenerator using the default epoch.
    ///
    /// # Arguments
    /// * `machine_id` - Machine/worker ID within the datacenter (0-31)
    /// * `data_center_id` - Datacenter/shard ID (0-31)
    ///
    /// The `(data_center_id, machine_id)` pair must be unique across all
    /// live generators; that assignment is the caller's responsibility.
    pub fn new(machine_id: u64, data_center_id: u64) -> Result<Self, SnowflakeError> {
        Self::with_epoch(machine_id, data_center_id, crate::defs::SNOWFLAKE_ID_EPOCH)
    }

    /// Creates a new SnowflakeGenerator with a custom epoch
    ///
    /// # Arguments
    /// * `machine_id` - Machine/worker ID within the datacenter (0-31)
    /// * `data_center_id` - Datacenter/shard ID (0-31)
    /// * `epoch` - Custom epoch in milliseconds since Unix epoch
    ///
    /// # Example
    /// ```
    /// use snowgen::SnowflakeGenerator;
    ///
    /// // Use a custom epoch (e.g., Jan 1, 2024)
    /// let generator = SnowflakeGenerator::with_epoch(1, 1, 1704067200000).unwrap();
    /// ```
    pub fn with_epoch(
        machine_id: u64,
        data_center_id: u64,
        epoch: i64,
    ) -> Result<Self, SnowflakeError> {
        Self::with_clock(machine_id, data_center_id, epoch, SystemClock)
    }
}

impl<S: Snowflake, C: Clock> SnowflakeGenerator<S, C> {
    /// Creates a generator driven by an arbitrary clock source. Tests use
    /// this to inject deterministic clocks.
    pub fn with_clock(
        machine_id: u64,
        data_center_id: u64,
        epoch: i64,
        clock: C,
    ) -> Result<Self, SnowflakeError> {
        if machine_id > S::max_machine_id() {
            return Err(SnowflakeError::InvalidMachineId(
                machine_id,
                S::max_machine_id(),
            ));
        }

        if data_center_id > S::max_data_center_id() {
            return Err(SnowflakeError::InvalidDataCenterId(
                data_center_id,
                S::max_data_center_id(),
            ));
        }

        Ok(SnowflakeGenerator {
            machine_id,
            data_center_id,
            state: Mutex::new(GeneratorState {
                last_timestamp: -1,
                sequence: 0,
            }),
            epoch,
            clock,
            _marker: PhantomData,
        })
    }

    /// Returns the epoch being used by this generator
    pub fn epoch(&self) -> i64 {
        self.epoch
    }

    pub fn machine_id(&self) -> u64 {
        self.machine_id
    }

    pub fn data_center_id(&self) -> u64 {
        self.data_center_id
    }

    /// Non-blocking variant: reports `Pending` with a suggested wait instead
    /// of spinning when the current millisecond's sequence space is
    /// exhausted. A backwards-moving clock is an error, never `Pending`.
    pub fn try_next_id(&self) -> Result<SnowflakeOperation<S>, SnowflakeError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| SnowflakeError::GeneratorPoisoned)?;

        let timestamp = self.clock.now_millis();

        if timestamp < state.last_timestamp {
            return Err(SnowflakeError::ClockMovedBackwards);
        }

        if timestamp == state.last_timestamp {
            let next_seq = (state.sequence + 1) & S::max_sequence();
            if next_seq == 0 {
                return Ok(SnowflakeOperation::Pending(Duration::from_millis(1)));
            }
            state.sequence = next_seq;
        } else {
            state.sequence = 0;
        }

        state.last_timestamp = timestamp;

        Ok(SnowflakeOperation::Ready(self.pack(timestamp, state.sequence)?))
    }

    /// Generates the next ID, holding the generator lock for the whole call.
    ///
    /// If the 4096-ID budget of the current millisecond is exhausted, this
    /// busy-waits (re-reading the clock) until the next millisecond; that
    /// bounds the stall to under a millisecond in practice. A clock observed
    /// earlier than the last issued timestamp fails with
    /// [`SnowflakeError::ClockMovedBackwards`] and leaves the generator state
    /// untouched; no internal retry or drift smoothing is attempted.
    pub fn next_id(&self) -> Result<S, SnowflakeError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| SnowflakeError::GeneratorPoisoned)?;
        self.advance(&mut state)
    }

    /// Generates `count` IDs under a single lock acquisition.
    pub fn next_id_bulk(&self, count: usize) -> Result<Vec<S>, SnowflakeError> {
        let mut ids = Vec::with_capacity(count);

        let mut state = self
            .state
            .lock()
            .map_err(|_| SnowflakeError::GeneratorPoisoned)?;

        for _ in 0..count {
            ids.push(self.advance(&mut state)?);
        }

        Ok(ids)
    }

    fn advance(&self, state: &mut GeneratorState) -> Result<S, SnowflakeError> {
        let mut timestamp = self.clock.now_millis();

        if timestamp < state.last_timestamp {
            return Err(SnowflakeError::ClockMovedBackwards);
        }

        if timestamp == state.last_timestamp {
            state.sequence = (state.sequence + 1) & S::max_sequence();
            if state.sequence == 0 {
                // Sequence space for this millisecond is exhausted; spin
                // until the clock strictly passes it.
                while timestamp <= state.last_timestamp {
                    timestamp = self.clock.now_millis();
                }
            }
        } else {
            state.sequence = 0;
        }

        state.last_timestamp = timestamp;

        self.pack(timestamp, state.sequence)
    }

    fn pack(&self, timestamp: i64, sequence: u64) -> Result<S, SnowflakeError> {
        let timestamp_offset = timestamp - self.epoch;
        if timestamp_offset < 0 || timestamp_offset > S::max_timestamp() {
            return Err(SnowflakeError::TimestampOverflow);
        }

        // Mask to timestamp bits so bit 63 stays 0 (keeping the ID positive)
        let masked_timestamp = (timestamp_offset as u64) & S::timestamp_mask();

        Ok(S::from_component_parts(
            masked_timestamp,
            self.data_center_id,
            self.machine_id,
            sequence,
        ))
    }
}
