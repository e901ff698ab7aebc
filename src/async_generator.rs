use crate::clock::{Clock, SystemClock};
use crate::error::SnowflakeError;
use crate::generator::SnowflakeOperation;
use crate::snowflake::Snowflake;
use std::marker::PhantomData;
use std::time::Duration;
use tokio::sync::Mutex;

struct GeneratorState {
    last_timestamp: i64,
    sequence: u64,
}

/// Async twin of [`crate::generator::SnowflakeGenerator`]: same state
/// machine, but sequence exhaustion yields to the runtime with a timed sleep
/// instead of spinning.
pub struct AsyncSnowflakeGenerator<S: Snowflake, C: Clock = SystemClock> {
    machine_id: u64,
    data_center_id: u64,
    state: Mutex<GeneratorState>,
    epoch: i64,
    clock: C,
    _marker: PhantomData<S>,
}

impl<S: Snowflake> AsyncSnowflakeGenerator<S> {
    pub fn new(machine_id: u64, data_center_id: u64) -> Result<Self, SnowflakeError> {
        Self::with_epoch(machine_id, data_center_id, crate::defs::SNOWFLAKE_ID_EPOCH)
    }

    pub fn with_epoch(
        machine_id: u64,
        data_center_id: u64,
        epoch: i64,
    ) -> Result<Self, SnowflakeError> {
        Self::with_clock(machine_id, data_center_id, epoch, SystemClock)
    }
}

impl<S: Snowflake, C: Clock> AsyncSnowflakeGenerator<S, C> {
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

        Ok(AsyncSnowflakeGenerator {
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

    pub fn epoch(&self) -> i64 {
        self.epoch
    }

    pub async fn try_next_id(&self) -> Result<SnowflakeOperation<S>, SnowflakeError> {
        let mut state = self.state.lock().await;
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

        let timestamp_offset = timestamp - self.epoch;
        if timestamp_offset < 0 || timestamp_offset > S::max_timestamp() {
            return Err(SnowflakeError::TimestampOverflow);
        }

        let masked_timestamp = (timestamp_offset as u64) & S::timestamp_mask();

        Ok(SnowflakeOperation::Ready(S::from_component_parts(
            masked_timestamp,
            self.data_center_id,
            self.machine_id,
            state.sequence,
        )))
    }

    pub async fn next_id(&self) -> Result<S, SnowflakeError> {
        loop {
            match self.try_next_id().await? {
                SnowflakeOperation::Ready(id) => return Ok(id),
                SnowflakeOperation::Pending(wait) => {
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    pub async fn next_id_bulk(&self, count: usize) -> Result<Vec<S>, SnowflakeError> {
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            ids.push(self.next_id().await?);
        }
        Ok(ids)
    }
}
