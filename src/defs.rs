/// Default epoch: Thursday, November 4, 2010 01:42:54.657 UTC (the classic
/// Twitter epoch), in milliseconds since the Unix epoch. The 41-bit timestamp
/// field counts milliseconds from this instant, giving roughly 69 years of
/// range. Generators built with `with_epoch` may shift the window; decoders
/// must use the same epoch as the generator that produced the ID.
pub const SNOWFLAKE_ID_EPOCH: i64 = 1_288_834_974_657;

pub const TIMESTAMP_BITS: u64 = 41;
pub const DATA_CENTER_ID_BITS: u64 = 5;
pub const MACHINE_ID_BITS: u64 = 5;
pub const SEQUENCE_BITS: u64 = 12;

pub const MAX_DATA_CENTER_ID: u64 = (1 << DATA_CENTER_ID_BITS) - 1;
pub const MAX_MACHINE_ID: u64 = (1 << MACHINE_ID_BITS) - 1;
pub const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;
pub const MAX_TIMESTAMP_MS: i64 = (1 << TIMESTAMP_BITS) - 1;
