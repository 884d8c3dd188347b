use std::num::NonZeroUsize;

/// Number of latency samples retained when the configuration does not set one.
pub const DEFAULT_SAMPLE_CAPACITY: NonZeroUsize = unsafe { NonZeroUsize::new_unchecked(1000) };

/// Status code recorded for a call which failed before a status was obtained.
pub const FAILED_CALL_STATUS: u16 = 0;
