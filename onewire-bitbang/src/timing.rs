//! Regular-speed 1-Wire timing values, in microseconds.
//!
//! These are protocol constants, not tunables. Read and write slots total the
//! same duration regardless of bit value so that back-to-back slots stay
//! frame-aligned; the assertions at the bottom pin that invariant at compile
//! time.

/// Duration the master holds the line low to reset the bus.
pub const RESET_LOW_US: u32 = 480;

/// Wait after releasing the reset pulse before sampling for presence.
pub const PRESENCE_SAMPLE_US: u32 = 70;

/// Wait after a detected presence pulse before any further bus activity,
/// so the device can release the line. The whole reset sequence with
/// [`RESET_LOW_US`] and [`PRESENCE_SAMPLE_US`] takes 960 µs.
pub const PRESENCE_RECOVERY_US: u32 = 410;

/// Low-pulse width of a write-one slot.
pub const WRITE_ONE_LOW_US: u32 = 6;

/// Released remainder of a write-one slot.
pub const WRITE_ONE_RELEASE_US: u32 = 64;

/// Low-pulse width of a write-zero slot.
pub const WRITE_ZERO_LOW_US: u32 = 60;

/// Released remainder of a write-zero slot.
pub const WRITE_ZERO_RELEASE_US: u32 = 10;

/// Low pulse the master issues to initiate a read slot.
pub const READ_INIT_LOW_US: u32 = 6;

/// Wait after releasing the read-init pulse before sampling the line.
pub const READ_SAMPLE_US: u32 = 9;

/// Remainder of the read slot after the sample point.
pub const READ_RECOVERY_US: u32 = 55;

const _: () = assert!(
    WRITE_ONE_LOW_US + WRITE_ONE_RELEASE_US == WRITE_ZERO_LOW_US + WRITE_ZERO_RELEASE_US,
    "write slots must total the same duration for either bit value"
);

const _: () = assert!(
    READ_INIT_LOW_US + READ_SAMPLE_US + READ_RECOVERY_US
        == WRITE_ONE_LOW_US + WRITE_ONE_RELEASE_US,
    "read and write slots must total the same duration"
);
