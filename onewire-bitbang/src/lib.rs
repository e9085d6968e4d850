#![no_std]
#![deny(missing_docs)]

/*! # onewire-bitbang

A software-timed 1-Wire bus master on a single open-drain GPIO line.

[`BitbangMaster`] implements the [`OneWire`] trait by producing the
reset/presence-detect and per-bit slot waveforms entirely in software, using
a microsecond busy-wait source. The line is modeled open-drain: the master
only ever drives it low or releases it to the external pull-up, never drives
it high. All timing values live in the [`timing`] module.

Correctness depends on the waits not being stretched by preemption while a
primitive is in flight. On targets with interrupts, enable the
`critical-section` cargo feature: every reset and bit slot then runs inside a
`critical_section::with` scope, which restores the previous interrupt state
on every exit path, including early failure returns.
*/

#[cfg(test)]
extern crate std;

pub use onewire_master::{OneWire, OneWireError, OneWireResult};

mod onewire;
pub mod timing;

use embedded_hal::digital::{InputPin, OutputPin};

/// A bit-banged 1-Wire bus master.
///
/// Takes ownership of the data line — a pin implementing both
/// [`OutputPin`] and [`InputPin`], configured open-drain so that
/// [`set_low`](OutputPin::set_low) drives the line and
/// [`set_high`](OutputPin::set_high) releases it to the pull-up — and a timer
/// object implementing the [`DelayNs`](embedded_hal::delay::DelayNs) trait.
pub struct BitbangMaster<P, D> {
    pub(crate) pin: P,
    pub(crate) delay: D,
}

impl<P: OutputPin + InputPin, D> BitbangMaster<P, D> {
    /// Creates a new instance of `BitbangMaster` over the given line.
    ///
    /// The line is released so the bus idles high under its pull-up.
    ///
    /// # Errors
    /// Returns the pin's hardware error if the line cannot be released.
    pub fn new(pin: P, delay: D) -> Result<Self, P::Error> {
        let mut master = BitbangMaster { pin, delay };
        master.pin.set_high()?;
        Ok(master)
    }
}

impl<P, D> BitbangMaster<P, D> {
    /// Releases the owned pin and delay source.
    pub fn free(self) -> (P, D) {
        (self.pin, self.delay)
    }

    #[cfg(feature = "critical-section")]
    fn exclusive<T>(&mut self, op: impl FnOnce(&mut Self) -> T) -> T {
        critical_section::with(|_| op(self))
    }

    #[cfg(not(feature = "critical-section"))]
    fn exclusive<T>(&mut self, op: impl FnOnce(&mut Self) -> T) -> T {
        op(self)
    }
}
