use crate::{
    BitbangMaster,
    timing::{
        PRESENCE_RECOVERY_US, PRESENCE_SAMPLE_US, READ_INIT_LOW_US, READ_RECOVERY_US,
        READ_SAMPLE_US, RESET_LOW_US, WRITE_ONE_LOW_US, WRITE_ONE_RELEASE_US, WRITE_ZERO_LOW_US,
        WRITE_ZERO_RELEASE_US,
    },
};
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};
use onewire_master::{OneWire, OneWireError, OneWireResult};

impl<P: OutputPin + InputPin, D: DelayNs> OneWire for BitbangMaster<P, D> {
    type BusError = P::Error;

    fn reset(&mut self) -> OneWireResult<(), Self::BusError> {
        self.exclusive(|m| {
            m.pin.set_low()?;
            m.delay.delay_us(RESET_LOW_US);
            m.pin.set_high()?;
            m.delay.delay_us(PRESENCE_SAMPLE_US);
            if !m.pin.is_low()? {
                return Err(OneWireError::NoDevicePresent);
            }
            // wait for the device to release the line
            m.delay.delay_us(PRESENCE_RECOVERY_US);
            Ok(())
        })
    }

    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError> {
        let (low, release) = if bit {
            (WRITE_ONE_LOW_US, WRITE_ONE_RELEASE_US)
        } else {
            (WRITE_ZERO_LOW_US, WRITE_ZERO_RELEASE_US)
        };
        self.exclusive(|m| {
            m.pin.set_low()?;
            m.delay.delay_us(low);
            m.pin.set_high()?;
            m.delay.delay_us(release);
            Ok(())
        })
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        self.exclusive(|m| {
            m.pin.set_low()?;
            m.delay.delay_us(READ_INIT_LOW_US);
            m.pin.set_high()?;
            m.delay.delay_us(READ_SAMPLE_US);
            let bit = m.pin.is_high()?;
            m.delay.delay_us(READ_RECOVERY_US);
            Ok(bit)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use std::vec::Vec;

    /// Delay source that records every wait, in microseconds.
    #[derive(Default)]
    struct RecordingDelay {
        log: Vec<u32>,
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.log.push(ns / 1000);
        }
    }

    fn master(
        transactions: &[PinTransaction],
    ) -> BitbangMaster<PinMock, RecordingDelay> {
        let pin = PinMock::new(transactions);
        BitbangMaster::new(pin, RecordingDelay::default()).unwrap()
    }

    #[test]
    fn new_releases_the_line() {
        let m = master(&[PinTransaction::set(PinState::High)]);
        let (mut pin, delay) = m.free();
        pin.done();
        assert!(delay.log.is_empty());
    }

    #[test]
    fn reset_detects_presence() {
        let mut m = master(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
            PinTransaction::get(PinState::Low),
        ]);
        m.reset().unwrap();
        let (mut pin, delay) = m.free();
        pin.done();
        assert_eq!(delay.log, [480, 70, 410]);
    }

    #[test]
    fn reset_without_presence_pulse_fails_early() {
        let mut m = master(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
            PinTransaction::get(PinState::High),
        ]);
        assert!(matches!(m.reset(), Err(OneWireError::NoDevicePresent)));
        let (mut pin, delay) = m.free();
        pin.done();
        // no recovery wait after a failed presence sample
        assert_eq!(delay.log, [480, 70]);
    }

    #[test]
    fn write_slots_total_the_same_duration() {
        let mut m = master(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        m.write_bit(true).unwrap();
        m.write_bit(false).unwrap();
        let (mut pin, delay) = m.free();
        pin.done();
        assert_eq!(delay.log, [6, 64, 60, 10]);
        assert_eq!(delay.log[0] + delay.log[1], delay.log[2] + delay.log[3]);
    }

    #[test]
    fn read_slot_samples_after_release() {
        for (state, expected) in [(PinState::High, true), (PinState::Low, false)] {
            let mut m = master(&[
                PinTransaction::set(PinState::High),
                PinTransaction::set(PinState::Low),
                PinTransaction::set(PinState::High),
                PinTransaction::get(state),
            ]);
            assert_eq!(m.read_bit().unwrap(), expected);
            let (mut pin, delay) = m.free();
            pin.done();
            assert_eq!(delay.log, [6, 9, 55]);
        }
    }

    #[test]
    fn write_byte_emits_eight_lsb_first_slots() {
        let mut transactions = std::vec![PinTransaction::set(PinState::High)];
        for _ in 0..8 {
            transactions.push(PinTransaction::set(PinState::Low));
            transactions.push(PinTransaction::set(PinState::High));
        }
        let mut m = master(&transactions);
        m.write_byte(0x0f).unwrap();
        let (mut pin, delay) = m.free();
        pin.done();
        // 0x0f: four one-slots first (lsb first), then four zero-slots
        let mut expected = Vec::new();
        expected.extend_from_slice(&[6, 64, 6, 64, 6, 64, 6, 64]);
        expected.extend_from_slice(&[60, 10, 60, 10, 60, 10, 60, 10]);
        assert_eq!(delay.log, expected);
    }
}
