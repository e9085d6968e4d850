use crate::OneWireResult;

/// Trait for the 1-Wire bus master role.
///
/// Implementors provide the three primitive operations — [reset](OneWire::reset),
/// [write_bit](OneWire::write_bit) and [read_bit](OneWire::read_bit) — and get
/// byte-level framing and ROM addressing for free. Bytes travel as exactly
/// eight bit slots, least-significant bit first; there is no parity and no CRC
/// at this layer.
///
/// All operations are synchronous and blocking: each one occupies the caller
/// for a bounded, known duration and there is no cancellation. Once a
/// transaction is underway, only [reset](OneWire::reset) can report a failure
/// from the bus itself.
pub trait OneWire {
    /// The error type returned by the operations of this trait.
    /// This type is used to indicate errors in the underlying hardware.
    type BusError;

    /// Resets the 1-Wire bus and detects device presence.
    ///
    /// # Errors
    /// Returns [`OneWireError::NoDevicePresent`](crate::OneWireError::NoDevicePresent)
    /// if no device asserted a presence pulse, or the hardware error of the
    /// underlying line. A caller must abort its transaction on failure and
    /// issue no further bus I/O; the line is left released.
    fn reset(&mut self) -> OneWireResult<(), Self::BusError>;

    /// Transmits a single bit slot on the bus.
    ///
    /// # Errors
    /// This method returns an error if the underlying line cannot be driven.
    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError>;

    /// Generates a read slot and samples the bit the device transmits.
    ///
    /// A device drives the line low during the slot only when transmitting a
    /// zero; an idle or absent device leaves the pull-up in charge and the
    /// master samples a one.
    ///
    /// # Errors
    /// This method returns an error if the underlying line cannot be sampled.
    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError>;

    /// Writes a byte to the 1-Wire bus as eight bit slots, lsb first.
    ///
    /// # Errors
    /// This method returns an error if any bit slot fails.
    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        for i in 0..8 {
            self.write_bit(byte & (1 << i) != 0)?;
        }
        Ok(())
    }

    /// Reads a byte from the 1-Wire bus as eight read slots, lsb first.
    ///
    /// # Errors
    /// This method returns an error if any read slot fails.
    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        let mut byte = 0;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    /// Writes a sequence of bytes to the 1-Wire bus.
    ///
    /// # Errors
    /// This method returns an error if any byte write fails.
    fn write_bytes(&mut self, bytes: &[u8]) -> OneWireResult<(), Self::BusError> {
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Fills `buf` with sequential byte reads from the 1-Wire bus.
    ///
    /// # Errors
    /// This method returns an error if any byte read fails.
    fn read_bytes(&mut self, buf: &mut [u8]) -> OneWireResult<(), Self::BusError> {
        for byte in buf {
            *byte = self.read_byte()?;
        }
        Ok(())
    }

    /// Addresses devices on the 1-Wire bus.
    ///
    /// Issues the reset / ROM-select frame that must precede every device
    /// command. Pass [`None`] to skip ROM addressing on a single-device bus,
    /// or the 64-bit ROM code of the target device to match it specifically.
    ///
    /// # Errors
    /// Returns [`OneWireError::NoDevicePresent`](crate::OneWireError::NoDevicePresent)
    /// if the reset detects no device; no command byte is written in that case.
    fn address(&mut self, rom: Option<u64>) -> OneWireResult<(), Self::BusError> {
        let cmd = if rom.is_some() {
            crate::ONEWIRE_MATCH_ROM_CMD
        } else {
            crate::ONEWIRE_SKIP_ROM_CMD
        };
        self.reset()?; // Reset the bus before addressing
        self.write_byte(cmd)?;
        if let Some(rom) = rom {
            for &b in rom.to_le_bytes().iter() {
                self.write_byte(b)?; // Write each byte of the ROM address
            }
        }
        Ok(())
    }
}
