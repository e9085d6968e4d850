#![no_std]
use bitfield_struct::bitfield;
use embedded_hal::delay::DelayNs;
use onewire_master::{ONEWIRE_READ_ROM_CMD, OneWire, OneWireError, OneWireResult};

pub const DS2433_MEM_SIZE: usize = 512;
pub const DS2433_PAGE_SIZE: usize = 32;
pub const DS2433_ROM_SIZE: usize = 8;

/// Driver for a DS2433-class 1-Wire EEPROM: 512 bytes of memory behind a
/// 32-byte scratchpad with a write/verify/commit discipline.
#[derive(Debug)]
pub struct Ds2433 {
    rom: Option<u64>,
}

impl Default for Ds2433 {
    fn default() -> Self {
        Self::new()
    }
}

impl Ds2433 {
    #[inline]
    pub const fn family() -> u8 {
        0x23
    }

    pub fn new() -> Self {
        Self { rom: None }
    }

    /// Address one specific device by its ROM code instead of issuing
    /// Skip ROM. Only needed when more than one device shares the bus.
    pub fn with_rom(mut self, rom: u64) -> Self {
        self.rom = Some(rom);
        self
    }

    /// Reads the 64-bit ROM code of the only device on the bus.
    pub fn read_rom<O: OneWire>(bus: &mut O) -> Result<u64, Ds2433Error<O::BusError>> {
        bus.reset()?;
        bus.write_byte(ONEWIRE_READ_ROM_CMD)?;
        let mut rom = [0; DS2433_ROM_SIZE];
        bus.read_bytes(&mut rom)?;
        Ok(u64::from_le_bytes(rom))
    }

    fn address<O: OneWire>(&self, bus: &mut O) -> OneWireResult<(), O::BusError> {
        bus.address(self.rom)
    }

    /// Fills `buf` with memory contents starting at `address`.
    ///
    /// Bounds are checked before any bus traffic; an out-of-range request
    /// returns [`Ds2433Error::OutOfRange`] without touching the line.
    pub fn read_memory<O: OneWire>(
        &self,
        bus: &mut O,
        address: u16,
        buf: &mut [u8],
    ) -> Result<(), Ds2433Error<O::BusError>> {
        check_bounds(address, buf.len())?;
        self.address(bus)?;
        bus.write_byte(DS2433_READ_MEM_CMD)?;
        bus.write_bytes(&address.to_le_bytes())?;
        bus.read_bytes(buf)?;
        Ok(())
    }

    /// Writes `data` to memory starting at `address`, splitting the request
    /// into page writes that never cross a 32-byte scratchpad boundary.
    ///
    /// Each page runs the full scratchpad sequence: write scratchpad, read
    /// back the authorization code, copy to memory, then hold for the 5 ms
    /// programming time. The authorization code is echoed to the copy command
    /// exactly as the device returned it; the target address and ending
    /// offset it reports are not checked against the request.
    ///
    /// Pages are committed in order and there is no rollback: when a page
    /// fails, [`Ds2433Error::WriteInterrupted`] reports how many bytes made
    /// it into memory, earlier pages stay committed, and later pages are
    /// never attempted.
    pub fn write_memory<O: OneWire, D: DelayNs>(
        &self,
        bus: &mut O,
        delay: &mut D,
        address: u16,
        data: &[u8],
    ) -> Result<(), Ds2433Error<O::BusError>> {
        check_bounds(address, data.len())?;
        let mut address = address as usize;
        let mut committed = 0;
        while committed < data.len() {
            let room = DS2433_PAGE_SIZE - address % DS2433_PAGE_SIZE;
            let len = room.min(data.len() - committed);
            self.write_page(bus, delay, address as u16, &data[committed..committed + len])
                .map_err(|cause| Ds2433Error::WriteInterrupted { committed, cause })?;
            address += len;
            committed += len;
        }
        Ok(())
    }

    fn write_page<O: OneWire, D: DelayNs>(
        &self,
        bus: &mut O,
        delay: &mut D,
        address: u16,
        data: &[u8],
    ) -> OneWireResult<(), O::BusError> {
        self.address(bus)?;
        bus.write_byte(DS2433_WRITE_SCRATCH_CMD)?;
        bus.write_bytes(&address.to_le_bytes())?;
        bus.write_bytes(data)?;

        self.address(bus)?;
        bus.write_byte(DS2433_READ_SCRATCH_CMD)?;
        let mut auth = [0; 3];
        bus.read_bytes(&mut auth)?;
        let auth = Authorization::from_bytes(auth);

        // echoed back as received; TA/E-S are not compared to the request
        self.address(bus)?;
        bus.write_byte(DS2433_COPY_SCRATCH_CMD)?;
        bus.write_bytes(&auth.into_bytes())?;
        delay.delay_us(DS2433_COPY_SETTLE_US);
        Ok(())
    }
}

fn check_bounds<E>(address: u16, len: usize) -> Result<(), Ds2433Error<E>> {
    if address as usize >= DS2433_MEM_SIZE || DS2433_MEM_SIZE - (address as usize) < len {
        return Err(Ds2433Error::OutOfRange { address, len });
    }
    Ok(())
}

/// Authorization code returned by the Read Scratchpad command: the target
/// address the device captured (TA1, TA2) and its [E/S byte](EsRegister).
/// The Copy Scratchpad command requires these three bytes back verbatim.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Authorization([u8; 3]);

impl Authorization {
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self(bytes)
    }

    pub const fn into_bytes(self) -> [u8; 3] {
        self.0
    }

    /// Target address the device captured with the scratchpad write.
    pub const fn target_address(&self) -> u16 {
        u16::from_le_bytes([self.0[0], self.0[1]])
    }

    pub const fn status(&self) -> EsRegister {
        EsRegister::from_bits(self.0[2])
    }
}

/// The DS2433 E/S (ending offset / status) byte.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct EsRegister {
    /// Offset within the page row of the last scratchpad byte written.
    #[bits(5)]
    pub ending_offset: u8,
    /// Set by the device when the last scratchpad write ended mid-byte.
    pub partial: bool,
    #[bits(1)]
    __: u8,
    /// Set once a copy with a valid authorization code has been issued.
    pub authorized: bool,
}

/// Errors of DS2433 memory operations.
#[derive(Debug, PartialEq, Eq)]
pub enum Ds2433Error<E> {
    /// 1-Wire bus failure, including device absence on reset.
    Bus(OneWireError<E>),
    /// Address/length outside the 512-byte memory; nothing was issued on
    /// the bus.
    OutOfRange { address: u16, len: usize },
    /// A page write failed partway through a multi-page operation. The first
    /// `committed` bytes are durably stored; the rest of the memory is
    /// untouched.
    WriteInterrupted {
        committed: usize,
        cause: OneWireError<E>,
    },
}

impl<E> From<OneWireError<E>> for Ds2433Error<E> {
    fn from(value: OneWireError<E>) -> Self {
        Self::Bus(value)
    }
}

const DS2433_READ_MEM_CMD: u8 = 0xf0;
const DS2433_WRITE_SCRATCH_CMD: u8 = 0x0f;
const DS2433_READ_SCRATCH_CMD: u8 = 0xaa;
const DS2433_COPY_SCRATCH_CMD: u8 = 0x55;

/// Internal EEPROM programming time after a copy command; a shorter hold
/// risks a corrupted page.
const DS2433_COPY_SETTLE_US: u32 = 5_000;
