use std::io::{self, BufRead, Write};

use clap::Parser;
use ds2433::{DS2433_MEM_SIZE, Ds2433};
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::{CdevPin, Delay};
use onewire_bitbang::BitbangMaster;

/// Line-oriented hex console for a DS2433-class 1-Wire EEPROM bit-banged on
/// a GPIO line.
///
/// Commands on stdin, one per line, each acknowledged with `ok`/`ko`:
/// `addr [hex4]` gets/sets the memory cursor, `rmem <hex4>` reads and
/// advances, `wmem` starts a multi-line hex upload terminated by an empty
/// line, `rrom` prints the device ROM code, `llen` prints the maximum
/// accepted line length.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the GPIO character device (e.g., /dev/gpiochip0)
    #[arg(short, long)]
    chip: String,

    /// Offset of the 1-Wire data line on that chip
    #[arg(short, long)]
    line: u32,

    /// ROM code of the target device (hex); Skip ROM is used when omitted
    #[arg(short, long, value_parser = parse_rom)]
    rom: Option<u64>,
}

fn parse_rom(s: &str) -> Result<u64, String> {
    u64::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| e.to_string())
}

/// Maximum accepted command/data line length, reported by `llen`.
const LINE_MAX: usize = 16;

type Bus = BitbangMaster<CdevPin, Delay>;

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    // Request the data line open-drain: set_low drives it, set_high releases
    // it to the bus pull-up
    let mut chip = Chip::new(&args.chip).expect("Failed to open GPIO chip");
    let line = chip.get_line(args.line).expect("Failed to get GPIO line");
    let handle = line
        .request(
            LineRequestFlags::OUTPUT | LineRequestFlags::OPEN_DRAIN,
            1,
            "ds2433",
        )
        .expect("Failed to request the data line");
    let pin = CdevPin::new(handle).expect("Failed to wrap the data line");
    // Create the bit-banged bus master, line released
    let mut bus = BitbangMaster::new(pin, Delay).expect("Failed to set up the 1-Wire master");
    // Probe the bus so a wiring problem shows up before the first command
    match Ds2433::read_rom(&mut bus) {
        Ok(rom) => log::info!("found device, rom {rom:016x}"),
        Err(e) => log::warn!("no device answered the probe: {e:?}"),
    }
    let eeprom = match args.rom {
        Some(rom) => Ds2433::new().with_rom(rom),
        None => Ds2433::new(),
    };
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(&mut bus, &eeprom, stdin.lock(), stdout.lock()).expect("console I/O failed");
}

fn serve<R: BufRead, W: Write>(
    bus: &mut Bus,
    eeprom: &Ds2433,
    input: R,
    mut out: W,
) -> io::Result<()> {
    let mut delay = Delay;
    let mut cursor: u16 = 0;
    let mut lines = input.lines();
    while let Some(line) = lines.next() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        let (cmd, arg) = match line.split_once(' ') {
            Some((cmd, arg)) => (cmd, arg.trim()),
            None => (line, ""),
        };
        match cmd {
            "addr" => do_addr(&mut cursor, arg, &mut out)?,
            "rmem" => do_rmem(bus, eeprom, &mut cursor, arg, &mut out)?,
            "wmem" if arg.is_empty() => {
                do_wmem(bus, eeprom, &mut delay, &mut cursor, &mut lines, &mut out)?
            }
            "rrom" if arg.is_empty() => do_rrom(bus, &mut out)?,
            "llen" if arg.is_empty() => {
                writeln!(out, "ok")?;
                writeln!(out, "{LINE_MAX:04x}")?;
            }
            _ => writeln!(out, "ko")?,
        }
        out.flush()?;
    }
    Ok(())
}

fn do_addr<W: Write>(cursor: &mut u16, arg: &str, out: &mut W) -> io::Result<()> {
    if arg.is_empty() {
        // get address value
        writeln!(out, "ok")?;
        writeln!(out, "{cursor:04x}")?;
        return Ok(());
    }
    // set address value
    match parse_hex16(arg) {
        Some(addr) => {
            *cursor = addr;
            writeln!(out, "ok")
        }
        None => writeln!(out, "ko"),
    }
}

fn do_rmem<W: Write>(
    bus: &mut Bus,
    eeprom: &Ds2433,
    cursor: &mut u16,
    arg: &str,
    out: &mut W,
) -> io::Result<()> {
    let size = match parse_hex16(arg) {
        Some(size) if *cursor as usize + size as usize <= DS2433_MEM_SIZE => size,
        _ => return writeln!(out, "ko"),
    };
    let mut buf = vec![0u8; size as usize];
    match eeprom.read_memory(bus, *cursor, &mut buf) {
        Ok(()) => {
            *cursor += size;
            writeln!(out, "ok")?;
            write_hex_dump(out, &buf)
        }
        Err(e) => {
            log::warn!("memory read failed: {e:?}");
            writeln!(out, "ko")
        }
    }
}

fn do_rrom<W: Write>(bus: &mut Bus, out: &mut W) -> io::Result<()> {
    match Ds2433::read_rom(bus) {
        Ok(rom) => {
            writeln!(out, "ok")?;
            // wire order, low byte first
            write_hex_dump(out, &rom.to_le_bytes())
        }
        Err(e) => {
            log::warn!("ROM read failed: {e:?}");
            writeln!(out, "ko")
        }
    }
}

/// Collects hex payload lines (each acknowledged, terminated by an empty
/// line), then writes the whole buffer at the cursor. A malformed or
/// oversized upload is abandoned with `ko` and leaves memory untouched.
fn do_wmem<R: BufRead, W: Write>(
    bus: &mut Bus,
    eeprom: &Ds2433,
    delay: &mut Delay,
    cursor: &mut u16,
    lines: &mut io::Lines<R>,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "ok")?;
    out.flush()?;
    let mut data = Vec::new();
    while let Some(line) = lines.next() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() {
            return match eeprom.write_memory(bus, delay, *cursor, &data) {
                Ok(()) => {
                    *cursor += data.len() as u16;
                    writeln!(out, "ok")
                }
                Err(e) => {
                    log::warn!("memory write failed: {e:?}");
                    writeln!(out, "ko")
                }
            };
        }
        if line.len() > LINE_MAX
            || parse_hex_line(line, &mut data).is_none()
            || data.len() > DS2433_MEM_SIZE
        {
            return writeln!(out, "ko");
        }
        writeln!(out, "ok")?;
        out.flush()?;
    }
    // input closed mid-upload; nothing was written
    Ok(())
}

fn parse_hex16(s: &str) -> Option<u16> {
    if s.is_empty() || s.len() > 4 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(s, 16).ok()
}

fn parse_hex_line(s: &str, data: &mut Vec<u8>) -> Option<()> {
    if s.len() % 2 != 0 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    for pair in s.as_bytes().chunks(2) {
        let pair = std::str::from_utf8(pair).ok()?;
        data.push(u8::from_str_radix(pair, 16).ok()?);
    }
    Some(())
}

fn write_hex_dump<W: Write>(out: &mut W, data: &[u8]) -> io::Result<()> {
    for chunk in data.chunks(16) {
        for byte in chunk {
            write!(out, "{byte:02x}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}
