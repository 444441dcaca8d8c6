#![no_std]
//! Driver to write characters to HD44780 compatible LCD displays sitting
//! behind a PCF8574 I2C expander, like the common 16x2 and 20x4 modules with
//! an "I2C backpack". It requires an I2C instance implementing
//! [`embedded_hal::i2c::I2c`] and a instance to delay execution with
//! [`embedded_hal::delay::DelayNs`].
//!
//! The expander multiplexes the controller's 4-bit data bus, the control
//! lines and the backlight onto a single output byte, so every logical byte
//! reaches the display as two enable-pulsed nibble transfers with the
//! backlight bit folded into each of them.
//!
//! Usage:
//! ```ignore
//! const LCD_ADDRESS: u8 = 0x27; // Address depends on hardware, see link below
//!
//! // Create an I2C instance, needs to implement embedded_hal::i2c::I2c. On a
//! // hosted OS this is the i2c character device; opening it is the only step
//! // that can fail before the display is talked to.
//! let mut i2c = linux_embedded_hal::I2cdev::new("/dev/i2c-0")?;
//! let mut delay = linux_embedded_hal::Delay;
//!
//! let mut lcd = lcd_hd44780_i2c::Lcd::new(&mut i2c, &mut delay)
//!     .with_address(LCD_ADDRESS)
//!     .with_columns(16)
//!     .with_rows(2)
//!     .init()?;
//! lcd.write_str("Hello")?;
//! ```
//!
//! This [site][lcd address] describes how to find the address of your LCD
//! devices.
//!
//! [lcd address]: https://www.ardumotive.com/i2clcden.html

pub mod sync_lcd;

#[cfg(feature = "async")]
pub mod async_lcd;

pub use sync_lcd::Lcd;

/// Instruction bytes of the HD44780 command set.
#[repr(u8)]
#[derive(Copy, Clone)]
enum Command {
    Clear = 0x01,
    ReturnHome = 0x02,
    EntryModeSet = 0x04,
    DisplayControl = 0x08,
    CursorShift = 0x10,
    FunctionSet = 0x20,
    SetCgramAddr = 0x40,
    SetDdramAddr = 0x80,
}

/// Register-select bit of the expander byte. 0 targets the instruction
/// register, 1 the data register.
#[repr(u8)]
#[derive(Copy, Clone)]
enum Mode {
    Cmd = 0x00,
    Data = 0x01,
}

// Enable line of the expander byte. Bit 1 is read/write and stays low, this
// driver never reads back from the controller.
const ENABLE: u8 = 0b0000_0100;

// flags for entry mode set
const ENTRY_LEFT: u8 = 0x02;
const ENTRY_SHIFT_INCREMENT: u8 = 0x01;
const ENTRY_SHIFT_DECREMENT: u8 = 0x00;

// flags for display on/off control
const DISPLAY_ON: u8 = 0x04;
const CURSOR_ON: u8 = 0x02;
const CURSOR_OFF: u8 = 0x00;
const BLINK_ON: u8 = 0x01;
const BLINK_OFF: u8 = 0x00;

// flags for cursor/display shift
const DISPLAY_MOVE: u8 = 0x08;
const MOVE_RIGHT: u8 = 0x04;
const MOVE_LEFT: u8 = 0x00;

// flags for function set
const MODE_4BIT: u8 = 0x00;
const LINES_2: u8 = 0x08;
const LINES_1: u8 = 0x00;

/// DDRAM start address of each row, fixed by the HD44780 address map.
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Backlight {
    Off = 0x00,
    On = 0x08,
}

/// Character cell height. The taller font only exists on single-row modules.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Font {
    Font5x8 = 0x00,
    Font5x10 = 0x04,
}

/// Selects between the behavior of the C lineage this driver descends from
/// and corrected semantics.
///
/// `Legacy` keeps two long-standing quirks observable: `set_cursor` only
/// clamps rows strictly greater than the configured row count, and switching
/// the backlight off leaves the backlight flag set. `Strict` corrects both
/// and additionally range-checks cursor coordinates.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CompatMode {
    Legacy,
    Strict,
}

/// What to do when an I2C transfer fails.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ErrorPolicy {
    /// Return the failure to the caller.
    Propagate,
    /// Log the failure and keep going, like the C lineage did. The mirrored
    /// register state can drift from the hardware for the rest of the
    /// session, there is no way to detect that afterwards.
    LogAndContinue,
}

/// Errors reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// The underlying I2C transfer failed.
    Bus(E),
    /// The requested row has no DDRAM start address.
    RowOutOfRange,
    /// The requested column lies outside the configured geometry.
    ColumnOutOfRange,
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "i2c transfer failed: {:?}", e),
            Error::RowOutOfRange => write!(f, "row out of range"),
            Error::ColumnOutOfRange => write!(f, "column out of range"),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for Error<E> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Error::Bus(_) => defmt::write!(fmt, "i2c transfer failed"),
            Error::RowOutOfRange => defmt::write!(fmt, "row out of range"),
            Error::ColumnOutOfRange => defmt::write!(fmt, "column out of range"),
        }
    }
}
