use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use ufmt_write::uWrite;

use crate::{
    Backlight, Command, CompatMode, Error, ErrorPolicy, Font, Mode, BLINK_OFF, BLINK_ON,
    CURSOR_OFF, CURSOR_ON, DISPLAY_MOVE, DISPLAY_ON, ENABLE, ENTRY_LEFT, ENTRY_SHIFT_DECREMENT,
    ENTRY_SHIFT_INCREMENT, LINES_1, LINES_2, MODE_4BIT, MOVE_LEFT, MOVE_RIGHT, ROW_OFFSETS,
};

/// API to write to the LCD.
///
/// The controller's function, control and entry-mode registers are write
/// only. The driver keeps an in-memory mirror of each and retransmits the
/// whole byte on every toggle, the hardware has no per-bit instructions.
pub struct Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    i2c: &'a mut I,
    delay: &'a mut D,
    address: u8,
    columns: u8,
    rows: u8,
    font: Font,
    display_function: u8,
    display_control: u8,
    display_mode: u8,
    backlight_state: Backlight,
    compat: CompatMode,
    on_error: ErrorPolicy,
}

impl<'a, I, D> Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Create new instance with only the I2C and delay instance.
    pub fn new(i2c: &'a mut I, delay: &'a mut D) -> Self {
        Self {
            i2c,
            delay,
            address: 0,
            columns: 16,
            rows: 1,
            font: Font::Font5x8,
            display_function: MODE_4BIT | LINES_1 | Font::Font5x8 as u8,
            display_control: DISPLAY_ON | CURSOR_OFF | BLINK_OFF,
            display_mode: ENTRY_LEFT | ENTRY_SHIFT_DECREMENT,
            backlight_state: Backlight::On,
            compat: CompatMode::Legacy,
            on_error: ErrorPolicy::Propagate,
        }
    }

    /// Set I2C address, see [lcd address].
    ///
    /// [lcd address]: https://www.ardumotive.com/i2clcden.html
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Number of columns the display has.
    pub fn with_columns(mut self, columns: u8) -> Self {
        self.columns = columns;
        self
    }

    /// Number of rows the display has.
    pub fn with_rows(mut self, rows: u8) -> Self {
        self.rows = rows;
        self
    }

    /// Set the font height, only honored on single-row displays.
    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    /// Keep or correct the quirks of the C lineage, see [`CompatMode`].
    pub fn with_compat_mode(mut self, compat: CompatMode) -> Self {
        self.compat = compat;
        self
    }

    /// Choose how bus faults are handled, see [`ErrorPolicy`].
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }

    /// Initializes the hardware.
    ///
    /// The power-on state of the controller is unknown when this driver
    /// attaches to it, so the datasheet re-sync procedure is run first:
    /// three "8-bit mode" nibbles force the controller out of whatever
    /// half-state it is in, then one more nibble locks 4-bit mode. After
    /// that the display comes up on, cleared, cursor and blink off,
    /// left-to-right entry, backlight on, cursor at home.
    pub fn init(mut self) -> Result<Self, Error<I::Error>> {
        log::debug!("initializing hd44780 at {:#04x}", self.address);

        self.display_function = MODE_4BIT | LINES_1 | Font::Font5x8 as u8;
        if self.rows > 1 {
            self.display_function |= LINES_2;
        }
        // for some 1 line displays you can select a 10 pixel high font
        if self.font == Font::Font5x10 && self.rows == 1 {
            self.display_function |= Font::Font5x10 as u8;
        }

        // the controller needs >40ms after power-on before it takes commands
        self.delay.delay_ms(50);

        // latch the backlight bit before the first instruction
        self.write_expander(0x00)?;
        self.delay.delay_ms(1000);

        self.send_nibble(0x03 << 4)?;
        self.delay.delay_us(4500);
        self.send_nibble(0x03 << 4)?;
        self.delay.delay_us(4500);
        self.send_nibble(0x03 << 4)?;
        self.delay.delay_us(4500);

        // lock in 4-bit interface mode
        self.send_nibble(0x02 << 4)?;

        self.command(Command::FunctionSet as u8 | self.display_function)?;

        self.display_control = DISPLAY_ON | CURSOR_OFF | BLINK_OFF;
        self.command(Command::DisplayControl as u8 | self.display_control)?;

        self.clear()?;

        // default text direction for roman languages
        self.display_mode = ENTRY_LEFT | ENTRY_SHIFT_DECREMENT;
        self.command(Command::EntryModeSet as u8 | self.display_mode)?;

        self.return_home()?;
        Ok(self)
    }

    /// Transfer one raw byte to the expander with the backlight bit folded
    /// in. The backlight shares the expander's output latch with the data
    /// and control lines, skipping the OR here would visibly flicker it.
    fn write_expander(&mut self, data: u8) -> Result<(), Error<I::Error>> {
        let frame = data | self.backlight_state as u8;
        match self.i2c.write(self.address, &[frame]) {
            Ok(()) => Ok(()),
            Err(e) => match self.on_error {
                ErrorPolicy::Propagate => Err(Error::Bus(e)),
                ErrorPolicy::LogAndContinue => {
                    log::error!("i2c transfer to {:#04x} failed: {:?}", self.address, e);
                    Ok(())
                }
            },
        }
    }

    /// Latch `data` into the controller, it samples the data lines on the
    /// falling edge of enable.
    fn pulse_enable(&mut self, data: u8) -> Result<(), Error<I::Error>> {
        self.write_expander(data | ENABLE)?;
        self.delay.delay_us(1); // enable pulse width must be >450ns
        self.write_expander(data & !ENABLE)?;
        self.delay.delay_us(50); // commands need >37us to settle
        Ok(())
    }

    /// Present a bare nibble and latch it. Only used while the controller
    /// may still be in 8-bit mode during the init handshake, everything
    /// after that goes through [`Self::send`] as nibble pairs.
    fn send_nibble(&mut self, nibble: u8) -> Result<(), Error<I::Error>> {
        self.write_expander(nibble)?;
        self.pulse_enable(nibble)
    }

    fn send(&mut self, data: u8, mode: Mode) -> Result<(), Error<I::Error>> {
        let high_bits: u8 = data & 0xf0;
        let low_bits: u8 = (data << 4) & 0xf0;
        self.pulse_enable(high_bits | mode as u8)?;
        self.pulse_enable(low_bits | mode as u8)
    }

    fn command(&mut self, data: u8) -> Result<(), Error<I::Error>> {
        self.send(data, Mode::Cmd)
    }

    /// Clear the display and move the cursor to the upper left corner.
    pub fn clear(&mut self) -> Result<(), Error<I::Error>> {
        self.command(Command::Clear as u8)?;
        self.delay.delay_ms(2); // long-running instruction
        Ok(())
    }

    /// Return cursor to upper left corner, i.e. (0,0). Content is kept.
    pub fn return_home(&mut self) -> Result<(), Error<I::Error>> {
        self.command(Command::ReturnHome as u8)?;
        self.delay.delay_ms(2); // long-running instruction
        Ok(())
    }

    /// Set the cursor to (col, row). Coordinates are zero-based.
    ///
    /// Rows past the DDRAM offset table are rejected. In
    /// [`CompatMode::Legacy`] a row equal to the configured row count
    /// escapes the clamp, the guard of the C lineage only fires for
    /// strictly greater rows.
    pub fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Error<I::Error>> {
        let row = match self.compat {
            CompatMode::Legacy => {
                if row > self.rows {
                    // we count rows starting w/0
                    self.rows.saturating_sub(1)
                } else {
                    row
                }
            }
            CompatMode::Strict => {
                if row >= self.rows {
                    return Err(Error::RowOutOfRange);
                }
                if col >= self.columns {
                    return Err(Error::ColumnOutOfRange);
                }
                row
            }
        };
        let offset = *ROW_OFFSETS.get(row as usize).ok_or(Error::RowOutOfRange)?;
        self.command(Command::SetDdramAddr as u8 | col.wrapping_add(offset))
    }

    /// Switch the display on or off. DDRAM content survives while it is
    /// off and reappears unchanged when switched back on.
    pub fn display_on(&mut self, on: bool) -> Result<(), Error<I::Error>> {
        if on {
            self.display_control |= DISPLAY_ON;
        } else {
            self.display_control &= !DISPLAY_ON;
        }
        self.command(Command::DisplayControl as u8 | self.display_control)
    }

    /// Show or hide the cursor indicator.
    pub fn cursor_on(&mut self, on: bool) -> Result<(), Error<I::Error>> {
        if on {
            self.display_control |= CURSOR_ON;
        } else {
            self.display_control &= !CURSOR_ON;
        }
        self.command(Command::DisplayControl as u8 | self.display_control)
    }

    /// Set if the cursor is blinking.
    pub fn cursor_blink(&mut self, blink: bool) -> Result<(), Error<I::Error>> {
        if blink {
            self.display_control |= BLINK_ON;
        } else {
            self.display_control &= !BLINK_ON;
        }
        self.command(Command::DisplayControl as u8 | self.display_control)
    }

    /// Shift the display with every written character so the cursor stays
    /// put, i.e. right-justify text from the cursor.
    pub fn autoscroll(&mut self, on: bool) -> Result<(), Error<I::Error>> {
        if on {
            self.display_mode |= ENTRY_SHIFT_INCREMENT;
        } else {
            self.display_mode &= !ENTRY_SHIFT_INCREMENT;
        }
        self.command(Command::EntryModeSet as u8 | self.display_mode)
    }

    /// Text flows left to right from the cursor.
    pub fn left_to_right(&mut self) -> Result<(), Error<I::Error>> {
        self.display_mode |= ENTRY_LEFT;
        self.command(Command::EntryModeSet as u8 | self.display_mode)
    }

    /// Text flows right to left from the cursor.
    pub fn right_to_left(&mut self) -> Result<(), Error<I::Error>> {
        self.display_mode &= !ENTRY_LEFT;
        self.command(Command::EntryModeSet as u8 | self.display_mode)
    }

    /// Scrolls the display one char to the left
    pub fn scroll_display_left(&mut self) -> Result<(), Error<I::Error>> {
        self.command(Command::CursorShift as u8 | DISPLAY_MOVE | MOVE_LEFT)
    }

    /// Scrolls the display one char to the right
    pub fn scroll_display_right(&mut self) -> Result<(), Error<I::Error>> {
        self.command(Command::CursorShift as u8 | DISPLAY_MOVE | MOVE_RIGHT)
    }

    /// Switch the backlight and push the new state out with a zero-data
    /// write, display content is untouched.
    ///
    /// The C lineage never cleared the flag, its backlight-off path
    /// assigned the on value. [`CompatMode::Legacy`] reproduces that,
    /// [`CompatMode::Strict`] stores what was asked for.
    pub fn backlight(&mut self, backlight: Backlight) -> Result<(), Error<I::Error>> {
        self.backlight_state = match self.compat {
            CompatMode::Legacy => Backlight::On,
            CompatMode::Strict => backlight,
        };
        self.write_expander(0x00)
    }

    /// In-memory backlight state, the hardware is never queried.
    pub fn get_backlight(&self) -> bool {
        self.backlight_state == Backlight::On
    }

    /// Store a custom glyph in one of the eight CGRAM slots, one byte per
    /// pixel row. `location` silently wraps to 0-7.
    pub fn create_char(&mut self, location: u8, charmap: [u8; 8]) -> Result<(), Error<I::Error>> {
        let location = location & 0x7;
        self.command(Command::SetCgramAddr as u8 | (location << 3))?;
        for row in charmap.iter() {
            self.write_byte(*row)?;
        }
        Ok(())
    }

    /// Write a single raw byte at the cursor position. Values 0-7 address
    /// the custom glyphs.
    pub fn write_byte(&mut self, data: u8) -> Result<(), Error<I::Error>> {
        self.send(data, Mode::Data)
    }

    /// Write string to display.
    pub fn write_str(&mut self, data: &str) -> Result<(), Error<I::Error>> {
        for c in data.chars() {
            self.write_byte(c as u8)?;
        }
        Ok(())
    }
}

impl<'a, I, D> uWrite for Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Error = Error<I::Error>;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
    };
    use std::vec::Vec;

    const ADDR: u8 = 0x27;

    /// Expands one logical byte into the four expander transfers it becomes
    /// on the wire: two enable-pulsed nibbles, backlight folded into each.
    fn send_frames(value: u8, rs: u8, bl: u8) -> Vec<I2cTransaction> {
        let en = 0b0000_0100;
        let high = value & 0xf0;
        let low = (value << 4) & 0xf0;
        std::vec![
            I2cTransaction::write(ADDR, std::vec![high | rs | en | bl]),
            I2cTransaction::write(ADDR, std::vec![high | rs | bl]),
            I2cTransaction::write(ADDR, std::vec![low | rs | en | bl]),
            I2cTransaction::write(ADDR, std::vec![low | rs | bl]),
        ]
    }

    #[test]
    fn init_runs_the_documented_power_up_sequence() {
        let expected = std::vec![
            // backlight bit latched alone
            I2cTransaction::write(ADDR, std::vec![0b0000_1000]),
            // re-sync handshake: 0x30 presented and pulsed, three times
            I2cTransaction::write(ADDR, std::vec![0b0011_1000]),
            I2cTransaction::write(ADDR, std::vec![0b0011_1100]), // enable up
            I2cTransaction::write(ADDR, std::vec![0b0011_1000]), // enable down
            I2cTransaction::write(ADDR, std::vec![0b0011_1000]),
            I2cTransaction::write(ADDR, std::vec![0b0011_1100]),
            I2cTransaction::write(ADDR, std::vec![0b0011_1000]),
            I2cTransaction::write(ADDR, std::vec![0b0011_1000]),
            I2cTransaction::write(ADDR, std::vec![0b0011_1100]),
            I2cTransaction::write(ADDR, std::vec![0b0011_1000]),
            // 4-bit mode lock, 0x20
            I2cTransaction::write(ADDR, std::vec![0b0010_1000]),
            I2cTransaction::write(ADDR, std::vec![0b0010_1100]),
            I2cTransaction::write(ADDR, std::vec![0b0010_1000]),
            // function set 0x28: 4-bit, two lines, 5x8 font
            I2cTransaction::write(ADDR, std::vec![0b0010_1100]),
            I2cTransaction::write(ADDR, std::vec![0b0010_1000]),
            I2cTransaction::write(ADDR, std::vec![0b1000_1100]),
            I2cTransaction::write(ADDR, std::vec![0b1000_1000]),
            // display control 0x0c: display on, cursor off, blink off
            I2cTransaction::write(ADDR, std::vec![0b0000_1100]),
            I2cTransaction::write(ADDR, std::vec![0b0000_1000]),
            I2cTransaction::write(ADDR, std::vec![0b1100_1100]),
            I2cTransaction::write(ADDR, std::vec![0b1100_1000]),
            // clear 0x01
            I2cTransaction::write(ADDR, std::vec![0b0000_1100]),
            I2cTransaction::write(ADDR, std::vec![0b0000_1000]),
            I2cTransaction::write(ADDR, std::vec![0b0001_1100]),
            I2cTransaction::write(ADDR, std::vec![0b0001_1000]),
            // entry mode 0x06: left to right, no shift
            I2cTransaction::write(ADDR, std::vec![0b0000_1100]),
            I2cTransaction::write(ADDR, std::vec![0b0000_1000]),
            I2cTransaction::write(ADDR, std::vec![0b0110_1100]),
            I2cTransaction::write(ADDR, std::vec![0b0110_1000]),
            // return home 0x02
            I2cTransaction::write(ADDR, std::vec![0b0000_1100]),
            I2cTransaction::write(ADDR, std::vec![0b0000_1000]),
            I2cTransaction::write(ADDR, std::vec![0b0010_1100]),
            I2cTransaction::write(ADDR, std::vec![0b0010_1000]),
        ];
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();

        let lcd = Lcd::new(&mut i2c, &mut delay)
            .with_address(ADDR)
            .with_columns(16)
            .with_rows(2)
            .init();
        assert!(lcd.is_ok());

        drop(lcd);
        i2c.done();
    }

    #[test]
    fn set_cursor_addresses_the_second_row() {
        let expected = send_frames(0x80 | (3 + 0x40), 0, 0x08);
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();

        let mut lcd = Lcd::new(&mut i2c, &mut delay)
            .with_address(ADDR)
            .with_columns(16)
            .with_rows(2);
        lcd.set_cursor(3, 1).unwrap();

        drop(lcd);
        i2c.done();
    }

    #[test]
    fn clear_then_origin_targets_ddram_zero_like_home() {
        let mut expected = send_frames(0x01, 0, 0x08);
        expected.extend(send_frames(0x80, 0, 0x08));
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();

        let mut lcd = Lcd::new(&mut i2c, &mut delay)
            .with_address(ADDR)
            .with_columns(16)
            .with_rows(2);
        lcd.clear().unwrap();
        lcd.set_cursor(0, 0).unwrap();

        drop(lcd);
        i2c.done();
    }

    #[test]
    fn row_equal_to_row_count_escapes_the_legacy_clamp() {
        // the inherited guard is row > rows, row == rows slips through to
        // the offset table untouched
        let expected = send_frames(0x80 | 0x14, 0, 0x08);
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();

        let mut lcd = Lcd::new(&mut i2c, &mut delay)
            .with_address(ADDR)
            .with_columns(16)
            .with_rows(2);
        lcd.set_cursor(0, 2).unwrap();

        drop(lcd);
        i2c.done();
    }

    #[test]
    fn row_above_row_count_is_clamped_to_the_last_row() {
        let expected = send_frames(0x80 | 0x40, 0, 0x08);
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();

        let mut lcd = Lcd::new(&mut i2c, &mut delay)
            .with_address(ADDR)
            .with_columns(16)
            .with_rows(2);
        lcd.set_cursor(0, 3).unwrap();

        drop(lcd);
        i2c.done();
    }

    #[test]
    fn rows_past_the_offset_table_are_rejected() {
        // on a 4-row geometry the clamp escape falls off the table and must
        // come back as an error instead of indexing out of bounds
        let mut i2c = I2cMock::new(&[]);
        let mut delay = NoopDelay::new();

        let mut lcd = Lcd::new(&mut i2c, &mut delay)
            .with_address(ADDR)
            .with_columns(20)
            .with_rows(4);
        assert_eq!(lcd.set_cursor(0, 4), Err(Error::RowOutOfRange));

        drop(lcd);
        i2c.done();
    }

    #[test]
    fn strict_mode_range_checks_the_cursor() {
        let mut i2c = I2cMock::new(&[]);
        let mut delay = NoopDelay::new();

        let mut lcd = Lcd::new(&mut i2c, &mut delay)
            .with_address(ADDR)
            .with_columns(16)
            .with_rows(2)
            .with_compat_mode(CompatMode::Strict);
        assert_eq!(lcd.set_cursor(0, 2), Err(Error::RowOutOfRange));
        assert_eq!(lcd.set_cursor(16, 0), Err(Error::ColumnOutOfRange));

        drop(lcd);
        i2c.done();
    }

    #[test]
    fn control_flags_compose_independently() {
        let mut expected = send_frames(0x08 | 0x04 | 0x02, 0, 0x08); // cursor on
        expected.extend(send_frames(0x08 | 0x04 | 0x02 | 0x01, 0, 0x08)); // blink on
        expected.extend(send_frames(0x08 | 0x02 | 0x01, 0, 0x08)); // display off
        expected.extend(send_frames(0x08 | 0x04 | 0x02 | 0x01, 0, 0x08)); // display back on
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();

        let mut lcd = Lcd::new(&mut i2c, &mut delay)
            .with_address(ADDR)
            .with_columns(16)
            .with_rows(2);
        lcd.cursor_on(true).unwrap();
        lcd.cursor_blink(true).unwrap();
        lcd.display_on(false).unwrap();
        lcd.display_on(true).unwrap();

        drop(lcd);
        i2c.done();
    }

    #[test]
    fn legacy_backlight_off_keeps_the_flag_set() {
        // the inherited backlight-off path assigns the on value, pinned here
        // rather than corrected
        let expected = [
            I2cTransaction::write(ADDR, std::vec![0b0000_1000]),
            I2cTransaction::write(ADDR, std::vec![0b0000_1000]),
        ];
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();

        let mut lcd = Lcd::new(&mut i2c, &mut delay).with_address(ADDR);
        lcd.backlight(Backlight::On).unwrap();
        assert!(lcd.get_backlight());
        lcd.backlight(Backlight::Off).unwrap();
        assert!(lcd.get_backlight());

        drop(lcd);
        i2c.done();
    }

    #[test]
    fn strict_backlight_off_clears_the_flag() {
        let expected = [I2cTransaction::write(ADDR, std::vec![0b0000_0000])];
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();

        let mut lcd = Lcd::new(&mut i2c, &mut delay)
            .with_address(ADDR)
            .with_compat_mode(CompatMode::Strict);
        lcd.backlight(Backlight::Off).unwrap();
        assert!(!lcd.get_backlight());

        drop(lcd);
        i2c.done();
    }

    #[test]
    fn create_char_wraps_the_location_to_three_bits() {
        let glyph = [0x0e, 0x11, 0x11, 0x1f, 0x11, 0x11, 0x11, 0x00];
        // location 9 stores into slot 1 instead of being rejected
        let mut expected = send_frames(0x40 | (1 << 3), 0, 0x08);
        for row in glyph.iter() {
            expected.extend(send_frames(*row, 1, 0x08));
        }
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();

        let mut lcd = Lcd::new(&mut i2c, &mut delay).with_address(ADDR);
        lcd.create_char(9, glyph).unwrap();

        drop(lcd);
        i2c.done();
    }

    #[test]
    fn write_str_goes_through_the_data_register() {
        let mut expected = send_frames(b'H', 1, 0x08);
        expected.extend(send_frames(b'i', 1, 0x08));
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();

        let mut lcd = Lcd::new(&mut i2c, &mut delay).with_address(ADDR);
        lcd.write_str("Hi").unwrap();

        drop(lcd);
        i2c.done();
    }

    #[test]
    fn uwrite_goes_through_the_data_register() {
        let mut expected = send_frames(b'o', 1, 0x08);
        expected.extend(send_frames(b'k', 1, 0x08));
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();

        let mut lcd = Lcd::new(&mut i2c, &mut delay).with_address(ADDR);
        ufmt::uwrite!(lcd, "ok").unwrap();

        drop(lcd);
        i2c.done();
    }

    #[test]
    fn bus_faults_propagate_by_default() {
        let expected =
            [I2cTransaction::write(ADDR, std::vec![0b0000_1000]).with_error(ErrorKind::Other)];
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();

        let mut lcd = Lcd::new(&mut i2c, &mut delay).with_address(ADDR);
        assert_eq!(
            lcd.backlight(Backlight::On),
            Err(Error::Bus(ErrorKind::Other))
        );

        drop(lcd);
        i2c.done();
    }

    #[test]
    fn log_and_continue_swallows_bus_faults() {
        let expected =
            [I2cTransaction::write(ADDR, std::vec![0b0000_1000]).with_error(ErrorKind::Other)];
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();

        let mut lcd = Lcd::new(&mut i2c, &mut delay)
            .with_address(ADDR)
            .with_error_policy(ErrorPolicy::LogAndContinue);
        assert_eq!(lcd.backlight(Backlight::On), Ok(()));

        drop(lcd);
        i2c.done();
    }

    #[test]
    fn log_and_continue_finishes_the_frame_sequence() {
        // a faulted transfer mid-frame does not abort the remaining ones,
        // matching the historical behavior where a glitch desyncs hardware
        // and mirror but never stops the sequence
        let mut expected = send_frames(0x80 | (3 + 0x40), 0, 0x08);
        let faulted = expected[0].clone().with_error(ErrorKind::Other);
        expected[0] = faulted;
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay::new();

        let mut lcd = Lcd::new(&mut i2c, &mut delay)
            .with_address(ADDR)
            .with_columns(16)
            .with_rows(2)
            .with_error_policy(ErrorPolicy::LogAndContinue);
        assert_eq!(lcd.set_cursor(3, 1), Ok(()));

        drop(lcd);
        i2c.done();
    }
}
