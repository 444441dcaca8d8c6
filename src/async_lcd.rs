use embedded_hal_async::{delay::DelayNs, i2c::I2c};

use crate::{
    Backlight, Command, CompatMode, Error, ErrorPolicy, Font, Mode, BLINK_OFF, BLINK_ON,
    CURSOR_OFF, CURSOR_ON, DISPLAY_MOVE, DISPLAY_ON, ENABLE, ENTRY_LEFT, ENTRY_SHIFT_DECREMENT,
    ENTRY_SHIFT_INCREMENT, LINES_1, LINES_2, MODE_4BIT, MOVE_LEFT, MOVE_RIGHT, ROW_OFFSETS,
};

/// API to write to the LCD.
///
/// Async twin of [`crate::sync_lcd::Lcd`]. The protocol's mandatory waits
/// become await points here, so an executor can interleave other work while
/// the controller settles.
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

    /// Initializes the hardware, see [`crate::sync_lcd::Lcd::init`].
    pub async fn init(mut self) -> Result<Self, Error<I::Error>> {
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
        self.delay.delay_ms(50).await;

        // latch the backlight bit before the first instruction
        self.write_expander(0x00).await?;
        self.delay.delay_ms(1000).await;

        self.send_nibble(0x03 << 4).await?;
        self.delay.delay_us(4500).await;
        self.send_nibble(0x03 << 4).await?;
        self.delay.delay_us(4500).await;
        self.send_nibble(0x03 << 4).await?;
        self.delay.delay_us(4500).await;

        // lock in 4-bit interface mode
        self.send_nibble(0x02 << 4).await?;

        self.command(Command::FunctionSet as u8 | self.display_function)
            .await?;

        self.display_control = DISPLAY_ON | CURSOR_OFF | BLINK_OFF;
        self.command(Command::DisplayControl as u8 | self.display_control)
            .await?;

        self.clear().await?;

        // default text direction for roman languages
        self.display_mode = ENTRY_LEFT | ENTRY_SHIFT_DECREMENT;
        self.command(Command::EntryModeSet as u8 | self.display_mode)
            .await?;

        self.return_home().await?;
        Ok(self)
    }

    async fn write_expander(&mut self, data: u8) -> Result<(), Error<I::Error>> {
        let frame = data | self.backlight_state as u8;
        match self.i2c.write(self.address, &[frame]).await {
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

    async fn pulse_enable(&mut self, data: u8) -> Result<(), Error<I::Error>> {
        self.write_expander(data | ENABLE).await?;
        self.delay.delay_us(1).await; // enable pulse width must be >450ns
        self.write_expander(data & !ENABLE).await?;
        self.delay.delay_us(50).await; // commands need >37us to settle
        Ok(())
    }

    async fn send_nibble(&mut self, nibble: u8) -> Result<(), Error<I::Error>> {
        self.write_expander(nibble).await?;
        self.pulse_enable(nibble).await
    }

    async fn send(&mut self, data: u8, mode: Mode) -> Result<(), Error<I::Error>> {
        let high_bits: u8 = data & 0xf0;
        let low_bits: u8 = (data << 4) & 0xf0;
        self.pulse_enable(high_bits | mode as u8).await?;
        self.pulse_enable(low_bits | mode as u8).await
    }

    async fn command(&mut self, data: u8) -> Result<(), Error<I::Error>> {
        self.send(data, Mode::Cmd).await
    }

    /// Clear the display and move the cursor to the upper left corner.
    pub async fn clear(&mut self) -> Result<(), Error<I::Error>> {
        self.command(Command::Clear as u8).await?;
        self.delay.delay_ms(2).await; // long-running instruction
        Ok(())
    }

    /// Return cursor to upper left corner, i.e. (0,0). Content is kept.
    pub async fn return_home(&mut self) -> Result<(), Error<I::Error>> {
        self.command(Command::ReturnHome as u8).await?;
        self.delay.delay_ms(2).await; // long-running instruction
        Ok(())
    }

    /// Set the cursor to (col, row). Coordinates are zero-based, see
    /// [`crate::sync_lcd::Lcd::set_cursor`] for the legacy clamp rules.
    pub async fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Error<I::Error>> {
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
            .await
    }

    /// Switch the display on or off. DDRAM content survives while it is
    /// off and reappears unchanged when switched back on.
    pub async fn display_on(&mut self, on: bool) -> Result<(), Error<I::Error>> {
        if on {
            self.display_control |= DISPLAY_ON;
        } else {
            self.display_control &= !DISPLAY_ON;
        }
        self.command(Command::DisplayControl as u8 | self.display_control)
            .await
    }

    /// Show or hide the cursor indicator.
    pub async fn cursor_on(&mut self, on: bool) -> Result<(), Error<I::Error>> {
        if on {
            self.display_control |= CURSOR_ON;
        } else {
            self.display_control &= !CURSOR_ON;
        }
        self.command(Command::DisplayControl as u8 | self.display_control)
            .await
    }

    /// Set if the cursor is blinking.
    pub async fn cursor_blink(&mut self, blink: bool) -> Result<(), Error<I::Error>> {
        if blink {
            self.display_control |= BLINK_ON;
        } else {
            self.display_control &= !BLINK_ON;
        }
        self.command(Command::DisplayControl as u8 | self.display_control)
            .await
    }

    /// Shift the display with every written character so the cursor stays
    /// put, i.e. right-justify text from the cursor.
    pub async fn autoscroll(&mut self, on: bool) -> Result<(), Error<I::Error>> {
        if on {
            self.display_mode |= ENTRY_SHIFT_INCREMENT;
        } else {
            self.display_mode &= !ENTRY_SHIFT_INCREMENT;
        }
        self.command(Command::EntryModeSet as u8 | self.display_mode)
            .await
    }

    /// Text flows left to right from the cursor.
    pub async fn left_to_right(&mut self) -> Result<(), Error<I::Error>> {
        self.display_mode |= ENTRY_LEFT;
        self.command(Command::EntryModeSet as u8 | self.display_mode)
            .await
    }

    /// Text flows right to left from the cursor.
    pub async fn right_to_left(&mut self) -> Result<(), Error<I::Error>> {
        self.display_mode &= !ENTRY_LEFT;
        self.command(Command::EntryModeSet as u8 | self.display_mode)
            .await
    }

    /// Scrolls the display one char to the left
    pub async fn scroll_display_left(&mut self) -> Result<(), Error<I::Error>> {
        self.command(Command::CursorShift as u8 | DISPLAY_MOVE | MOVE_LEFT)
            .await
    }

    /// Scrolls the display one char to the right
    pub async fn scroll_display_right(&mut self) -> Result<(), Error<I::Error>> {
        self.command(Command::CursorShift as u8 | DISPLAY_MOVE | MOVE_RIGHT)
            .await
    }

    /// Switch the backlight, see [`crate::sync_lcd::Lcd::backlight`] for
    /// the legacy off-path quirk.
    pub async fn backlight(&mut self, backlight: Backlight) -> Result<(), Error<I::Error>> {
        self.backlight_state = match self.compat {
            CompatMode::Legacy => Backlight::On,
            CompatMode::Strict => backlight,
        };
        self.write_expander(0x00).await
    }

    /// In-memory backlight state, the hardware is never queried.
    pub fn get_backlight(&self) -> bool {
        self.backlight_state == Backlight::On
    }

    /// Store a custom glyph in one of the eight CGRAM slots, one byte per
    /// pixel row. `location` silently wraps to 0-7.
    pub async fn create_char(
        &mut self,
        location: u8,
        charmap: [u8; 8],
    ) -> Result<(), Error<I::Error>> {
        let location = location & 0x7;
        self.command(Command::SetCgramAddr as u8 | (location << 3))
            .await?;
        for row in charmap.iter() {
            self.write_byte(*row).await?;
        }
        Ok(())
    }

    /// Write a single raw byte at the cursor position. Values 0-7 address
    /// the custom glyphs.
    pub async fn write_byte(&mut self, data: u8) -> Result<(), Error<I::Error>> {
        self.send(data, Mode::Data).await
    }

    /// Write string to display.
    pub async fn write_str(&mut self, data: &str) -> Result<(), Error<I::Error>> {
        for c in data.chars() {
            self.write_byte(c as u8).await?;
        }
        Ok(())
    }
}
