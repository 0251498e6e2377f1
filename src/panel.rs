//! Front panel.
//!
//! The switches, paper tape and lamps the operator uses to get bytes into
//! memory and see what the CPU is doing. This is pure state; drawing it is
//! left to a front end (see the `tui` module).

use crate::cpu::{Cpu, Memory, MemoryError};

/// Rows on the paper tape reader.
pub const TAPE_ROWS: usize = 22;

/// Eight toggle switches, read left to right with the leftmost switch as
/// the most significant bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchBank {
    up: [bool; 8],
}

impl SwitchBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the switches to show `byte`.
    pub fn from_byte(byte: u8) -> Self {
        Self { up: leds(byte) }
    }

    /// Flip switch `index` (0 is the leftmost).
    pub fn toggle(&mut self, index: usize) {
        if let Some(switch) = self.up.get_mut(index) {
            *switch = !*switch;
        }
    }

    pub fn is_up(&self, index: usize) -> bool {
        self.up.get(index).copied().unwrap_or(false)
    }

    /// The byte the switches spell out.
    pub fn read_byte(&self) -> u8 {
        self.up
            .iter()
            .fold(0, |byte, &up| (byte << 1) | u8::from(up))
    }

    pub fn switches(&self) -> &[bool; 8] {
        &self.up
    }
}

/// A strip of paper tape: one row of eight holes per memory cell,
/// loaded from address 0 upwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperTape {
    rows: [SwitchBank; TAPE_ROWS],
}

impl PaperTape {
    pub fn new() -> Self {
        Self {
            rows: [SwitchBank::new(); TAPE_ROWS],
        }
    }

    /// Punch a tape from the first `TAPE_ROWS` bytes of `image`.
    pub fn from_image(image: &[u8]) -> Self {
        let mut tape = Self::new();
        for (row, &byte) in tape.rows.iter_mut().zip(image) {
            *row = SwitchBank::from_byte(byte);
        }
        tape
    }

    /// Punch (or glue shut) one hole.
    pub fn toggle(&mut self, row: usize, column: usize) {
        if let Some(bank) = self.rows.get_mut(row) {
            bank.toggle(column);
        }
    }

    pub fn rows(&self) -> &[SwitchBank; TAPE_ROWS] {
        &self.rows
    }

    /// Copy every row into memory, row `i` to address `i`.
    pub fn load(&self, mem: &mut Memory) -> Result<(), MemoryError> {
        let bytes: Vec<u8> = self.rows.iter().map(SwitchBank::read_byte).collect();
        mem.load(0, &bytes)
    }
}

impl Default for PaperTape {
    fn default() -> Self {
        Self::new()
    }
}

/// Panel buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Reset,
    Halt,
    Enter,
    LoadTape,
}

/// The whole operator panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontPanel {
    pub address: SwitchBank,
    pub value: SwitchBank,
    pub tape: PaperTape,
}

impl FrontPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// ENTER: write the value switches to the address switches.
    pub fn deposit(&self, mem: &mut Memory) -> Result<(), MemoryError> {
        let address = self.address.read_byte();
        let value = self.value.read_byte();
        log::debug!("deposit {:#04x} at {:#04x}", value, address);
        mem.write(address as usize, value)
    }

    /// LOAD TAPE: copy the paper tape into memory from address 0.
    pub fn load_tape(&self, mem: &mut Memory) -> Result<(), MemoryError> {
        self.tape.load(mem)
    }

    /// Act on a button press.
    pub fn press(&self, button: Button, cpu: &mut Cpu, mem: &mut Memory) -> Result<(), MemoryError> {
        match button {
            Button::Reset => cpu.reset(),
            Button::Halt => cpu.halt(),
            Button::Enter => self.deposit(mem)?,
            Button::LoadTape => self.load_tape(mem)?,
        }
        Ok(())
    }
}

/// Lamp pattern for `byte`, most significant bit first.
pub fn leds(byte: u8) -> [bool; 8] {
    std::array::from_fn(|i| byte & (0x80 >> i) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Fault;

    #[test]
    fn test_switches_are_msb_first() {
        let mut bank = SwitchBank::new();
        bank.toggle(0);
        bank.toggle(7);

        assert_eq!(bank.read_byte(), 0x81);
        assert!(bank.is_up(0));
        assert!(!bank.is_up(1));
        assert!(!bank.is_up(8));
    }

    #[test]
    fn test_from_byte_matches_read_byte() {
        for byte in [0x00, 0x01, 0x56, 0x80, 0xff] {
            assert_eq!(SwitchBank::from_byte(byte).read_byte(), byte);
        }
    }

    #[test]
    fn test_leds() {
        assert_eq!(leds(0xa0), [true, false, true, false, false, false, false, false]);
    }

    #[test]
    fn test_deposit() {
        let mut panel = FrontPanel::new();
        let mut mem = Memory::new();
        panel.address = SwitchBank::from_byte(0x30);
        panel.value = SwitchBank::from_byte(42);

        panel.deposit(&mut mem).unwrap();

        assert_eq!(mem.read(0x30).unwrap(), 42);
    }

    #[test]
    fn test_load_tape_overwrites_first_rows() {
        let mut mem = Memory::new();
        mem.write(TAPE_ROWS, 9).unwrap();
        let mut tape = PaperTape::from_image(&[0x01, 0x05, 0x04]);
        tape.toggle(3, 7);

        tape.load(&mut mem).unwrap();

        assert_eq!(mem.dump(0, 5), vec![(0, 0x01), (1, 0x05), (2, 0x04), (3, 0x01), (4, 0)]);
        assert_eq!(mem.read(TAPE_ROWS).unwrap(), 9);
    }

    #[test]
    fn test_buttons_drive_the_machine() {
        let mut panel = FrontPanel::new();
        let mut cpu = Cpu::new();
        let mut mem = Memory::new();
        cpu.reset();

        // JMP 0x00, toggled in from the switches.
        panel.value = SwitchBank::from_byte(0x05);
        panel.press(Button::Enter, &mut cpu, &mut mem).unwrap();
        assert_eq!(mem.read(0).unwrap(), 0x05);

        cpu.cycle(&mut mem);
        panel.press(Button::Halt, &mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.fault(), Some(Fault::Manual));

        panel.press(Button::Reset, &mut cpu, &mut mem).unwrap();
        assert!(!cpu.flags.error);
    }
}
