//! Front panel application state and logic.

use crate::asm::disasm::disassemble_at;
use crate::cpu::{Cpu, Memory};
use crate::panel::{Button, FrontPanel, TAPE_ROWS};

/// The switch row under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Address,
    Value,
    Tape(usize),
}

impl Row {
    fn up(self) -> Self {
        match self {
            Row::Address => Row::Address,
            Row::Value => Row::Address,
            Row::Tape(0) => Row::Value,
            Row::Tape(n) => Row::Tape(n - 1),
        }
    }

    fn down(self) -> Self {
        match self {
            Row::Address => Row::Value,
            Row::Value => Row::Tape(0),
            Row::Tape(n) => Row::Tape((n + 1).min(TAPE_ROWS - 1)),
        }
    }
}

/// Front panel application state.
pub struct PanelApp {
    /// The CPU.
    pub cpu: Cpu,
    /// Main memory.
    pub mem: Memory,
    /// Switches and tape.
    pub panel: FrontPanel,
    /// Image loaded at start-up, for reloading.
    pub program: Vec<u8>,
    /// Cursor position: switch row and column.
    pub cursor: (Row, usize),
    /// Is the clock stopped?
    pub paused: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
}

impl PanelApp {
    /// Create a panel with `program` in memory and the CPU reset.
    pub fn new(program: Vec<u8>) -> Self {
        let mut app = Self {
            cpu: Cpu::new(),
            mem: Memory::new(),
            panel: FrontPanel::new(),
            program,
            cursor: (Row::Address, 0),
            paused: false,
            should_quit: false,
            status: String::new(),
        };
        app.reload();
        app
    }

    /// One clock tick: called once per frame while the clock runs.
    pub fn tick(&mut self) {
        if !self.paused {
            self.cpu.cycle(&mut self.mem);
        }
    }

    /// Single-step while paused.
    pub fn step(&mut self) {
        self.cpu.cycle(&mut self.mem);
        self.status = format!("Cycle {}: {:?}", self.cpu.cycles, self.cpu.state());
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        self.status = if self.paused { "Clock stopped.".into() } else { "Clock running.".into() };
    }

    /// Press a panel button.
    pub fn press(&mut self, button: Button) {
        self.status = match self.panel.press(button, &mut self.cpu, &mut self.mem) {
            Ok(()) => format!("{:?}", button),
            Err(e) => format!("{:?} failed: {}", button, e),
        };
    }

    /// Clear memory, reload the start-up image and reset the CPU.
    pub fn reload(&mut self) {
        self.mem.clear();
        self.cpu.reset();
        self.status = match self.mem.load(0, &self.program) {
            Ok(()) => format!("Loaded {} bytes. Space toggles, Enter deposits.", self.program.len()),
            Err(e) => format!("Load failed: {}", e),
        };
    }

    pub fn move_up(&mut self) {
        self.cursor.0 = self.cursor.0.up();
    }

    pub fn move_down(&mut self) {
        self.cursor.0 = self.cursor.0.down();
    }

    pub fn move_left(&mut self) {
        self.cursor.1 = self.cursor.1.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor.1 = (self.cursor.1 + 1).min(7);
    }

    /// Flip the switch (or tape hole) under the cursor.
    pub fn toggle(&mut self) {
        let (row, column) = self.cursor;
        match row {
            Row::Address => self.panel.address.toggle(column),
            Row::Value => self.panel.value.toggle(column),
            Row::Tape(n) => self.panel.tape.toggle(n, column),
        }
    }

    /// Disassembly starting a few bytes before the PC.
    ///
    /// Each entry is (address, text, is_current).
    pub fn get_disassembly(&self, lines: usize) -> Vec<(usize, String, bool)> {
        let window = &self.mem.as_slice()[..=u8::MAX as usize];
        let pc = self.cpu.regs.program_counter as usize;
        let mut addr = pc.saturating_sub(lines / 4);
        let mut out = Vec::with_capacity(lines);

        while out.len() < lines && addr < window.len() {
            let (text, width) = disassemble_at(window, addr);
            out.push((addr, text, addr == pc));
            addr += width.max(1);
        }

        out
    }
}

/// Puts the terminal in raw mode on the alternate screen and undoes both
/// when dropped, whichever way the panel exits.
struct RawTerminal;

impl RawTerminal {
    fn enter() -> std::io::Result<Self> {
        use crossterm::{terminal::{enable_raw_mode, EnterAlternateScreen}, ExecutableCommand};

        enable_raw_mode()?;
        let guard = RawTerminal;
        std::io::stdout().execute(EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        use crossterm::{terminal::{disable_raw_mode, LeaveAlternateScreen}, ExecutableCommand};

        if let Err(e) = disable_raw_mode() {
            log::error!("failed to leave raw mode: {}", e);
        }
        if let Err(e) = std::io::stdout().execute(LeaveAlternateScreen) {
            log::error!("failed to leave alternate screen: {}", e);
        }
    }
}

/// Run the front panel with a program, one CPU cycle per frame.
pub fn run_panel(program: Vec<u8>, hz: u32) -> std::io::Result<()> {
    use crossterm::event::{self, Event, KeyCode, KeyEventKind};
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::{Duration, Instant};

    let frame = Duration::from_secs(1) / hz.max(1);

    let _raw = RawTerminal::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = PanelApp::new(program);
    let mut last_tick = Instant::now();
    log::info!("front panel running at {} Hz", hz);

    loop {
        terminal.draw(|f| {
            super::ui::draw(f, &app);
        })?;

        // Handle input until the frame is due
        let timeout = frame.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                        KeyCode::Char('r') => app.press(Button::Reset),
                        KeyCode::Char('h') => app.press(Button::Halt),
                        KeyCode::Enter => app.press(Button::Enter),
                        KeyCode::Char('t') => app.press(Button::LoadTape),
                        KeyCode::Char('x') => app.reload(),
                        KeyCode::Char('p') => app.toggle_pause(),
                        KeyCode::Char('s') if app.paused => app.step(),
                        KeyCode::Char(' ') => app.toggle(),
                        KeyCode::Up => app.move_up(),
                        KeyCode::Down => app.move_down(),
                        KeyCode::Left => app.move_left(),
                        KeyCode::Right => app.move_right(),
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }

        if last_tick.elapsed() >= frame {
            app.tick();
            last_tick = Instant::now();
        }
    }
}
