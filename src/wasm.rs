//! WebAssembly bindings.
//!
//! A browser page plays the front panel: it calls `cycle` once per
//! animation frame and pokes bytes into memory.

use wasm_bindgen::prelude::*;
use crate::asm::{assemble, disassemble};
use crate::asm::disasm::disassemble_at;
use crate::cpu::{Cpu, Memory};
use crate::panel::{Button, FrontPanel, SwitchBank};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// The CPU and its memory, bundled for JavaScript.
#[wasm_bindgen]
pub struct WasmMachine {
    cpu: Cpu,
    mem: Memory,
}

#[wasm_bindgen]
impl WasmMachine {
    /// Create a machine with zeroed memory and a reset CPU.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let mut cpu = Cpu::new();
        cpu.reset();
        Self {
            cpu,
            mem: Memory::new(),
        }
    }

    /// Assemble `source` into memory at address 0 and reset the CPU.
    /// Returns the image size in bytes.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let image = assemble(source)
            .map_err(|e| JsError::new(&e.to_string()))?;

        self.mem.clear();
        self.mem.load(0, &image)
            .map_err(|e| JsError::new(&e.to_string()))?;
        self.cpu.reset();

        Ok(image.len())
    }

    /// Run one clock cycle.
    #[wasm_bindgen]
    pub fn cycle(&mut self) {
        self.cpu.cycle(&mut self.mem);
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    /// The front-panel HALT button.
    #[wasm_bindgen]
    pub fn halt(&mut self) {
        self.cpu.halt();
    }

    /// Deposit `value` at `address`, as the ENTER button does.
    #[wasm_bindgen]
    pub fn poke(&mut self, address: u8, value: u8) -> Result<(), JsError> {
        let mut panel = FrontPanel::new();
        panel.address = SwitchBank::from_byte(address);
        panel.value = SwitchBank::from_byte(value);
        panel.press(Button::Enter, &mut self.cpu, &mut self.mem)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Read the byte at `address`; 0 outside memory.
    #[wasm_bindgen]
    pub fn peek(&self, address: usize) -> u8 {
        self.mem.read(address).unwrap_or(0)
    }

    #[wasm_bindgen]
    pub fn program_counter(&self) -> u8 {
        self.cpu.regs.program_counter
    }

    #[wasm_bindgen]
    pub fn accumulator(&self) -> u8 {
        self.cpu.regs.accumulator
    }

    #[wasm_bindgen]
    pub fn overflow(&self) -> bool {
        self.cpu.flags.overflow
    }

    #[wasm_bindgen]
    pub fn zero(&self) -> bool {
        self.cpu.flags.zero
    }

    #[wasm_bindgen]
    pub fn error(&self) -> bool {
        self.cpu.flags.error
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.cpu.state())
    }

    /// The instruction at the program counter.
    #[wasm_bindgen]
    pub fn current_instruction(&self) -> String {
        let pc = self.cpu.regs.program_counter as usize;
        disassemble_at(&self.mem.as_slice()[..=u8::MAX as usize], pc).0
    }

    /// The CPU addressable page (first 256 bytes).
    #[wasm_bindgen]
    pub fn memory_page(&self) -> Vec<u8> {
        self.mem.as_slice()[..=u8::MAX as usize].to_vec()
    }

    /// Get registers and flags as a JSON string.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu)
            .map_err(|e| JsError::new(&e.to_string()))
    }
}

impl Default for WasmMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return the image size.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<usize, JsError> {
    let image = assemble(source)
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(image.len())
}

/// Disassemble an image to a listing.
#[wasm_bindgen]
pub fn wasm_disassemble(image: &[u8]) -> String {
    disassemble(image)
}
