//! Mock transport for exercising the gateway without a bus

use avionics_intranet::protocol::WORD_LEN;
use avionics_intranet::Transport;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Records transactions performed on the mock transport
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Word read
    Read {
        /// Bus address of the board
        bus: u8,
        /// Register address
        register: u8,
    },
    /// Word write
    Write {
        /// Bus address of the board
        bus: u8,
        /// Register address
        register: u8,
        /// Raw bytes as they went out on the wire
        bytes: [u8; WORD_LEN],
    },
}

/// Faults the mock can inject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFault {
    Nack,
    Timeout,
}

#[derive(Debug, Default)]
struct MockState {
    /// Simulated register words (bus, register) -> bytes
    registers: HashMap<(u8, u8), [u8; WORD_LEN]>,

    /// Operations log for verification
    operations: Vec<Operation>,

    /// Failure injection
    fail_next_read: Option<MockFault>,
    fail_next_write: Option<MockFault>,
}

/// Mock transport (shared state, so tests keep a handle after moving a
/// clone into the gateway)
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload the word a board will answer with
    pub fn set_word(&self, bus: u8, register: u8, word: u32) {
        self.state
            .borrow_mut()
            .registers
            .insert((bus, register), word.to_le_bytes());
    }

    /// Current word held for (bus, register)
    pub fn word(&self, bus: u8, register: u8) -> Option<u32> {
        self.state
            .borrow()
            .registers
            .get(&(bus, register))
            .map(|bytes| u32::from_le_bytes(*bytes))
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.state.borrow().operations.clone()
    }

    pub fn transaction_count(&self) -> usize {
        self.state.borrow().operations.len()
    }

    pub fn clear_operations(&self) {
        self.state.borrow_mut().operations.clear();
    }

    pub fn fail_next_read(&self, fault: MockFault) {
        self.state.borrow_mut().fail_next_read = Some(fault);
    }

    pub fn fail_next_write(&self, fault: MockFault) {
        self.state.borrow_mut().fail_next_write = Some(fault);
    }
}

impl Transport for MockTransport {
    type Error = MockFault;

    fn read_word(&mut self, bus_address: u8, register: u8) -> Result<[u8; WORD_LEN], MockFault> {
        let mut state = self.state.borrow_mut();
        state.operations.push(Operation::Read {
            bus: bus_address,
            register,
        });
        if let Some(fault) = state.fail_next_read.take() {
            return Err(fault);
        }
        Ok(state
            .registers
            .get(&(bus_address, register))
            .copied()
            .unwrap_or([0; WORD_LEN]))
    }

    fn write_word(
        &mut self,
        bus_address: u8,
        register: u8,
        word: [u8; WORD_LEN],
    ) -> Result<(), MockFault> {
        let mut state = self.state.borrow_mut();
        state.operations.push(Operation::Write {
            bus: bus_address,
            register,
            bytes: word,
        });
        if let Some(fault) = state.fail_next_write.take() {
            return Err(fault);
        }
        state.registers.insert((bus_address, register), word);
        Ok(())
    }
}
