use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("call stack capacity of {max_len} exceeded, pushing of address {address_not_pushed:X} failed")]
pub struct CallStackCapacityExceededError {
    pub address_not_pushed: u16,
    pub max_len: usize,
}

/// Return addresses of the subroutines currently being executed.
///
/// Never grows beyond the maximum length it was created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStack {
    addresses: Vec<u16>,
    max_len: usize,
}

impl CallStack {
    /// The nesting depth of the canonical CHIP-8 interpreters.
    pub const DEFAULT_MAX_LEN: usize = 16;

    pub fn new_with_max_len(max_len: usize) -> Self {
        Self {
            addresses: Vec::with_capacity(max_len),
            max_len,
        }
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// The return addresses, innermost call last.
    pub fn as_slice(&self) -> &[u16] {
        &self.addresses
    }

    pub fn pop(&mut self) -> Option<u16> {
        self.addresses.pop()
    }

    pub fn push(&mut self, address: u16) -> Result<(), CallStackCapacityExceededError> {
        if self.addresses.len() < self.max_len {
            self.addresses.push(address);
            Ok(())
        } else {
            Err(CallStackCapacityExceededError {
                address_not_pushed: address,
                max_len: self.max_len,
            })
        }
    }

    pub fn clear(&mut self) {
        self.addresses.clear();
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new_with_max_len(Self::DEFAULT_MAX_LEN)
    }
}
