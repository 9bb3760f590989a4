//! Stack operations trait for the VM.
//!
//! Popping never fails: an exhausted stack yields `Nothing`, so a malformed
//! program degrades to absent values instead of aborting the host.

use crate::value::Value;

pub trait StackOps {
    /// Pop the top value, or `Nothing` when empty.
    fn pop_value(&mut self) -> Value;

    /// Pop `count` values, returned in push order.
    fn pop_many(&mut self, count: usize) -> Vec<Value>;

    /// Clone of the top value, or `Nothing` when empty.
    fn peek_value(&self) -> Value;
}

impl StackOps for Vec<Value> {
    fn pop_value(&mut self) -> Value {
        self.pop().unwrap_or_default()
    }

    fn pop_many(&mut self, count: usize) -> Vec<Value> {
        let split = self.len().saturating_sub(count);
        let mut values = self.split_off(split);
        // Pad so callers always see `count` values
        while values.len() < count {
            values.insert(0, Value::Nothing);
        }
        values
    }

    fn peek_value(&self) -> Value {
        self.last().cloned().unwrap_or_default()
    }
}
