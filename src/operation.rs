//! Names for the engine operations that touch the remote store.
//!
//! Used to tag log records and transport errors.

use std::fmt;

/// An engine operation that issues one or more remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Establish the client connection.
    Connect,
    /// Fetch and decode a value.
    Read,
    /// Encode and store a value.
    Write,
    /// Atomic INCRBY.
    Increment,
    /// Atomic DECRBY.
    Decrement,
    /// Delete a single key.
    Delete,
    /// Delete every key under the engine prefix.
    Clear,
    /// Compute the current group tokens.
    Groups,
    /// Bump a group version.
    ClearGroup,
    /// Conditional create.
    Add,
}

impl Operation {
    /// Get the string representation of this operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Connect => "connect",
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Increment => "increment",
            Operation::Decrement => "decrement",
            Operation::Delete => "delete",
            Operation::Clear => "clear",
            Operation::Groups => "groups",
            Operation::ClearGroup => "clear_group",
            Operation::Add => "add",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
