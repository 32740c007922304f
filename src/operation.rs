//! Operation identities, timing markers and per-interface registration tables
//!
//! A capability interface is a Rust trait. Instead of inspecting methods at
//! runtime, each interface publishes a `'static` table of its operations with
//! a yes/no timing marker per operation. The table is turned into an
//! [`OperationTable`] once, when a proxy is built, and consulted on every
//! call.

use crate::error::ConstructionError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Stable identity of a declared operation: its name plus rendered signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OperationId {
    pub name: &'static str,
    pub signature: &'static str,
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A declared operation and its timing marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    id: OperationId,
    profiled: bool,
}

impl Operation {
    /// Declare an operation
    pub const fn new(name: &'static str, signature: &'static str, profiled: bool) -> Self {
        Self {
            id: OperationId { name, signature },
            profiled,
        }
    }

    /// Declare an operation that carries the timing marker
    pub const fn profiled(name: &'static str, signature: &'static str) -> Self {
        Self::new(name, signature, true)
    }

    /// Declare an operation that is forwarded without measurement
    pub const fn passthrough(name: &'static str, signature: &'static str) -> Self {
        Self::new(name, signature, false)
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.id.name
    }

    /// Whether calls to this operation are measured
    pub fn is_profiled(&self) -> bool {
        self.profiled
    }
}

/// A capability interface whose operations can be intercepted
///
/// Implemented for `dyn Trait` by [`profiled_interface!`](crate::profiled_interface),
/// or by hand:
///
/// ```
/// use calltime::{Interface, Operation};
///
/// pub trait Fetcher {
///     fn fetch(&self, url: &str) -> usize;
/// }
///
/// impl Interface for dyn Fetcher {
///     const NAME: &'static str = "Fetcher";
///
///     fn operations() -> &'static [Operation] {
///         const OPERATIONS: &[Operation] =
///             &[Operation::profiled("fetch", "fn fetch(&self, url: &str) -> usize")];
///         OPERATIONS
///     }
/// }
///
/// assert_eq!(<dyn Fetcher as Interface>::operations().len(), 1);
/// ```
pub trait Interface {
    /// Interface name, used in diagnostics
    const NAME: &'static str;

    /// Every operation the interface declares
    fn operations() -> &'static [Operation];
}

/// Registration table consulted by the interceptor on every call
#[derive(Debug, Clone)]
pub struct OperationTable {
    interface: &'static str,
    by_name: HashMap<&'static str, Operation>,
}

impl OperationTable {
    /// Build the table for interface `I`
    ///
    /// Fails if two operations share a name, since calls are routed by name.
    pub fn for_interface<I: Interface + ?Sized>() -> Result<Self, ConstructionError> {
        Self::build(I::NAME, I::operations())
    }

    pub(crate) fn build(
        interface: &'static str,
        operations: &'static [Operation],
    ) -> Result<Self, ConstructionError> {
        let mut by_name = HashMap::with_capacity(operations.len());
        for operation in operations {
            if by_name.insert(operation.name(), *operation).is_some() {
                return Err(ConstructionError::DuplicateOperation {
                    interface,
                    operation: operation.name(),
                });
            }
        }
        Ok(Self { interface, by_name })
    }

    pub fn interface(&self) -> &'static str {
        self.interface
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.by_name.get(name)
    }

    /// Number of operations carrying the timing marker
    pub fn profiled_count(&self) -> usize {
        self.by_name.values().filter(|op| op.is_profiled()).count()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
