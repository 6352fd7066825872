//! Runtime: machine state, process construction and instruction semantics

pub mod exec;
pub mod loader;
pub mod memory;
pub mod process;
pub mod regs;

pub use exec::execute;
pub use loader::{LoadOptions, StackSize, DEFAULT_STACK_SIZE};
pub use memory::{AddressSpace, Permissions, Segment, SegmentId, Width};
pub use process::Process;
pub use regs::{abi, RegIndex, RegisterFile};
