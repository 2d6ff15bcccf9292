//! Fatal/structured error types. Everything here corresponds to the spec's
//! "capacity exhaustion" class: conditions that are a deployment sizing bug,
//! not something a caller can recover from mid-run.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum PoolError {
    #[error("order pool exhausted: all {0} slots are live")]
    OutOfCapacity(usize),
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum OrderIndexError {
    #[error("order index probe bound ({0}) exceeded inserting key")]
    ProbeOverflow(usize),
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum BookError {
    #[error("order pool exhausted")]
    Pool(#[from] PoolError),
    #[error("order index probe overflow")]
    Index(#[from] OrderIndexError),
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum AffinityError {
    #[error("platform affinity syscall returned {0}")]
    SyscallFailed(i32),
    #[error("CPU affinity pinning is not implemented on this platform")]
    UnsupportedPlatform,
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum EngineError {
    #[error("symbol table full: cannot create a book for a new symbol ({0} already tracked)")]
    SymbolTableFull(usize),
    #[error("order-key-to-symbol index probe bound exceeded")]
    KeyIndexOverflow,
    #[error(transparent)]
    Book(#[from] BookError),
}
