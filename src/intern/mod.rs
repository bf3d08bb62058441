//! Identity registry handing out one shared instance per key.

mod interner;

pub use interner::Interner;
