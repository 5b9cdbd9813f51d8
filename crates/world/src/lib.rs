mod amplifier;
mod chunk;
mod storage;
mod world;

pub use amplifier::*;
pub use chunk::*;
pub use storage::*;
pub use world::*;
