// The three lookup tables of a relay. They only hold face ids, never faces,
//  so removing a face means sweeping its id out of each of them.

mod fib;
mod nonce;
mod pit;

pub use fib::{Fib, FibRule};
pub use nonce::NonceSet;
pub use pit::{Pending, Pit, PitEntry};
