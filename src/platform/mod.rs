// Hosting glue for running a relay on a real operating system. The relay
//  itself never touches sockets or clocks; everything here feeds it.

mod native;

pub use native::*;
