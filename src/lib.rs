//#![warn(missing_docs)]

extern crate alloc;

pub mod addr;

pub mod buffer;

pub mod clock;

pub mod config;

pub mod error;

pub mod face;

pub mod frag;

pub mod hash;

pub mod mgmt;

pub mod name;

pub mod packet;

pub mod platform;

pub mod relay;

pub mod sched;

pub mod store;

pub mod tables;

pub mod timer;

pub mod tlv;

pub use addr::FaceAddr;
pub use buffer::Buffer;
pub use clock::{Clock, Timestamp};
pub use config::{InterfaceConfig, RelayConfig};
pub use error::{Error, Result};
pub use face::{FaceFlags, FaceId, Transport};
pub use mgmt::{LocalManagement, ManagementHandler};
pub use name::Name;
pub use packet::{Codec, DataBuilder, InterestBuilder, NdnTlv, ParsedPacket};
pub use relay::{Relay, RxOutcome};
