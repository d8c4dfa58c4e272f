//! The datagram wire format: `Event` encoding/decoding and the transport that
//! moves it between floor, scheduler, and car processes.

pub mod event;
pub mod transport;

pub use event::{Event, Fault, HallDirection};
pub use transport::{DatagramTransport, MAX_DATAGRAM_BYTES};
