//! Decoding of the Darwin `pcblist_n` socket listing.
//!
//! The kernel answers `net.inet.{tcp,udp}.pcblist_n` with a generation
//! header followed by a stream of length-prefixed, kind-tagged records,
//! each occupying an 8-byte-rounded slot. One logical connection is spread
//! over several records (socket descriptor, buffer stats, control blocks)
//! that arrive as an unordered bag; [`SnapshotDecoder`] regroups them and
//! yields one [`ConnectionEntry`] per connection that matches the requested
//! protocol, was not created after the snapshot was taken, and is IPv4.
//!
//! The wire layout lives entirely in [`record`] and [`layout`]; porting
//! this crate to another kernel's equivalent facility means replacing those
//! two modules, not the decoder.

pub mod decoder;
pub mod layout;
pub mod record;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use decoder::{DecodeDiagnostics, SnapshotDecoder};
pub use record::{RecordHdr, RecordKind, XinpGen};
pub use types::{ConnectionEntry, Protocol, SockbufInfo, TcpState, TrafficStats};
