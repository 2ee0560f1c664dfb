//! Connection listing for Darwin via the `pcblist_n` sysctl.
//!
//! The kernel answers `net.inet.tcp.pcblist_n` and `net.inet.udp.pcblist_n`
//! with a single binary buffer describing every protocol control block at
//! that instant. This crate captures that buffer once and decodes it into
//! typed [`ConnectionEntry`] values: local and remote endpoint, PCB flags,
//! socket buffer stats and, for TCP, the connection state.
//!
//! # Example
//!
//! ```ignore
//! use xpcb::{Protocol, Snapshot};
//!
//! fn main() -> xpcb::Result<()> {
//!     for entry in Snapshot::open(Protocol::Tcp)? {
//!         println!("{} -> {} {}", entry.local, entry.remote, entry.state.name());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Iteration is a forward-only scan over the captured buffer and never
//! touches the kernel again; open a new [`Snapshot`] for a fresh view.
//! Only IPv4 entries are reported.

pub mod error;
pub mod output;
pub mod pcblist;
pub mod snapshot;
pub mod sysctl;

// Re-export common types at crate root for convenience
pub use error::{Error, Result};
pub use pcblist::{ConnectionEntry, Protocol, SnapshotDecoder, TcpState};
pub use snapshot::Snapshot;
