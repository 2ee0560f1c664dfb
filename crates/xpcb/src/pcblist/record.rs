//! Wire headers for the `pcblist_n` record stream.
//!
//! A snapshot starts with a 24-byte generation header (`struct xinpgen`).
//! Every sub-record after it begins with an 8-byte header declaring its
//! total length and kind, and occupies [`roundup8`]`(len)` bytes in the
//! stream. The kernel terminates the list with a second copy of the
//! generation header, which shows up as a record whose declared length is
//! no larger than the generation header itself.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Record alignment boundary (Darwin's `ROUNDUP64`).
pub const RECORD_ALIGNTO: usize = 8;

/// Round a length up to the record alignment boundary.
#[inline]
pub const fn roundup8(len: usize) -> usize {
    (len + RECORD_ALIGNTO - 1) & !(RECORD_ALIGNTO - 1)
}

/// Size of the generation header (`struct xinpgen`).
pub const XINPGEN_SIZE: usize = std::mem::size_of::<XinpGen>();

/// Size of the sub-record header (`struct xgen_n`).
pub const RECORD_HDRLEN: usize = std::mem::size_of::<RecordHdr>();

/// Generation header at the start of a snapshot (mirrors `struct xinpgen`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct XinpGen {
    /// Length of this structure.
    pub xig_len: u32,
    /// Number of PCBs at snapshot time.
    pub xig_count: u32,
    /// PCB generation count at snapshot time.
    pub xig_gen: u64,
    /// Socket generation count at snapshot time.
    pub xig_sogen: u64,
}

impl XinpGen {
    /// Parse a copy from the start of `data`.
    ///
    /// Copies rather than casting by reference: snapshot buffers are plain
    /// byte vectors with no alignment guarantee for the `u64` fields.
    pub fn read_from(data: &[u8]) -> Option<Self> {
        Self::read_from_prefix(data).ok().map(|(hdr, _)| hdr)
    }
}

/// Sub-record header (mirrors `struct xgen_n`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct RecordHdr {
    /// Total record length including this header.
    pub xgn_len: u32,
    /// Kind tag, one bit of [`RecordKind`].
    pub xgn_kind: u32,
}

impl RecordHdr {
    /// Parse a copy from the start of `data`.
    pub fn read_from(data: &[u8]) -> Option<Self> {
        Self::read_from_prefix(data).ok().map(|(hdr, _)| hdr)
    }

    /// Whether this header is the kernel's end-of-list marker.
    pub fn is_end_marker(&self) -> bool {
        self.xgn_len as usize <= XINPGEN_SIZE
    }
}

/// Kind tags carried by sub-records (Darwin's `XSO_*` values).
///
/// The values are single bits, so the set of kinds seen for one group is a
/// plain mask comparable against [`ALL_KIND_TCP`] / [`ALL_KIND_INP`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RecordKind {
    /// Socket descriptor (`struct xsocket_n`).
    Socket = 0x001,
    /// Receive buffer stats (`struct xsockbuf_n`).
    RcvBuf = 0x002,
    /// Send buffer stats (`struct xsockbuf_n`).
    SndBuf = 0x004,
    /// Socket-level traffic stats (`struct xsockstat_n`).
    Stats = 0x008,
    /// Internet protocol control block (`struct xinpcb_n`).
    InPcb = 0x010,
    /// TCP control block (`struct xtcpcb_n`), TCP listings only.
    TcpPcb = 0x020,
}

/// Kind set describing one UDP connection.
pub const ALL_KIND_INP: u32 = 0x001 | 0x002 | 0x004 | 0x008 | 0x010;

/// Kind set describing one TCP connection.
pub const ALL_KIND_TCP: u32 = ALL_KIND_INP | 0x020;

impl RecordKind {
    /// Parse from a raw kind tag.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0x001 => Some(Self::Socket),
            0x002 => Some(Self::RcvBuf),
            0x004 => Some(Self::SndBuf),
            0x008 => Some(Self::Stats),
            0x010 => Some(Self::InPcb),
            0x020 => Some(Self::TcpPcb),
            _ => None,
        }
    }

    /// The bit this kind contributes to a group's seen-mask.
    pub fn mask(&self) -> u32 {
        *self as u32
    }
}
