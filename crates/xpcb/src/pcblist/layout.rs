//! Byte offsets of the `pcblist_n` record payloads.
//!
//! Offsets are relative to the start of each record, header included, and
//! mirror the structures the kernel copies out (`xsocket_n`, `xinpcb_n`,
//! `xtcpcb_n`, `xsockbuf_n`, `xsockstat_n`). This table is the only place
//! that knows field positions; the decoder goes through the readers below.
//!
//! All multi-byte fields are native-endian except the ports, which the
//! kernel stores in network byte order.

use std::net::Ipv4Addr;

use super::record::RecordKind;

/// `struct xsocket_n`: socket descriptor.
pub mod xsocket {
    /// `xso_protocol`: IP protocol number of the socket.
    pub const PROTOCOL: usize = 40;
    /// `xso_family`: address family the socket was created with.
    pub const FAMILY: usize = 44;
}

/// `struct xinpcb_n`: internet protocol control block.
pub mod xinpcb {
    /// `inp_fport`: foreign port, network byte order.
    pub const FPORT: usize = 16;
    /// `inp_lport`: local port, network byte order.
    pub const LPORT: usize = 18;
    /// `inp_gencnt`: generation count of this PCB.
    pub const GENCNT: usize = 32;
    /// `inp_flags`: generic IP/datagram flags.
    pub const FLAGS: usize = 40;
    /// `inp_vflag`: address-family flags.
    pub const VFLAG: usize = 48;
    /// Foreign IPv4 address; last word of the 16-byte address union.
    pub const FADDR4: usize = 64;
    /// Local IPv4 address; last word of the 16-byte address union.
    pub const LADDR4: usize = 80;

    /// `inp_vflag` bit marking an IPv4 PCB (`INP_IPV4`).
    pub const INP_IPV4: u8 = 0x1;
}

/// `struct xtcpcb_n`: TCP control block.
pub mod xtcpcb {
    /// `t_state`: connection state in `TCPS_*` numbering.
    pub const STATE: usize = 36;
}

/// `struct xsockbuf_n`: send/receive socket buffer stats.
pub mod xsockbuf {
    /// `sb_cc`: bytes currently queued.
    pub const CC: usize = 8;
    /// `sb_hiwat`: high-water mark.
    pub const HIWAT: usize = 12;
    /// `sb_mbcnt`: mbuf bytes in use.
    pub const MBCNT: usize = 16;
    /// `sb_mbmax`: mbuf byte limit.
    pub const MBMAX: usize = 20;
    /// `sb_lowat`: low-water mark.
    pub const LOWAT: usize = 24;
}

/// `struct xsockstat_n`: per-traffic-class counters.
pub mod xsockstat {
    /// First `data_stats` entry.
    pub const TC_STATS: usize = 8;
    /// Number of traffic classes the kernel reports.
    pub const TC_COUNT: usize = 4;
    /// Stride of one `data_stats` entry (4 x u64).
    pub const TC_STRIDE: usize = 32;
    /// `rxpackets` within one entry.
    pub const RXPACKETS: usize = 0;
    /// `rxbytes` within one entry.
    pub const RXBYTES: usize = 8;
    /// `txpackets` within one entry.
    pub const TXPACKETS: usize = 16;
    /// `txbytes` within one entry.
    pub const TXBYTES: usize = 24;
}

/// Minimum declared length for a record of `kind` to contain every field
/// the decoder reads from it. Shorter records are a desynchronization and
/// drop their group.
pub fn min_len(kind: RecordKind) -> usize {
    match kind {
        RecordKind::Socket => xsocket::FAMILY + 4,
        RecordKind::RcvBuf | RecordKind::SndBuf => xsockbuf::LOWAT + 4,
        // Traffic-class entries are summed as far as the record reaches.
        RecordKind::Stats => xsockstat::TC_STATS,
        RecordKind::InPcb => xinpcb::LADDR4 + 4,
        RecordKind::TcpPcb => xtcpcb::STATE + 4,
    }
}

/// Read a native-endian `u32` at `offset`, if the record is long enough.
pub fn u32_ne(record: &[u8], offset: usize) -> Option<u32> {
    record
        .get(offset..offset + 4)
        .map(|b| u32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
}

/// Read a native-endian `i32` at `offset`, if the record is long enough.
pub fn i32_ne(record: &[u8], offset: usize) -> Option<i32> {
    record
        .get(offset..offset + 4)
        .map(|b| i32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
}

/// Read a native-endian `u64` at `offset`, if the record is long enough.
pub fn u64_ne(record: &[u8], offset: usize) -> Option<u64> {
    record
        .get(offset..offset + 8)
        .map(|b| u64::from_ne_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
}

/// Read a network-order `u16` at `offset` and convert to host order.
pub fn u16_be(record: &[u8], offset: usize) -> Option<u16> {
    record
        .get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
}

/// Read a single byte at `offset`.
pub fn u8_at(record: &[u8], offset: usize) -> Option<u8> {
    record.get(offset).copied()
}

/// Read a raw IPv4 address at `offset`, byte order preserved as stored.
pub fn ipv4_at(record: &[u8], offset: usize) -> Option<Ipv4Addr> {
    record
        .get(offset..offset + 4)
        .map(|b| Ipv4Addr::new(b[0], b[1], b[2], b[3]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readers_bounds() {
        let record = [0u8; 16];
        assert!(u32_ne(&record, 12).is_some());
        assert!(u32_ne(&record, 13).is_none());
        assert!(u64_ne(&record, 8).is_some());
        assert!(u64_ne(&record, 9).is_none());
        assert!(u16_be(&record, 14).is_some());
        assert!(u16_be(&record, 15).is_none());
        assert!(u8_at(&record, 15).is_some());
        assert!(u8_at(&record, 16).is_none());
        assert!(ipv4_at(&record, 12).is_some());
        assert!(ipv4_at(&record, 13).is_none());
    }

    #[test]
    fn test_port_byte_order() {
        // 8080 stored big-endian.
        let mut record = [0u8; 4];
        record[0] = 0x1f;
        record[1] = 0x90;
        assert_eq!(u16_be(&record, 0), Some(8080));
    }

    #[test]
    fn test_ipv4_preserves_stored_bytes() {
        let record = [127, 0, 0, 1];
        assert_eq!(ipv4_at(&record, 0), Some(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn test_min_lens_cover_reads() {
        // Every offset the decoder reads fits inside the kind's minimum.
        assert!(xsocket::PROTOCOL + 4 <= min_len(RecordKind::Socket));
        assert!(xinpcb::LADDR4 + 4 <= min_len(RecordKind::InPcb));
        assert!(xinpcb::FADDR4 + 4 <= min_len(RecordKind::InPcb));
        assert!(xinpcb::GENCNT + 8 <= min_len(RecordKind::InPcb));
        assert!(xtcpcb::STATE + 4 <= min_len(RecordKind::TcpPcb));
        assert!(xsockbuf::LOWAT + 4 <= min_len(RecordKind::RcvBuf));
    }
}
