//! The snapshot decoder: a single forward pass over one `pcblist_n` buffer.
//!
//! Records describing one connection arrive as an unordered bag of kinds.
//! The decoder accumulates them until the kind set required for the active
//! protocol is complete, then filters the group (protocol match, generation
//! freshness, IPv4) and either yields an entry or moves on to the next
//! group. A record header that is too short, or one that would reach past
//! the buffer, is the end of the list; the kernel terminates the stream
//! exactly that way.

use std::ops::Range;

use tracing::warn;

use super::layout::{self, xinpcb, xsockbuf, xsockstat, xsocket, xtcpcb};
use super::record::{self, RecordHdr, RecordKind, XinpGen, roundup8};
use super::types::{ConnectionEntry, Protocol, SockbufInfo, TcpState, TrafficStats};
use crate::error::{Error, Result};

/// Counters for the non-fatal anomalies seen while decoding.
///
/// None of these stop the scan; they exist so callers can notice a
/// desynchronized or unexpectedly shaped snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeDiagnostics {
    /// A kind showed up twice before its group completed.
    pub duplicate_records: u64,
    /// A record carried a kind tag this decoder does not know.
    pub unknown_records: u64,
    /// A record was too short for a field its kind requires.
    pub short_records: u64,
}

/// Most recently stashed record of each kind, as byte ranges into the
/// snapshot buffer.
///
/// Ranges deliberately survive a rejected group: the next group overwrites
/// them kind by kind, and completion is decided by the seen-mask alone.
#[derive(Debug, Default)]
struct GroupSlots {
    socket: Option<Range<usize>>,
    rcvbuf: Option<Range<usize>>,
    sndbuf: Option<Range<usize>>,
    stats: Option<Range<usize>>,
    inpcb: Option<Range<usize>>,
    tcpcb: Option<Range<usize>>,
}

impl GroupSlots {
    fn slot(&mut self, kind: RecordKind) -> &mut Option<Range<usize>> {
        match kind {
            RecordKind::Socket => &mut self.socket,
            RecordKind::RcvBuf => &mut self.rcvbuf,
            RecordKind::SndBuf => &mut self.sndbuf,
            RecordKind::Stats => &mut self.stats,
            RecordKind::InPcb => &mut self.inpcb,
            RecordKind::TcpPcb => &mut self.tcpcb,
        }
    }
}

/// Single-pass decoder over one captured `pcblist_n` buffer.
///
/// Owns the buffer for its whole lifetime and never re-queries the kernel;
/// dropping it releases the buffer. It is not meant to be shared between
/// threads; concurrent readers should each open their own snapshot.
#[derive(Debug)]
pub struct SnapshotDecoder {
    buf: Vec<u8>,
    /// Offset of the next record; `None` once the end of the list was seen.
    cursor: Option<usize>,
    /// Snapshot-wide generation from the leading header.
    snapshot_gen: u64,
    protocol: Protocol,
    /// Kinds recorded for the group being assembled.
    seen: u32,
    slots: GroupSlots,
    diag: DecodeDiagnostics,
}

impl SnapshotDecoder {
    /// Open a decoder over a captured buffer.
    ///
    /// Fails with [`Error::EmptySnapshot`] if the buffer cannot hold the
    /// leading generation header. The cursor starts just past that header,
    /// rounded up to the record alignment boundary.
    pub fn new(buf: Vec<u8>, protocol: Protocol) -> Result<Self> {
        if buf.len() <= record::XINPGEN_SIZE {
            return Err(Error::EmptySnapshot { len: buf.len() });
        }
        let Some(header) = XinpGen::read_from(&buf) else {
            return Err(Error::EmptySnapshot { len: buf.len() });
        };
        Ok(Self {
            cursor: Some(roundup8(header.xig_len as usize)),
            snapshot_gen: header.xig_gen,
            protocol,
            seen: 0,
            slots: GroupSlots::default(),
            diag: DecodeDiagnostics::default(),
            buf,
        })
    }

    /// The protocol this decoder filters for.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// The generation captured from the snapshot header.
    pub fn snapshot_gen(&self) -> u64 {
        self.snapshot_gen
    }

    /// Anomaly counters accumulated so far.
    pub fn diagnostics(&self) -> DecodeDiagnostics {
        self.diag
    }

    /// Pull the next qualifying connection entry.
    ///
    /// Returns `None` once the list is exhausted and keeps returning `None`
    /// on every further call. Groups that fail a filter (wrong protocol,
    /// stale generation, non-IPv4) are skipped internally.
    pub fn advance(&mut self) -> Option<ConnectionEntry> {
        loop {
            let cursor = self.cursor?;
            if cursor >= self.buf.len() {
                return None;
            }
            let rest = &self.buf[cursor..];
            let Some(hdr) = RecordHdr::read_from(rest) else {
                // Trailing bytes too short for a header.
                self.cursor = None;
                return None;
            };
            let len = hdr.xgn_len as usize;
            if hdr.is_end_marker() || len > rest.len() {
                // The kernel's end-of-list marker, or a declared length
                // reaching past the buffer; either way the list is over.
                self.cursor = None;
                return None;
            }
            self.cursor = Some(cursor + roundup8(len));

            match RecordKind::from_u32(hdr.xgn_kind) {
                Some(kind) => {
                    if self.seen & kind.mask() != 0 {
                        self.diag.duplicate_records += 1;
                        warn!(kind = hdr.xgn_kind, "got record kind twice in one group");
                    }
                    self.seen |= kind.mask();
                    if len < layout::min_len(kind) {
                        self.diag.short_records += 1;
                        warn!(kind = hdr.xgn_kind, len, "record too short for its kind");
                        *self.slots.slot(kind) = None;
                    } else {
                        // Overwrite-last: on a duplicate the freshest copy wins.
                        *self.slots.slot(kind) = Some(cursor..cursor + len);
                    }
                }
                None => {
                    self.diag.unknown_records += 1;
                    warn!(kind = hdr.xgn_kind, "unexpected record kind");
                    continue;
                }
            }

            if self.seen != self.protocol.required_kinds() {
                continue;
            }
            self.seen = 0;

            if let Some(entry) = self.complete_group() {
                return Some(entry);
            }
        }
    }

    /// Filter the completed group and build its entry. `None` discards the
    /// group and lets the scan continue.
    fn complete_group(&self) -> Option<ConnectionEntry> {
        let so = &self.buf[self.slots.socket.clone()?];
        let inp = &self.buf[self.slots.inpcb.clone()?];
        let rcv = &self.buf[self.slots.rcvbuf.clone()?];
        let snd = &self.buf[self.slots.sndbuf.clone()?];
        let stats = &self.buf[self.slots.stats.clone()?];

        // Ignore sockets for protocols other than the requested one.
        if layout::i32_ne(so, xsocket::PROTOCOL)? != self.protocol.number() {
            return None;
        }

        // Ignore PCBs created after the snapshot was taken.
        if layout::u64_ne(inp, xinpcb::GENCNT)? > self.snapshot_gen {
            return None;
        }

        // Only IPv4.
        if layout::u8_at(inp, xinpcb::VFLAG)? & xinpcb::INP_IPV4 == 0 {
            return None;
        }

        let state = match self.protocol {
            Protocol::Tcp => {
                let tp = &self.buf[self.slots.tcpcb.clone()?];
                TcpState::from_raw(layout::i32_ne(tp, xtcpcb::STATE)?)
            }
            // UDP has no connection state.
            Protocol::Udp => TcpState::default(),
        };

        Some(ConnectionEntry {
            protocol: self.protocol,
            local: std::net::SocketAddrV4::new(
                layout::ipv4_at(inp, xinpcb::LADDR4)?,
                layout::u16_be(inp, xinpcb::LPORT)?,
            ),
            remote: std::net::SocketAddrV4::new(
                layout::ipv4_at(inp, xinpcb::FADDR4)?,
                layout::u16_be(inp, xinpcb::FPORT)?,
            ),
            flags: layout::u32_ne(inp, xinpcb::FLAGS)?,
            state,
            rcv: read_sockbuf(rcv)?,
            snd: read_sockbuf(snd)?,
            traffic: read_sockstat(stats),
        })
    }
}

impl Iterator for SnapshotDecoder {
    type Item = ConnectionEntry;

    fn next(&mut self) -> Option<ConnectionEntry> {
        self.advance()
    }
}

fn read_sockbuf(record: &[u8]) -> Option<SockbufInfo> {
    Some(SockbufInfo {
        cc: layout::u32_ne(record, xsockbuf::CC)?,
        hiwat: layout::u32_ne(record, xsockbuf::HIWAT)?,
        mbcnt: layout::u32_ne(record, xsockbuf::MBCNT)?,
        mbmax: layout::u32_ne(record, xsockbuf::MBMAX)?,
        lowat: layout::i32_ne(record, xsockbuf::LOWAT)?,
    })
}

/// Sum the traffic-class counters, as many classes as the record holds.
fn read_sockstat(record: &[u8]) -> TrafficStats {
    let mut traffic = TrafficStats::default();
    for class in 0..xsockstat::TC_COUNT {
        let base = xsockstat::TC_STATS + class * xsockstat::TC_STRIDE;
        if base + xsockstat::TC_STRIDE > record.len() {
            break;
        }
        let read = |off| layout::u64_ne(record, base + off).unwrap_or(0);
        traffic.rx_packets += read(xsockstat::RXPACKETS);
        traffic.rx_bytes += read(xsockstat::RXBYTES);
        traffic.tx_packets += read(xsockstat::TXPACKETS);
        traffic.tx_bytes += read(xsockstat::TXBYTES);
    }
    traffic
}
