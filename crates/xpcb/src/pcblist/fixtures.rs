//! Synthetic `pcblist_n` buffers for testing.
//!
//! Builds snapshot buffers record by record so decoder tests run without a
//! Darwin kernel. Payloads are written through the same offset table the
//! decoder reads through, with the record header subtracted, so a layout
//! change breaks the tests rather than silently passing.

use zerocopy::IntoBytes;

use super::layout::{xinpcb, xsockbuf, xsockstat, xsocket, xtcpcb};
use super::record::{RECORD_HDRLEN, RecordHdr, XINPGEN_SIZE, XinpGen, roundup8};

/// High-water mark used by the payload builders.
pub(crate) const DEFAULT_HIWAT: u32 = 131_072;

/// Field values for one synthetic connection group.
#[derive(Debug, Clone)]
pub(crate) struct TcpGroup {
    pub laddr: [u8; 4],
    pub lport: u16,
    pub faddr: [u8; 4],
    pub fport: u16,
    pub so_protocol: i32,
    pub gencnt: u64,
    pub vflag: u8,
    pub flags: u32,
    pub state: i32,
    pub recv_q: u32,
    pub send_q: u32,
    pub rx_bytes_per_class: u64,
    pub tx_bytes_per_class: u64,
}

impl Default for TcpGroup {
    fn default() -> Self {
        Self {
            laddr: [127, 0, 0, 1],
            lport: 8080,
            faddr: [10, 1, 2, 3],
            fport: 443,
            so_protocol: libc::IPPROTO_TCP,
            gencnt: 1,
            vflag: xinpcb::INP_IPV4,
            flags: 0,
            state: 4, // ESTABLISHED
            recv_q: 0,
            send_q: 0,
            rx_bytes_per_class: 0,
            tx_bytes_per_class: 0,
        }
    }
}

/// Builds snapshot buffers the way the kernel lays them out.
pub(crate) struct SnapshotBuilder {
    generation: u64,
    buf: Vec<u8>,
}

impl SnapshotBuilder {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            buf: gen_header(generation).as_bytes().to_vec(),
        }
    }

    /// Append one record and pad the stream to the 8-byte boundary.
    pub fn push(&mut self, kind: u32, payload: &[u8]) -> &mut Self {
        let hdr = RecordHdr {
            xgn_len: (RECORD_HDRLEN + payload.len()) as u32,
            xgn_kind: kind,
        };
        self.buf.extend_from_slice(hdr.as_bytes());
        self.buf.extend_from_slice(payload);
        let padded = roundup8(self.buf.len());
        self.buf.resize(padded, 0);
        self
    }

    /// Append a bare record header with an arbitrary declared length.
    pub fn push_raw_hdr(&mut self, len: u32, kind: u32) -> &mut Self {
        let hdr = RecordHdr {
            xgn_len: len,
            xgn_kind: kind,
        };
        self.buf.extend_from_slice(hdr.as_bytes());
        self
    }

    /// Append the kernel's trailing generation header.
    pub fn end(&mut self) -> &mut Self {
        self.buf
            .extend_from_slice(gen_header(self.generation).as_bytes());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.buf.clone()
    }
}

fn gen_header(generation: u64) -> XinpGen {
    XinpGen {
        xig_len: XINPGEN_SIZE as u32,
        xig_count: 0,
        xig_gen: generation,
        xig_sogen: generation,
    }
}

/// Write `bytes` at a record-relative offset into a header-less payload.
fn put(payload: &mut [u8], record_offset: usize, bytes: &[u8]) {
    let off = record_offset - RECORD_HDRLEN;
    payload[off..off + bytes.len()].copy_from_slice(bytes);
}

/// `xsocket_n` payload with the given protocol number.
pub(crate) fn socket_payload(protocol: i32) -> Vec<u8> {
    let mut p = vec![0u8; 40];
    put(&mut p, xsocket::PROTOCOL, &protocol.to_ne_bytes());
    put(&mut p, xsocket::FAMILY, &(libc::AF_INET as i32).to_ne_bytes());
    p
}

/// `xsockbuf_n` payload with the given queue depth and high-water mark.
pub(crate) fn sockbuf_payload(cc: u32, hiwat: u32) -> Vec<u8> {
    let mut p = vec![0u8; 24];
    put(&mut p, xsockbuf::CC, &cc.to_ne_bytes());
    put(&mut p, xsockbuf::HIWAT, &hiwat.to_ne_bytes());
    p
}

/// `xsockstat_n` payload with the same counters in every traffic class.
pub(crate) fn sockstat_payload(rx_bytes: u64, tx_bytes: u64) -> Vec<u8> {
    let mut p = vec![0u8; xsockstat::TC_COUNT * xsockstat::TC_STRIDE];
    let rx_packets: u64 = if rx_bytes > 0 { 1 } else { 0 };
    let tx_packets: u64 = if tx_bytes > 0 { 1 } else { 0 };
    for class in 0..xsockstat::TC_COUNT {
        let base = xsockstat::TC_STATS + class * xsockstat::TC_STRIDE;
        put(&mut p, base + xsockstat::RXPACKETS, &rx_packets.to_ne_bytes());
        put(&mut p, base + xsockstat::RXBYTES, &rx_bytes.to_ne_bytes());
        put(&mut p, base + xsockstat::TXPACKETS, &tx_packets.to_ne_bytes());
        put(&mut p, base + xsockstat::TXBYTES, &tx_bytes.to_ne_bytes());
    }
    p
}

/// `xinpcb_n` payload for the given group. Ports are stored in network
/// byte order, as the kernel does.
pub(crate) fn inpcb_payload(group: &TcpGroup) -> Vec<u8> {
    let mut p = vec![0u8; 96];
    put(&mut p, xinpcb::FPORT, &group.fport.to_be_bytes());
    put(&mut p, xinpcb::LPORT, &group.lport.to_be_bytes());
    put(&mut p, xinpcb::GENCNT, &group.gencnt.to_ne_bytes());
    put(&mut p, xinpcb::FLAGS, &group.flags.to_ne_bytes());
    put(&mut p, xinpcb::VFLAG, &[group.vflag]);
    put(&mut p, xinpcb::FADDR4, &group.faddr);
    put(&mut p, xinpcb::LADDR4, &group.laddr);
    p
}

/// `xtcpcb_n` payload with the given raw state.
pub(crate) fn tcpcb_payload(state: i32) -> Vec<u8> {
    let mut p = vec![0u8; 32];
    put(&mut p, xtcpcb::STATE, &state.to_ne_bytes());
    p
}

/// Append a full TCP group in the kernel's usual kind order.
pub(crate) fn push_tcp_group(b: &mut SnapshotBuilder, group: TcpGroup) {
    push_udp_group(b, group.clone());
    b.push(0x020, &tcpcb_payload(group.state));
}

/// Append the five kinds shared by TCP and UDP groups.
pub(crate) fn push_udp_group(b: &mut SnapshotBuilder, group: TcpGroup) {
    b.push(0x001, &socket_payload(group.so_protocol));
    b.push(0x002, &sockbuf_payload(group.recv_q, DEFAULT_HIWAT));
    b.push(0x004, &sockbuf_payload(group.send_q, DEFAULT_HIWAT));
    b.push(
        0x008,
        &sockstat_payload(group.rx_bytes_per_class, group.tx_bytes_per_class),
    );
    b.push(0x010, &inpcb_payload(&group));
}
