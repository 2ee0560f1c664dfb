//! Core types for decoded connection entries.

use std::net::SocketAddrV4;

use serde::Serialize;

use super::record;

/// Transport protocol selecting which pcblist to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP.
    Tcp,
    /// UDP.
    Udp,
}

impl Protocol {
    /// The IP protocol number sockets of this protocol carry.
    pub fn number(&self) -> i32 {
        match self {
            Self::Tcp => libc::IPPROTO_TCP,
            Self::Udp => libc::IPPROTO_UDP,
        }
    }

    /// The sysctl MIB name of this protocol's pcblist.
    pub fn mib(&self) -> &'static str {
        match self {
            Self::Tcp => "net.inet.tcp.pcblist_n",
            Self::Udp => "net.inet.udp.pcblist_n",
        }
    }

    /// The protocol name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }

    /// The netid string shown in listings (IPv4 only).
    pub fn netid(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp4",
            Self::Udp => "udp4",
        }
    }

    /// The kind set that completes one group in this protocol's listing.
    pub fn required_kinds(&self) -> u32 {
        match self {
            Self::Tcp => record::ALL_KIND_TCP,
            Self::Udp => record::ALL_KIND_INP,
        }
    }
}

/// TCP connection states, in the kernel's `TCPS_*` numbering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum TcpState {
    /// Closed; also the placeholder for protocols without states.
    #[default]
    Closed = 0,
    /// Listening for connections.
    Listen = 1,
    /// Active open, SYN sent.
    SynSent = 2,
    /// SYN received, handshake in progress.
    SynReceived = 3,
    /// Connection established.
    Established = 4,
    /// Remote side closed, waiting for local close.
    CloseWait = 5,
    /// Local side closed, awaiting FIN or its ACK.
    FinWait1 = 6,
    /// Both sides closed simultaneously.
    Closing = 7,
    /// Our FIN after CLOSE_WAIT, awaiting its ACK.
    LastAck = 8,
    /// Local FIN acknowledged, awaiting remote FIN.
    FinWait2 = 9,
    /// Quiet time after close.
    TimeWait = 10,
}

impl TcpState {
    /// Parse from the raw `t_state` field. Out-of-range values map to
    /// [`Closed`](Self::Closed).
    pub fn from_raw(value: i32) -> Self {
        match value {
            1 => Self::Listen,
            2 => Self::SynSent,
            3 => Self::SynReceived,
            4 => Self::Established,
            5 => Self::CloseWait,
            6 => Self::FinWait1,
            7 => Self::Closing,
            8 => Self::LastAck,
            9 => Self::FinWait2,
            10 => Self::TimeWait,
            _ => Self::Closed,
        }
    }

    /// The state name as netstat prints it.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Listen => "LISTEN",
            Self::SynSent => "SYN_SENT",
            Self::SynReceived => "SYN_RCVD",
            Self::Established => "ESTABLISHED",
            Self::CloseWait => "CLOSE_WAIT",
            Self::FinWait1 => "FIN_WAIT_1",
            Self::Closing => "CLOSING",
            Self::LastAck => "LAST_ACK",
            Self::FinWait2 => "FIN_WAIT_2",
            Self::TimeWait => "TIME_WAIT",
        }
    }
}

/// Send- or receive-side socket buffer stats (`struct xsockbuf_n`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SockbufInfo {
    /// Bytes currently queued.
    pub cc: u32,
    /// High-water mark (buffer size).
    pub hiwat: u32,
    /// Mbuf bytes in use.
    pub mbcnt: u32,
    /// Mbuf byte limit.
    pub mbmax: u32,
    /// Low-water mark.
    pub lowat: i32,
}

/// Lifetime traffic counters summed over the socket's traffic classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrafficStats {
    /// Packets received.
    pub rx_packets: u64,
    /// Bytes received.
    pub rx_bytes: u64,
    /// Packets sent.
    pub tx_packets: u64,
    /// Bytes sent.
    pub tx_bytes: u64,
}

/// One decoded, filtered connection.
///
/// Created fresh for each successful decode step; owned entirely by the
/// caller once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionEntry {
    /// Transport protocol of the listing this entry came from.
    pub protocol: Protocol,
    /// Local endpoint; port already converted to host byte order.
    pub local: SocketAddrV4,
    /// Remote endpoint; port already converted to host byte order.
    pub remote: SocketAddrV4,
    /// `inp_flags` word, copied verbatim.
    pub flags: u32,
    /// Connection state; meaningful for TCP only, `Closed` for UDP.
    pub state: TcpState,
    /// Receive buffer stats.
    pub rcv: SockbufInfo,
    /// Send buffer stats.
    pub snd: SockbufInfo,
    /// Lifetime traffic counters.
    pub traffic: TrafficStats,
}

impl ConnectionEntry {
    /// Bytes queued in the receive buffer (netstat's Recv-Q).
    pub fn recv_q(&self) -> u32 {
        self.rcv.cc
    }

    /// Bytes queued in the send buffer (netstat's Send-Q).
    pub fn send_q(&self) -> u32 {
        self.snd.cc
    }

    /// Whether this entry is a listening TCP socket.
    pub fn is_listening(&self) -> bool {
        self.protocol == Protocol::Tcp && self.state == TcpState::Listen
    }

    /// Whether the remote endpoint is unset (bound but unconnected).
    pub fn is_unconnected(&self) -> bool {
        self.remote.port() == 0 && self.remote.ip().is_unspecified()
    }
}
