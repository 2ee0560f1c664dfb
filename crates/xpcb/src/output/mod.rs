//! Rendering of connection entries as text or JSON.
//!
//! The text form is the classic netstat table; JSON is a straight
//! serialization of [`ConnectionEntry`].

use std::io::{self, Write};

use crate::pcblist::{ConnectionEntry, Protocol};

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table.
    Text,
    /// JSON array.
    Json,
}

/// Display options for the text table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayOptions {
    /// Don't print the header line.
    pub no_header: bool,
    /// Add lifetime rx/tx byte columns.
    pub bytes: bool,
    /// Accepted for netstat compatibility; addresses and ports are always
    /// printed numerically.
    pub numeric: bool,
}

/// Print entries in netstat-style text format.
pub fn print_text(
    entries: &[ConnectionEntry],
    opts: &DisplayOptions,
    out: &mut impl Write,
) -> io::Result<()> {
    if !opts.no_header {
        write!(
            out,
            "{:<6} {:>6} {:>6}  {:<22} {:<22}",
            "Proto", "Recv-Q", "Send-Q", "Local Address", "Foreign Address"
        )?;
        if opts.bytes {
            write!(out, " {:>10} {:>10}", "rxbytes", "txbytes")?;
        }
        writeln!(out, " (state)")?;
    }

    for entry in entries {
        write!(
            out,
            "{:<6} {:>6} {:>6}  {:<22} {:<22}",
            entry.protocol.netid(),
            entry.recv_q(),
            entry.send_q(),
            entry.local.to_string(),
            entry.remote.to_string(),
        )?;
        if opts.bytes {
            write!(
                out,
                " {:>10} {:>10}",
                entry.traffic.rx_bytes, entry.traffic.tx_bytes
            )?;
        }
        // UDP has no state column, like netstat.
        match entry.protocol {
            Protocol::Tcp => writeln!(out, " {}", entry.state.name())?,
            Protocol::Udp => writeln!(out)?,
        }
    }

    Ok(())
}

/// Print entries as a pretty JSON array.
pub fn print_json(entries: &[ConnectionEntry], out: &mut impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, entries)?;
    writeln!(out)
}
