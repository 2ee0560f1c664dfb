//! The open/iterate/close facade over snapshot source and decoder.

use crate::error::Result;
use crate::pcblist::{ConnectionEntry, DecodeDiagnostics, Protocol, SnapshotDecoder};
use crate::sysctl;

/// One captured connection listing, iterable exactly once.
///
/// Opening queries the kernel a single time; iterating never re-queries.
/// Dropping releases the captured buffer. [`close`](Snapshot::close) exists
/// for symmetry with the open/next/close contract and is equivalent to
/// dropping; a second close is unrepresentable.
#[derive(Debug)]
pub struct Snapshot {
    decoder: Option<SnapshotDecoder>,
}

impl Snapshot {
    /// Capture and open a snapshot for `protocol`.
    ///
    /// A kernel with nothing to report (no such MIB, or a buffer too small
    /// to hold even the generation header) yields an open, immediately
    /// exhausted snapshot. Real query failures are returned as errors.
    pub fn open(protocol: Protocol) -> Result<Self> {
        let buf = match sysctl::fetch(protocol) {
            Ok(buf) => buf,
            Err(e) if e.is_empty_result() => return Ok(Self { decoder: None }),
            Err(e) => return Err(e),
        };
        match SnapshotDecoder::new(buf, protocol) {
            Ok(decoder) => Ok(Self {
                decoder: Some(decoder),
            }),
            Err(e) if e.is_empty_result() => Ok(Self { decoder: None }),
            Err(e) => Err(e),
        }
    }

    /// Open a snapshot over an already-captured buffer.
    ///
    /// Unlike [`open`](Self::open) this is strict: a degenerate buffer is
    /// an error, since the caller claimed to have captured one.
    pub fn from_buffer(buf: Vec<u8>, protocol: Protocol) -> Result<Self> {
        Ok(Self {
            decoder: Some(SnapshotDecoder::new(buf, protocol)?),
        })
    }

    /// Capture a fresh snapshot and collect every entry.
    pub fn entries(protocol: Protocol) -> Result<Vec<ConnectionEntry>> {
        Ok(Self::open(protocol)?.collect())
    }

    /// Anomaly counters accumulated while decoding so far.
    pub fn diagnostics(&self) -> DecodeDiagnostics {
        self.decoder
            .as_ref()
            .map(|d| d.diagnostics())
            .unwrap_or_default()
    }

    /// Release the snapshot. Equivalent to dropping it.
    pub fn close(self) {}
}

impl Iterator for Snapshot {
    type Item = ConnectionEntry;

    fn next(&mut self) -> Option<ConnectionEntry> {
        self.decoder.as_mut()?.advance()
    }
}
