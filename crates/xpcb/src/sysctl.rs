//! Snapshot acquisition: the single blocking kernel query.
//!
//! The pcblist is fetched with the usual two-step sysctl dance: probe the
//! required size, allocate, fill. There is no retry; a kernel that grew the
//! list between the two calls fails the fill call and the caller sees that
//! as a query failure. The buffer is truncated to the length the kernel
//! actually wrote.

use crate::error::Result;
use crate::pcblist::Protocol;

/// Fetch the raw pcblist buffer for `protocol`.
///
/// Returns [`Error::Unavailable`](crate::Error::Unavailable) when the MIB
/// does not exist (ENOENT) and [`Error::Unsupported`](crate::Error::Unsupported)
/// on hosts without the pcblist sysctl at all; both count as
/// "nothing to list" for [`Snapshot::open`](crate::Snapshot::open).
pub fn fetch(protocol: Protocol) -> Result<Vec<u8>> {
    imp::fetch(protocol)
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
mod imp {
    use std::ffi::CStr;
    use std::io;
    use std::ptr;

    use crate::error::{Error, Result};
    use crate::pcblist::Protocol;

    fn mib_name(protocol: Protocol) -> &'static CStr {
        match protocol {
            Protocol::Tcp => c"net.inet.tcp.pcblist_n",
            Protocol::Udp => c"net.inet.udp.pcblist_n",
        }
    }

    fn last_errno() -> i32 {
        io::Error::last_os_error().raw_os_error().unwrap_or(0)
    }

    pub(super) fn fetch(protocol: Protocol) -> Result<Vec<u8>> {
        let name = mib_name(protocol);
        let mut len: libc::size_t = 0;

        // SAFETY: name is a valid C string; a null oldp asks for the size.
        let rc = unsafe {
            libc::sysctlbyname(name.as_ptr(), ptr::null_mut(), &mut len, ptr::null_mut(), 0)
        };
        if rc < 0 {
            let errno = last_errno();
            if errno == libc::ENOENT {
                return Err(Error::Unavailable {
                    mib: protocol.mib(),
                });
            }
            return Err(Error::sysctl(protocol.mib(), errno));
        }

        let mut buf = vec![0u8; len];
        // SAFETY: buf holds exactly `len` writable bytes.
        let rc = unsafe {
            libc::sysctlbyname(
                name.as_ptr(),
                buf.as_mut_ptr().cast(),
                &mut len,
                ptr::null_mut(),
                0,
            )
        };
        if rc < 0 {
            return Err(Error::sysctl(protocol.mib(), last_errno()));
        }

        // The kernel reports how much it actually wrote.
        buf.truncate(len);
        Ok(buf)
    }
}

#[cfg(not(any(target_os = "macos", target_os = "ios")))]
mod imp {
    use crate::error::{Error, Result};
    use crate::pcblist::Protocol;

    pub(super) fn fetch(_protocol: Protocol) -> Result<Vec<u8>> {
        Err(Error::Unsupported)
    }
}
