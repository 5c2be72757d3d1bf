//! Socket cookie tag map. Written by the socket tagging path and by another
//! process; this workspace only reads it.

// ── Key — 8 bytes ───────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CookieTagKey {
    pub socket_cookie: u64,
}

// ── Value — 8 bytes ─────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieTagValue {
    pub uid: u32,
    pub tag: u32,
}

#[cfg(feature = "userspace")]
unsafe impl aya::Pod for CookieTagKey {}
#[cfg(feature = "userspace")]
unsafe impl aya::Pod for CookieTagValue {}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem;

    #[test]
    fn test_cookie_tag_layout() {
        assert_eq!(mem::size_of::<CookieTagKey>(), 8);
        assert_eq!(mem::size_of::<CookieTagValue>(), 8);
        assert_eq!(mem::offset_of!(CookieTagValue, tag), 4);
    }
}
