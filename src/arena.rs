use std::fmt;

use crate::error::ArenaError;

/// Default byte limit for a request arena. Geography values are short
/// (codes, city names, fixed-width numbers), so this is generous.
pub const DEFAULT_ARENA_LIMIT: usize = 64 * 1024;

/// A handle into a [`RequestArena`].
///
/// Spans stay valid until the arena is cleared. They are plain offsets, so
/// a resolved value can outlive the lookup record it was copied from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    start: usize,
    len: usize,
}

impl Span {
    /// Length of the spanned text in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Append-only text buffer scoped to one request.
///
/// All variable output is copied in here before the originating lookup
/// record is released, so no resolved value ever aliases library-owned
/// memory. Exceeding the byte limit is the per-request allocation failure
/// from the error taxonomy; the arena rolls back to its previous length so
/// partially-formatted bytes never leak.
#[derive(Debug)]
pub struct RequestArena {
    buf: String,
    limit: usize,
}

impl Default for RequestArena {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestArena {
    /// Create an arena with the default limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_ARENA_LIMIT)
    }

    /// Create an arena that holds at most `limit` bytes of output.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        RequestArena {
            buf: String::new(),
            limit,
        }
    }

    /// Copy `s` into the arena.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError`] if the copy would exceed the arena limit.
    pub fn push_str(&mut self, s: &str) -> Result<Span, ArenaError> {
        if self.buf.len() + s.len() > self.limit {
            return Err(ArenaError { limit: self.limit });
        }
        let start = self.buf.len();
        self.buf.push_str(s);
        Ok(Span { start, len: s.len() })
    }

    /// Format directly into the arena.
    ///
    /// On failure the arena is truncated back to its pre-call length, so an
    /// exhausted arena never retains a partial rendering.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError`] if formatting would exceed the arena limit.
    pub fn push_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<Span, ArenaError> {
        let start = self.buf.len();
        let mut writer = LimitWriter {
            buf: &mut self.buf,
            limit: self.limit,
        };
        if fmt::Write::write_fmt(&mut writer, args).is_err() {
            self.buf.truncate(start);
            return Err(ArenaError { limit: self.limit });
        }
        Ok(Span {
            start,
            len: self.buf.len() - start,
        })
    }

    /// Get the text behind a span previously returned by this arena.
    #[must_use]
    pub fn get(&self, span: Span) -> &str {
        &self.buf[span.start..span.start + span.len]
    }

    /// Bytes currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Reset for the next request. Invalidates all previously issued spans.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

/// `fmt::Write` adapter that refuses to grow past the arena limit.
struct LimitWriter<'a> {
    buf: &'a mut String,
    limit: usize,
}

impl fmt::Write for LimitWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.buf.len() + s.len() > self.limit {
            return Err(fmt::Error);
        }
        self.buf.push_str(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_get() {
        let mut arena = RequestArena::new();
        let a = arena.push_str("US").unwrap();
        let b = arena.push_str("Mountain View").unwrap();
        assert_eq!(arena.get(a), "US");
        assert_eq!(arena.get(b), "Mountain View");
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn limit_rejects_push() {
        let mut arena = RequestArena::with_limit(4);
        arena.push_str("abcd").unwrap();
        let err = arena.push_str("e").unwrap_err();
        assert_eq!(err.limit, 4);
        assert_eq!(arena.len(), 4);
    }

    #[test]
    fn exhausted_fmt_leaves_no_partial_bytes() {
        let mut arena = RequestArena::with_limit(8);
        arena.push_str("1234").unwrap();
        // "-122.0838" is 9 bytes, only 4 remain
        assert!(arena
            .push_fmt(format_args!("{:.4}", -122.0838_f64))
            .is_err());
        assert_eq!(arena.len(), 4);
    }

    #[test]
    fn fixed_point_formatting() {
        let mut arena = RequestArena::new();
        let lat = arena.push_fmt(format_args!("{:.4}", 37.5_f64)).unwrap();
        let lon = arena.push_fmt(format_args!("{:.4}", -122.0_f64)).unwrap();
        assert_eq!(arena.get(lat), "37.5000");
        assert_eq!(arena.get(lon), "-122.0000");
    }

    #[test]
    fn clear_resets() {
        let mut arena = RequestArena::with_limit(4);
        arena.push_str("abcd").unwrap();
        arena.clear();
        assert!(arena.is_empty());
        assert!(arena.push_str("wxyz").is_ok());
    }
}
