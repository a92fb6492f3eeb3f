//! A string view which can efficiently subdivide and append itself.
//!
//! [`PoolString`] is a `[start, end)` byte window over a shared buffer.
//! Slicing never copies. Concatenating two windows which are adjacent in the
//! same buffer never copies either; anything else is copied into a growable
//! buffer, which later concatenations can keep extending in place as long as
//! they start where the buffer currently ends.
//!
//! While a window still points at an original text it can report source line
//! numbers, which is what the changelog parser uses to anchor diagnostics.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
enum Base {
    /// An original, immutable text.
    Text(Arc<str>),
    /// Append-only buffer created by concatenating disjoint pieces.
    Builder(Arc<RwLock<String>>),
}

impl Base {
    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Arc::ptr_eq(a, b),
            (Self::Builder(a), Self::Builder(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Either a [`PoolString`] or a literal, for [`PoolString::concat_all`].
#[derive(Debug, Clone, Copy)]
pub enum PoolPart<'a> {
    /// A window over some buffer.
    Pool(&'a PoolString),
    /// Plain text.
    Str(&'a str),
}

impl<'a> From<&'a PoolString> for PoolPart<'a> {
    fn from(value: &'a PoolString) -> Self {
        Self::Pool(value)
    }
}

impl<'a> From<&'a str> for PoolPart<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(value)
    }
}

/// An immutable window over a shared text buffer.
///
/// All offsets are byte offsets and must fall on `char` boundaries.
#[derive(Clone)]
pub struct PoolString {
    base: Base,
    start: usize,
    end: usize,
}

impl PoolString {
    /// A window over the whole of `text`.
    #[must_use]
    pub fn of(text: &str) -> Self {
        if text.is_empty() {
            return Self::empty();
        }
        Self {
            base: Base::Text(Arc::from(text)),
            start: 0,
            end: text.len(),
        }
    }

    /// The empty window.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            base: Base::Text(Arc::from("")),
            start: 0,
            end: 0,
        }
    }

    /// Length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// True if this window has no content.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The `char` which starts at byte `index`, if any.
    #[must_use]
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.with_str(|s| s.get(index..).and_then(|rest| rest.chars().next()))
    }

    /// The window `[start, end)` relative to this one, without copying.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds or splits a `char`.
    #[must_use]
    pub fn sub_sequence(&self, start: usize, end: usize) -> Self {
        assert!(
            start <= end && end <= self.len(),
            "sub_sequence({start}, {end}) out of bounds for length {}",
            self.len()
        );
        if start == end {
            return Self::empty();
        }
        assert!(
            self.with_str(|s| s.is_char_boundary(start) && s.is_char_boundary(end)),
            "sub_sequence({start}, {end}) does not fall on char boundaries"
        );
        Self {
            base: self.base.clone(),
            start: self.start + start,
            end: self.start + end,
        }
    }

    /// Byte offset of the first occurrence of `needle`.
    #[must_use]
    pub fn index_of(&self, needle: &str) -> Option<usize> {
        self.with_str(|s| s.find(needle))
    }

    /// Byte offset of the first occurrence of `needle`.
    #[must_use]
    pub fn index_of_char(&self, needle: char) -> Option<usize> {
        self.with_str(|s| s.find(needle))
    }

    /// True if this window starts with `prefix`.
    #[must_use]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.with_str(|s| s.starts_with(prefix))
    }

    /// True if this window ends with `suffix`.
    #[must_use]
    pub fn ends_with(&self, suffix: &str) -> bool {
        self.with_str(|s| s.ends_with(suffix))
    }

    /// True if this window has exactly the content of `other`.
    #[must_use]
    pub fn same_as(&self, other: &str) -> bool {
        self.len() == other.len() && self.with_str(|s| s == other)
    }

    /// Everything from the start of this window until `needle`, or the
    /// whole window if `needle` never occurs.
    #[must_use]
    pub fn until(&self, needle: &str) -> Self {
        match self.index_of(needle) {
            Some(idx) => self.sub_sequence(0, idx),
            None => self.clone(),
        }
    }

    /// Everything after `prefix`, which must have come from [`Self::until`]
    /// on this same window.
    ///
    /// # Panics
    ///
    /// Panics if `prefix` is not a leading window of `self` in the same buffer.
    #[must_use]
    pub fn after(&self, prefix: &Self) -> Self {
        if prefix.is_empty() {
            return self.clone();
        }
        assert!(
            prefix.base.same(&self.base),
            "after() requires a prefix from the same buffer"
        );
        assert_eq!(
            prefix.start, self.start,
            "after() requires a prefix which starts where this window starts"
        );
        assert!(
            prefix.end <= self.end,
            "after() requires a prefix no longer than this window"
        );
        if prefix.end == self.end {
            return Self::empty();
        }
        Self {
            base: self.base.clone(),
            start: prefix.end,
            end: self.end,
        }
    }

    /// Concatenates two windows.
    ///
    /// Adjacent windows of the same buffer fuse without copying. A window
    /// which ends at the end of its growable buffer is extended in place.
    /// Everything else is copied into a fresh growable buffer.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        if self.base.same(&other.base) && self.end == other.start {
            return Self {
                base: self.base.clone(),
                start: self.start,
                end: other.end,
            };
        }
        let appended = other.to_string();
        if let Base::Builder(buffer) = &self.base {
            let mut buffer = buffer.write();
            if buffer.len() == self.end {
                buffer.push_str(&appended);
                return Self {
                    base: self.base.clone(),
                    start: self.start,
                    end: self.end + appended.len(),
                };
            }
        }
        let mut builder = String::with_capacity(self.len() + appended.len());
        self.with_str(|s| builder.push_str(s));
        builder.push_str(&appended);
        let end = builder.len();
        Self {
            base: Base::Builder(Arc::new(RwLock::new(builder))),
            start: 0,
            end,
        }
    }

    /// Concatenates a literal. If the original text already continues with
    /// `text` right after this window, the window just grows.
    #[must_use]
    pub fn concat_str(&self, text: &str) -> Self {
        if text.is_empty() {
            return self.clone();
        }
        if let Base::Text(base) = &self.base
            && base[self.end..].starts_with(text)
        {
            return Self {
                base: self.base.clone(),
                start: self.start,
                end: self.end + text.len(),
            };
        }
        self.concat(&Self::of(text))
    }

    /// Concatenates any mix of windows and literals, left to right.
    #[must_use]
    pub fn concat_all<'a>(parts: impl IntoIterator<Item = PoolPart<'a>>) -> Self {
        parts
            .into_iter()
            .fold(Self::empty(), |total, part| match part {
                PoolPart::Pool(pool) => total.concat(pool),
                PoolPart::Str(text) => total.concat_str(text),
            })
    }

    /// 1-based line number, within the original text, of this window's start.
    ///
    /// # Panics
    ///
    /// Panics if this window was produced by concatenating disjoint pieces.
    #[must_use]
    pub fn base_line_number_start(&self) -> usize {
        self.base_line_number_of_offset(self.start)
    }

    /// 1-based line number, within the original text, of this window's end.
    ///
    /// # Panics
    ///
    /// Panics if this window was produced by concatenating disjoint pieces.
    #[must_use]
    pub fn base_line_number_end(&self) -> usize {
        self.base_line_number_of_offset(self.end)
    }

    /// True while this window still points into an original text.
    #[must_use]
    pub const fn is_text_based(&self) -> bool {
        matches!(self.base, Base::Text(_))
    }

    #[expect(
        clippy::panic,
        reason = "asking for line numbers of a concatenated buffer is a caller bug"
    )]
    fn base_line_number_of_offset(&self, offset: usize) -> usize {
        match &self.base {
            Base::Text(text) => text.as_bytes()[..offset]
                .iter()
                .filter(|&&b| b == b'\n')
                .count()
                + 1,
            Base::Builder(_) => panic!(
                "When you call concat on non-contiguous parts, you lose the connection to the original text."
            ),
        }
    }

    fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        match &self.base {
            Base::Text(text) => f(&text[self.start..self.end]),
            Base::Builder(buffer) => {
                let buffer = buffer.read();
                f(&buffer[self.start..self.end])
            }
        }
    }
}

impl Default for PoolString {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for PoolString {
    fn from(value: &str) -> Self {
        Self::of(value)
    }
}

impl fmt::Display for PoolString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|s| f.write_str(s))
    }
}

impl fmt::Debug for PoolString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PoolString").field(&self.to_string()).finish()
    }
}

impl PartialEq for PoolString {
    fn eq(&self, other: &Self) -> bool {
        // materialize one side so a shared buffer is never locked twice
        let other = other.to_string();
        self.same_as(&other)
    }
}

impl Eq for PoolString {}

impl PartialEq<str> for PoolString {
    fn eq(&self, other: &str) -> bool {
        self.same_as(other)
    }
}

impl PartialEq<&str> for PoolString {
    fn eq(&self, other: &&str) -> bool {
        self.same_as(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_and_empty() {
        let pool = PoolString::of("abc");
        assert_eq!(pool.len(), 3);
        assert!(!pool.is_empty());
        assert_eq!(pool.to_string(), "abc");

        assert!(PoolString::of("").is_empty());
        assert!(PoolString::empty().is_empty());
        assert_eq!(PoolString::default().to_string(), "");
    }

    #[test]
    fn test_sub_sequence_is_zero_copy() {
        let pool = PoolString::of("0123456789");
        let sub = pool.sub_sequence(2, 5);
        assert_eq!(sub, "234");
        assert!(sub.base.same(&pool.base));
        assert_eq!(sub.char_at(0), Some('2'));
        assert_eq!(sub.char_at(3), None);
        assert!(pool.sub_sequence(4, 4).is_empty());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_sub_sequence_out_of_bounds() {
        let _ = PoolString::of("abc").sub_sequence(1, 4);
    }

    #[test]
    fn test_index_of_stays_within_window() {
        let pool = PoolString::of("abcabc");
        let first = pool.sub_sequence(0, 3);
        assert_eq!(pool.index_of("ca"), Some(2));
        assert_eq!(first.index_of("ca"), None);
        assert_eq!(first.index_of_char('c'), Some(2));
        assert_eq!(pool.sub_sequence(3, 6).index_of("b"), Some(1));
    }

    #[test]
    fn test_starts_ends_same_as() {
        let pool = PoolString::of("hello world");
        assert!(pool.starts_with("hello"));
        assert!(!pool.starts_with("world"));
        assert!(pool.ends_with("world"));
        assert!(pool.same_as("hello world"));
        assert!(!pool.same_as("hello"));
    }

    #[test]
    fn test_until_and_after() {
        let pool = PoolString::of("before|after");
        let before = pool.until("|");
        assert_eq!(before, "before");
        let rest = pool.after(&before);
        assert_eq!(rest, "|after");
        assert!(rest.base.same(&pool.base));

        let missing = pool.until("#");
        assert_eq!(missing, "before|after");
        assert!(pool.after(&missing).is_empty());

        let at_start = pool.until("before");
        assert!(at_start.is_empty());
        assert_eq!(pool.after(&at_start), "before|after");
    }

    #[test]
    #[should_panic(expected = "same buffer")]
    fn test_after_rejects_foreign_prefix() {
        let pool = PoolString::of("abc");
        let other = PoolString::of("abc").until("c");
        let _ = pool.after(&other);
    }

    #[test]
    #[should_panic(expected = "starts where")]
    fn test_after_rejects_shifted_prefix() {
        let pool = PoolString::of("abcdef");
        let shifted = pool.sub_sequence(1, 3);
        let _ = pool.after(&shifted);
    }

    #[test]
    fn test_concat_contiguous_stays_zero_copy() {
        let pool = PoolString::of("abcdef");
        let left = pool.sub_sequence(0, 2);
        let right = pool.sub_sequence(2, 5);
        let joined = left.concat(&right);
        assert_eq!(joined, "abcde");
        assert!(joined.is_text_based());
        assert!(joined.base.same(&pool.base));
    }

    #[test]
    fn test_concat_disjoint_copies_then_extends_in_place() {
        let pool = PoolString::of("abcdef");
        let a = pool.sub_sequence(0, 1);
        let c = pool.sub_sequence(2, 3);
        let ac = a.concat(&c);
        assert_eq!(ac, "ac");
        assert!(!ac.is_text_based());

        let ace = ac.concat(&pool.sub_sequence(4, 5));
        assert_eq!(ace, "ace");
        assert!(ace.base.same(&ac.base), "should append in place");

        // `ac` no longer ends at the end of the buffer, so it must copy
        let acf = ac.concat(&pool.sub_sequence(5, 6));
        assert_eq!(acf, "acf");
        assert!(!acf.base.same(&ac.base));
        assert_eq!(ace, "ace");
        assert_eq!(ac, "ac");
    }

    #[test]
    fn test_concat_with_empty() {
        let pool = PoolString::of("abc");
        assert!(pool.concat(&PoolString::empty()).base.same(&pool.base));
        assert!(PoolString::empty().concat(&pool).base.same(&pool.base));
    }

    #[test]
    fn test_concat_str_grows_when_text_matches() {
        let pool = PoolString::of("key: value");
        let key = pool.until(":");
        let grown = key.concat_str(": ");
        assert_eq!(grown, "key: ");
        assert!(grown.base.same(&pool.base));

        let copied = key.concat_str("=");
        assert_eq!(copied, "key=");
        assert!(!copied.is_text_based());
    }

    #[test]
    fn test_concat_all() {
        let pool = PoolString::of("1.2.3");
        let joined = PoolString::concat_all([
            PoolPart::from("["),
            PoolPart::from(&pool),
            PoolPart::from("]"),
        ]);
        assert_eq!(joined, "[1.2.3]");
        assert_eq!(PoolString::concat_all([]), "");
    }

    #[test]
    fn test_line_numbers() {
        let pool = PoolString::of("one\ntwo\nthree\n");
        assert_eq!(pool.base_line_number_start(), 1);
        assert_eq!(pool.base_line_number_end(), 4);
        let three = pool.sub_sequence(8, 13);
        assert_eq!(three, "three");
        assert_eq!(three.base_line_number_start(), 3);
        assert_eq!(pool.sub_sequence(3, 4).base_line_number_start(), 1);
        assert_eq!(pool.sub_sequence(4, 5).base_line_number_start(), 2);
    }

    #[test]
    #[should_panic(expected = "lose the connection")]
    fn test_line_numbers_require_original_text() {
        let pool = PoolString::of("a\nb\nc");
        let joined = pool.sub_sequence(0, 1).concat(&pool.sub_sequence(4, 5));
        let _ = joined.base_line_number_start();
    }

    #[test]
    fn test_multibyte_text() {
        let pool = PoolString::of("éßü");
        assert_eq!(pool.len(), "éßü".len());
        assert_eq!(pool.char_at(0), Some('é'));
        let middle = pool.until("ü").after(&pool.until("ß"));
        assert_eq!(middle, "ß");
    }

    #[test]
    fn test_shared_across_threads() {
        let pool = PoolString::of("a").concat(&PoolString::of("b"));
        let handle = std::thread::spawn(move || pool.to_string());
        assert_eq!(handle.join().unwrap(), "ab");
    }
}
