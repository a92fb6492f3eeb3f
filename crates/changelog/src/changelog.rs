//! Changelog parsing and round-trip serialization.
//!
//! [`Changelog`] partitions a "Keep a Changelog" document into its version
//! headers and the release notes under each header. Everything it does not
//! understand is kept verbatim, so writing an untouched changelog back out
//! reproduces the input byte for byte, and edits only touch what they change.
//!
//! Grammar problems never fail the parse. They are collected as
//! [`ParseError`]s, and the text after the first bad header is kept as an
//! unparsed remainder.

use crate::error::{Error, Result};
use crate::pool::{PoolPart, PoolString};
use std::fmt;
use tracing::debug;

const VERSION_BEGIN: &str = "\n## [";
const UNRELEASED: &str = "\n## [Unreleased]";
const VERSION_DATE_SEPARATOR: &str = "] - ";
const DATE_CHARS: usize = "yyyy-mm-dd".len();

/// Everything from this marker onward is never parsed.
pub const DONT_PARSE_BELOW_HERE: &str = "\n<!-- END CHANGELOG -->";

/// A grammar problem found while parsing, anchored to a source line when possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line number, or `None` for a problem with the document as a whole.
    pub line: Option<usize>,
    /// Human-readable description.
    pub message: String,
}

impl ParseError {
    fn new(line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }

    /// Renders as `path:line: message`, or `path: message` without a line.
    #[must_use]
    pub fn render(&self, path: &str) -> String {
        match self.line {
            Some(line) => format!("{path}:{line}: {}", self.message),
            None => format!("{path}: {}", self.message),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{line}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// A single section of the changelog: its header plus the notes below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionEntry {
    /// The `## [Unreleased]` section.
    Unreleased {
        /// Text after `[Unreleased]` on the header line, including its leading space.
        header_trailer: PoolString,
        /// Notes, empty or starting with a newline.
        changes: PoolString,
    },
    /// A published `## [x.y.z] - yyyy-mm-dd` section.
    Released {
        /// The version between the brackets.
        version: PoolString,
        /// Ten characters after `] - `, conventionally `yyyy-mm-dd`.
        date: PoolString,
        /// Text after the date and its separating space.
        header_trailer: Option<PoolString>,
        /// Notes, empty or starting with a newline.
        changes: PoolString,
    },
}

impl VersionEntry {
    /// A released entry with the given version and date and no notes.
    #[must_use]
    pub fn version_date(version: &str, date: &str) -> Self {
        Self::Released {
            version: PoolString::of(version),
            date: PoolString::of(date),
            header_trailer: None,
            changes: PoolString::empty(),
        }
    }

    /// True for the `[Unreleased]` section.
    #[must_use]
    pub const fn is_unreleased(&self) -> bool {
        matches!(self, Self::Unreleased { .. })
    }

    /// The version, or `None` for the unreleased section.
    #[must_use]
    pub const fn version(&self) -> Option<&PoolString> {
        match self {
            Self::Unreleased { .. } => None,
            Self::Released { version, .. } => Some(version),
        }
    }

    /// The date, or `None` for the unreleased section.
    #[must_use]
    pub const fn date(&self) -> Option<&PoolString> {
        match self {
            Self::Unreleased { .. } => None,
            Self::Released { date, .. } => Some(date),
        }
    }

    /// Anything that appears after the version tag on the header line.
    ///
    /// For `[Unreleased]` the stored text keeps its leading space, and a
    /// stored text of one character or less reads as `None`.
    #[must_use]
    pub fn header_trailer(&self) -> Option<PoolString> {
        match self {
            Self::Unreleased { header_trailer, .. } => {
                let first = header_trailer.char_at(0)?;
                if first.len_utf8() == header_trailer.len() {
                    None
                } else {
                    Some(header_trailer.sub_sequence(first.len_utf8(), header_trailer.len()))
                }
            }
            Self::Released { header_trailer, .. } => header_trailer.clone(),
        }
    }

    /// The notes for this version, empty or starting with a newline.
    #[must_use]
    pub const fn changes(&self) -> &PoolString {
        match self {
            Self::Unreleased { changes, .. } | Self::Released { changes, .. } => changes,
        }
    }

    /// Replaces the text after the version tag on the header line.
    ///
    /// # Panics
    ///
    /// Panics if `header_trailer` contains a newline.
    #[must_use]
    pub fn with_header_trailer(self, header_trailer: Option<&str>) -> Self {
        if let Some(text) = header_trailer {
            assert!(
                !text.contains('\n'),
                "header text must stay on the header line"
            );
        }
        match self {
            Self::Unreleased { changes, .. } => Self::Unreleased {
                header_trailer: header_trailer
                    .map_or_else(PoolString::empty, |text| PoolString::of(&format!(" {text}"))),
                changes,
            },
            Self::Released {
                version,
                date,
                changes,
                ..
            } => Self::Released {
                version,
                date,
                header_trailer: header_trailer.map(PoolString::of),
                changes,
            },
        }
    }

    /// Replaces the notes. Unix or windows newlines are both accepted.
    ///
    /// # Panics
    ///
    /// Panics unless `changes` is empty or starts with a newline.
    #[must_use]
    pub fn with_changes(self, changes: &str) -> Self {
        let unix = changes.replace("\r\n", "\n");
        if self.changes().same_as(&unix) {
            return self;
        }
        self.with_changes_pool(PoolString::of(&unix))
    }

    fn with_changes_pool(self, changes: PoolString) -> Self {
        assert!(
            changes.is_empty() || changes.starts_with("\n"),
            "changes must be empty or start with a newline"
        );
        match self {
            Self::Unreleased { header_trailer, .. } => Self::Unreleased {
                header_trailer,
                changes,
            },
            Self::Released {
                version,
                date,
                header_trailer,
                ..
            } => Self::Released {
                version,
                date,
                header_trailer,
                changes,
            },
        }
    }

    fn to_pool_unix(&self) -> PoolString {
        match self {
            // the preamble stops right before the marker, so the marker is written here
            Self::Unreleased {
                header_trailer,
                changes,
            } => PoolString::concat_all([
                PoolPart::from(UNRELEASED),
                header_trailer.into(),
                changes.into(),
            ]),
            Self::Released {
                version,
                date,
                header_trailer: None,
                changes,
            } => PoolString::concat_all([
                PoolPart::from(VERSION_BEGIN),
                version.into(),
                VERSION_DATE_SEPARATOR.into(),
                date.into(),
                changes.into(),
            ]),
            Self::Released {
                version,
                date,
                header_trailer: Some(misc),
                changes,
            } => PoolString::concat_all([
                PoolPart::from(VERSION_BEGIN),
                version.into(),
                VERSION_DATE_SEPARATOR.into(),
                date.into(),
                " ".into(),
                misc.into(),
                changes.into(),
            ]),
        }
    }
}

enum Header {
    Unreleased(PoolString),
    Released {
        version: PoolString,
        date: PoolString,
        header_trailer: Option<PoolString>,
    },
}

impl Header {
    fn into_entry(self, changes: PoolString) -> VersionEntry {
        match self {
            Self::Unreleased(header_trailer) => VersionEntry::Unreleased {
                header_trailer,
                changes,
            },
            Self::Released {
                version,
                date,
                header_trailer,
            } => VersionEntry::Released {
                version,
                date,
                header_trailer,
                changes,
            },
        }
    }
}

/// A parsed changelog which can be written back out unchanged.
#[derive(Debug, Clone)]
pub struct Changelog {
    windows_newlines: bool,
    before_unreleased: PoolString,
    entries: Vec<VersionEntry>,
    unparseable_after_error: Option<PoolString>,
    dont_parse: PoolString,
    errors: Vec<ParseError>,
}

impl Changelog {
    /// Parses a changelog, treating [`DONT_PARSE_BELOW_HERE`] as the end of the parseable region.
    #[must_use]
    pub fn parse(content_raw: &str) -> Self {
        Self::parse_with_marker(content_raw, DONT_PARSE_BELOW_HERE)
    }

    /// Parses a changelog, treating `dont_parse_below_here` as the end of the parseable region.
    #[must_use]
    pub fn parse_with_marker(content_raw: &str, dont_parse_below_here: &str) -> Self {
        let unix = content_raw.replace("\r\n", "\n");
        let windows_newlines = unix.len() < content_raw.len();
        let content_unix = PoolString::of(&unix);

        let mut to_parse = if dont_parse_below_here.is_empty() {
            content_unix.clone()
        } else {
            content_unix.until(dont_parse_below_here)
        };
        let dont_parse = content_unix.after(&to_parse);

        let before_unreleased = to_parse.until(UNRELEASED);
        to_parse = to_parse.after(&before_unreleased);

        let mut changelog = Self {
            windows_newlines,
            before_unreleased,
            entries: Vec::new(),
            unparseable_after_error: None,
            dont_parse,
            errors: Vec::new(),
        };

        if to_parse.is_empty() {
            if let Some(almost_had_it) = content_raw.find("## [Unreleased]") {
                let line = PoolString::of(content_raw)
                    .sub_sequence(almost_had_it, almost_had_it + 1)
                    .base_line_number_start();
                changelog.add_error(
                    Some(line),
                    "Needs a newline directly before '## [Unreleased]'",
                );
            } else {
                changelog.add_error(None, "Needs to have '## [Unreleased]'");
            }
            return changelog;
        }

        loop {
            let header_end = to_parse
                .sub_sequence(1, to_parse.len())
                .index_of_char('\n');
            let line = match header_end {
                Some(idx) => to_parse.sub_sequence(0, idx + 1),
                None => to_parse.clone(),
            };
            let Some(header) = changelog.parse_header(&line) else {
                changelog.unparseable_after_error = Some(to_parse);
                break;
            };
            to_parse = to_parse.after(&line);
            let changes = to_parse.until(VERSION_BEGIN);
            to_parse = to_parse.after(&changes);
            changelog.entries.push(header.into_entry(changes));
            if to_parse.is_empty() {
                break;
            }
        }

        debug!(
            entries = changelog.entries.len(),
            errors = changelog.errors.len(),
            windows_newlines,
            "Parsed changelog"
        );
        changelog
    }

    fn parse_header(&mut self, line: &PoolString) -> Option<Header> {
        if self.entries.is_empty() {
            debug_assert!(line.starts_with(UNRELEASED));
            return Some(Header::Unreleased(
                line.sub_sequence(UNRELEASED.len(), line.len()),
            ));
        }
        debug_assert!(line.starts_with(VERSION_BEGIN));
        // the window begins with the newline which ends the previous line
        let line_number = line.base_line_number_start() + 1;

        let Some(version_end) = line.index_of(VERSION_DATE_SEPARATOR) else {
            self.add_error(
                Some(line_number),
                "'] - ' is missing from the expected '## [x.y.z] - yyyy-mm-dd'",
            );
            return None;
        };

        let start_date = version_end + VERSION_DATE_SEPARATOR.len();
        let after_separator = line.sub_sequence(start_date, line.len()).to_string();
        let Some(date_len) = byte_len_of_chars(&after_separator, DATE_CHARS) else {
            self.add_error(
                Some(line_number),
                "'yyyy-mm-dd' is missing from the expected '## [x.y.z] - yyyy-mm-dd'",
            );
            return None;
        };
        let end_date = start_date + date_len;

        let header_trailer = if end_date == line.len() {
            None
        } else if line.char_at(end_date) == Some(' ') {
            Some(line.sub_sequence(end_date + 1, line.len()))
        } else {
            self.add_error(
                Some(line_number),
                "If you want to put stuff after 'yyyy-mm-dd', you need to separate it with a space",
            );
            return None;
        };

        Some(Header::Released {
            version: line.sub_sequence(VERSION_BEGIN.len(), version_end),
            date: line.sub_sequence(start_date, end_date),
            header_trailer,
        })
    }

    fn add_error(&mut self, line: Option<usize>, message: &str) {
        self.errors.push(ParseError::new(line, message));
    }

    /// Grammar errors, in the order they were encountered.
    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Fails with every grammar error rendered as `path[:line]: message`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if the changelog has any grammar errors.
    pub fn check(&self, path: &str) -> Result<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let rendered = self
            .errors
            .iter()
            .map(|error| error.render(path))
            .collect::<Vec<_>>()
            .join("\n");
        Err(Error::malformed(rendered))
    }

    /// The parsed sections, `[Unreleased]` first.
    #[must_use]
    pub fn entries(&self) -> &[VersionEntry] {
        &self.entries
    }

    /// Everything before the `## [Unreleased]` header.
    #[must_use]
    pub const fn preamble(&self) -> &PoolString {
        &self.before_unreleased
    }

    /// The verbatim text which could not be parsed, if a header was malformed.
    #[must_use]
    pub const fn unparsed(&self) -> Option<&PoolString> {
        self.unparseable_after_error.as_ref()
    }

    /// The region from the do-not-parse marker onward.
    #[must_use]
    pub const fn dont_parse(&self) -> &PoolString {
        &self.dont_parse
    }

    /// True if the input used `\r\n` newlines.
    #[must_use]
    pub const fn windows_newlines(&self) -> bool {
        self.windows_newlines
    }

    /// The most recently published version, if any.
    #[must_use]
    pub fn version_last(&self) -> Option<String> {
        self.entries
            .get(1)
            .and_then(VersionEntry::version)
            .map(ToString::to_string)
    }

    /// The unreleased notes, with unix newlines. Starts with a newline unless empty.
    #[must_use]
    pub fn unreleased_changes(&self) -> String {
        self.entries
            .first()
            .map_or_else(String::new, |entry| entry.changes().to_string())
    }

    /// True if the unreleased section holds nothing but ASCII whitespace and control characters.
    #[must_use]
    pub fn no_unreleased_changes(&self) -> bool {
        self.unreleased_changes()
            .trim_matches(|c: char| c <= ' ')
            .is_empty()
    }

    /// The whole changelog with unix newlines.
    #[must_use]
    pub fn to_string_unix(&self) -> String {
        let mut total = self.before_unreleased.clone();
        for entry in &self.entries {
            total = total.concat(&entry.to_pool_unix());
        }
        if let Some(unparsed) = &self.unparseable_after_error {
            total = total.concat(unparsed);
        }
        total.concat(&self.dont_parse).to_string()
    }

    /// A new changelog where `[Unreleased]` has been published as `version` on `date`.
    ///
    /// The unreleased notes move to the new entry and `[Unreleased]` is left
    /// with a single blank line. `self` is not modified.
    ///
    /// # Panics
    ///
    /// Panics if the first entry is not `[Unreleased]`, which happens when the
    /// changelog had no `## [Unreleased]` header to begin with.
    #[must_use]
    pub fn release_unreleased(&self, version: &str, date: &str) -> Self {
        let mut entries = self.entries.clone();
        let Some(unreleased) = entries.first_mut().filter(|entry| entry.is_unreleased()) else {
            unreleased_required()
        };
        let released = VersionEntry::version_date(version, date)
            .with_changes_pool(unreleased.changes().clone());
        *unreleased = unreleased.clone().with_changes("\n");
        entries.insert(1, released);
        Self {
            entries,
            ..self.clone()
        }
    }
}

#[expect(
    clippy::panic,
    reason = "releasing a changelog without [Unreleased] is a caller bug"
)]
fn unreleased_required() -> ! {
    panic!("release_unreleased() requires the first entry to be '## [Unreleased]'")
}

/// Byte length of the first `count` chars of `text`, or `None` if it is shorter.
fn byte_len_of_chars(text: &str, count: usize) -> Option<usize> {
    text.char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(text.len()))
        .nth(count)
}

impl fmt::Display for Changelog {
    /// The whole changelog, with the same newlines as the input.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unix = self.to_string_unix();
        if self.windows_newlines {
            f.write_str(&unix.replace('\n', "\r\n"))
        } else {
            f.write_str(&unix)
        }
    }
}
