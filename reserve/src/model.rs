//! Data types for content records and their identifiers.

use std::fmt;

/// Title given to every placeholder record.
pub const PLACEHOLDER_TITLE: &str = "reserve placeholder record";
/// Body given to every placeholder record.
pub const PLACEHOLDER_BODY: &str = "reserve";
/// Slug given to every placeholder record.
pub const PLACEHOLDER_SLUG: &str = "reserve";

/// Identifier assigned to a record by the store's sequence.
///
/// Identifiers start at 1. [`RecordId::NONE`] (0) stands for "nothing issued
/// yet" and is never assigned to a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(u64);

impl RecordId {
    pub const NONE: RecordId = RecordId(0);
    pub const FIRST: RecordId = RecordId(1);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// The identifier immediately after this one, or `None` on overflow.
    pub fn checked_next(self) -> Option<RecordId> {
        self.0.checked_add(1).map(RecordId)
    }

    /// The identifier immediately before this one, saturating at
    /// [`RecordId::NONE`].
    pub fn saturating_prev(self) -> RecordId {
        RecordId(self.0.saturating_sub(1))
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Publication state of a record.
///
/// Only [`RecordStatus::Publish`] records show up in published listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordStatus {
    Publish,
    Draft,
    Pending,
    Private,
    Trash,
}

impl RecordStatus {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            RecordStatus::Publish => 0,
            RecordStatus::Draft => 1,
            RecordStatus::Pending => 2,
            RecordStatus::Private => 3,
            RecordStatus::Trash => 4,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(RecordStatus::Publish),
            1 => Some(RecordStatus::Draft),
            2 => Some(RecordStatus::Pending),
            3 => Some(RecordStatus::Private),
            4 => Some(RecordStatus::Trash),
            _ => None,
        }
    }

    pub fn is_published(self) -> bool {
        self == RecordStatus::Publish
    }
}

/// Caller-supplied content of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFields {
    pub title: String,
    pub body: String,
    pub slug: String,
    pub status: RecordStatus,
    /// Content type, e.g. `"post"` or `"page"`.
    pub kind: String,
    pub comments_open: bool,
}

impl RecordFields {
    /// A published post with the given title and body.
    pub fn post(title: impl Into<String>, body: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            slug: title.to_lowercase().replace(' ', "-"),
            title,
            body: body.into(),
            status: RecordStatus::Publish,
            kind: "post".to_string(),
            comments_open: true,
        }
    }

    /// The fixed fields of an allocator-generated placeholder.
    ///
    /// Placeholders are drafts so they never appear in published listings.
    pub fn placeholder() -> Self {
        Self {
            title: PLACEHOLDER_TITLE.to_string(),
            body: PLACEHOLDER_BODY.to_string(),
            slug: PLACEHOLDER_SLUG.to_string(),
            status: RecordStatus::Draft,
            kind: "post".to_string(),
            comments_open: true,
        }
    }

    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether these fields carry the placeholder markers.
    pub fn is_placeholder(&self) -> bool {
        self.title == PLACEHOLDER_TITLE
            && self.body == PLACEHOLDER_BODY
            && self.slug == PLACEHOLDER_SLUG
    }
}

/// A record as stored, with the identifier the sequence assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub id: RecordId,
    pub fields: RecordFields,
}
