//! Feed query identity.
//!
//! A [`FeedQuery`] is the composite key under which one logical feed's pages
//! are cached: which feed, how it is ranked, and any extra filter variables.
//! Two feed instances built from equal queries read and write the same cache
//! entry, so a vote applied through one is visible to the other.

use std::collections::BTreeMap;
use std::fmt;

/// Which feed a query addresses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum FeedKind {
    /// The personalized "my feed" for the signed-in user.
    MyFeed,
    /// The global popular feed.
    Popular,
    /// Posts the user has upvoted.
    Upvoted,
    /// A squad (community group) feed, by squad handle.
    Squad(String),
    /// A read-only preview feed (e.g. while editing feed filters).
    /// Infinite scrolling is disabled for previews.
    Preview,
}

impl FeedKind {
    /// Short name used in analytics events and the UI header.
    pub fn name(&self) -> &str {
        match self {
            FeedKind::MyFeed => "my-feed",
            FeedKind::Popular => "popular",
            FeedKind::Upvoted => "upvoted",
            FeedKind::Squad(_) => "squad",
            FeedKind::Preview => "preview",
        }
    }
}

/// How the remote ranking service should order the feed.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default)]
pub enum Ranking {
    #[default]
    Popularity,
    Time,
}

impl Ranking {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ranking::Popularity => "POPULARITY",
            Ranking::Time => "TIME",
        }
    }
}

/// Composite key identifying one logical feed's cached page sequence.
///
/// Equality and hashing cover every field, so any change to the ranking or
/// the filter variables addresses a fresh cache entry.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FeedQuery {
    pub kind: FeedKind,
    pub ranking: Ranking,
    /// Extra filter variables (tag, source, period…). A `BTreeMap` keeps
    /// iteration order deterministic so equal variable sets hash equally.
    pub variables: BTreeMap<String, String>,
}

impl FeedQuery {
    pub fn new(kind: FeedKind) -> Self {
        Self {
            kind,
            ranking: Ranking::default(),
            variables: BTreeMap::new(),
        }
    }

    pub fn with_ranking(mut self, ranking: Ranking) -> Self {
        self.ranking = ranking;
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Preview feeds never trigger infinite scrolling.
    pub fn is_preview(&self) -> bool {
        matches!(self.kind, FeedKind::Preview)
    }
}

impl fmt::Display for FeedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FeedKind::Squad(handle) => write!(f, "squad/{handle}")?,
            kind => write!(f, "{}", kind.name())?,
        }
        if self.ranking == Ranking::Time {
            write!(f, " (by time)")?;
        }
        Ok(())
    }
}
