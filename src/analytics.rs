//! Analytics event emission.
//!
//! Every user action on the feed produces one named event with a flat
//! property map, carrying the item's grid coordinates so the backend can
//! reconstruct what the user actually saw. Delivery is fire-and-forget:
//! sinks never surface failures to the user.

use serde_json::{Map, Value};

use crate::feed::{Ad, FeedQuery, Post};
use crate::layout::GridPosition;

/// A discrete, named analytics event.
#[derive(Debug, Clone)]
pub struct Event {
    pub name: &'static str,
    /// Flat property map; nested values are never used.
    pub props: Map<String, Value>,
}

impl Event {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            props: Map::new(),
        }
    }

    pub fn prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }
}

/// Shared event properties describing which feed the action happened in.
fn feed_extra(event: Event, query: &FeedQuery) -> Event {
    event
        .prop("feed_name", query.kind.name())
        .prop("ranking", query.ranking.as_str())
        .prop("origin", "feed")
}

/// Event for a user action on a post card.
pub fn post_event(
    name: &'static str,
    post: &Post,
    query: &FeedQuery,
    position: GridPosition,
    columns: usize,
) -> Event {
    feed_extra(
        Event::new(name)
            .prop("post_id", post.id.as_str())
            .prop("post_source", post.source_name.as_str())
            .prop("row", position.row as u64)
            .prop("column", position.column as u64)
            .prop("columns", columns as u64),
        query,
    )
}

/// Event for a user action on a promoted item.
pub fn ad_event(
    name: &'static str,
    ad: &Ad,
    query: &FeedQuery,
    position: GridPosition,
    columns: usize,
) -> Event {
    feed_extra(
        Event::new(name)
            .prop("ad_id", ad.id.as_str())
            .prop("company", ad.company.as_str())
            .prop("row", position.row as u64)
            .prop("column", position.column as u64)
            .prop("columns", columns as u64),
        query,
    )
}

/// Where events go. Implementations must swallow their own failures.
pub trait AnalyticsSink {
    fn track(&self, event: Event);
}

/// Writes events to the log, one line each, for downstream shipping.
pub struct LogSink;

impl AnalyticsSink for LogSink {
    fn track(&self, event: Event) {
        log::info!(
            target: "analytics",
            "{} {}",
            event.name,
            Value::Object(event.props)
        );
    }
}

/// Discards everything; used when analytics are disabled.
pub struct NullSink;

impl AnalyticsSink for NullSink {
    fn track(&self, _event: Event) {}
}


#[cfg(test)]
mod tests {
    use super::testutil::RecordingSink;
    use super::*;
    use crate::feed::testutil::{make_ad, make_post};
    use crate::feed::{FeedKind, Ranking};
    use crate::layout::position;

    #[test]
    fn post_event_carries_grid_coordinates_and_feed_context() {
        let post = make_post("p1", "title");
        let query = crate::feed::FeedQuery::new(FeedKind::MyFeed).with_ranking(Ranking::Time);

        let event = post_event("upvote post", &post, &query, position(5, 2), 2);

        assert_eq!(event.name, "upvote post");
        assert_eq!(event.props["post_id"], "p1");
        assert_eq!(event.props["row"], 2);
        assert_eq!(event.props["column"], 1);
        assert_eq!(event.props["columns"], 2);
        assert_eq!(event.props["feed_name"], "my-feed");
        assert_eq!(event.props["ranking"], "TIME");
        assert_eq!(event.props["origin"], "feed");
    }

    #[test]
    fn ad_event_uses_the_ad_namespace() {
        let ad = make_ad("a1");
        let query = crate::feed::FeedQuery::new(FeedKind::Popular);

        let event = ad_event("ad click", &ad, &query, position(0, 3), 3);

        assert_eq!(event.props["ad_id"], "a1");
        assert!(event.props.get("post_id").is_none());
    }

    #[test]
    fn properties_stay_flat() {
        let post = make_post("p", "t");
        let query = crate::feed::FeedQuery::new(FeedKind::Popular);
        let event = post_event("click", &post, &query, position(0, 1), 1);
        assert!(event
            .props
            .values()
            .all(|v| !v.is_object() && !v.is_array()));
    }

    #[test]
    fn recording_sink_collects_in_order() {
        let sink = RecordingSink::default();
        sink.track(Event::new("first"));
        sink.track(Event::new("second"));
        assert_eq!(sink.names(), ["first", "second"]);
    }
}
