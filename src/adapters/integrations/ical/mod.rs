//! Timetable adapter. Implements TimetablePort over one or more iCalendar feeds.
//!
//! Feeds are fetched one after another and their entries concatenated in feed order.

pub mod parser;

use crate::adapters::upstream;
use crate::domain::entities::{TIMETABLE_SOURCE, UNTITLED};
use crate::domain::{AcademicItem, DomainError, Metadata};
use crate::ports::{ItemSource, TimetableQuery};
use crate::shared::config::IcalConfig;
use parser::{FeedEvent, parse_feed};
use reqwest::Client;
use tracing::info;

const PROVIDER: &str = "ical";

pub struct IcalFeedAdapter {
    client: Client,
    config: IcalConfig,
}

impl IcalFeedAdapter {
    pub fn new(config: IcalConfig) -> Result<Self, DomainError> {
        Ok(Self {
            client: upstream::build_client(PROVIDER, config.timeout)?,
            config,
        })
    }

    fn to_item(event: FeedEvent, feed_url: &str) -> AcademicItem {
        AcademicItem {
            id: format!("wu_ical:{}", event.uid),
            title: event.summary.unwrap_or_else(|| UNTITLED.to_string()),
            kind: "timetable".to_string(),
            course_code: None,
            due_date: None,
            start: Some(event.start),
            end: event.end,
            source: TIMETABLE_SOURCE.to_string(),
            url: Some(feed_url.to_string()),
            status: None,
            metadata: Metadata::new(),
        }
    }
}

#[async_trait::async_trait]
impl ItemSource for IcalFeedAdapter {
    type Query = TimetableQuery;
    type Item = AcademicItem;

    async fn list_items(&self, query: TimetableQuery) -> Result<Vec<AcademicItem>, DomainError> {
        let mut items = Vec::new();
        for url in &self.config.feed_urls {
            let body = upstream::send_text(PROVIDER, self.client.get(url)).await?;
            let events = parse_feed(&body)
                .map_err(|e| DomainError::upstream(PROVIDER, format!("{url}: {e}")))?;
            let before = items.len();
            items.extend(
                events
                    .into_iter()
                    .filter(|e| query.window.contains(&e.start))
                    .map(|e| Self::to_item(e, url)),
            );
            info!(url = %url, count = items.len() - before, "timetable feed parsed");
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::datetime::{TimeWindow, parse_instant, to_rfc3339};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED_A: &str = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:a1\r\nSUMMARY:Macro\r\n\
DTSTART:20240301T080000Z\r\nDTEND:20240301T093000Z\r\nEND:VEVENT\r\n\
BEGIN:VEVENT\r\nUID:a2\r\nSUMMARY:Micro\r\nDTSTART:20240302T080000Z\r\nEND:VEVENT\r\n\
END:VCALENDAR\r\n";

    const FEED_B: &str = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:b1\r\n\
DTSTART;VALUE=DATE:20240301\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

    async fn server_with_feeds() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.ics"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED_A))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b.ics"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED_B))
            .mount(&server)
            .await;
        server
    }

    fn adapter(urls: Vec<String>) -> IcalFeedAdapter {
        IcalFeedAdapter::new(IcalConfig {
            feed_urls: urls,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_feeds_concatenated_in_order() {
        let server = server_with_feeds().await;
        let a = format!("{}/a.ics", server.uri());
        let b = format!("{}/b.ics", server.uri());

        let items = adapter(vec![a.clone(), b.clone()])
            .list_items(TimetableQuery::default())
            .await
            .unwrap();

        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["wu_ical:a1", "wu_ical:a2", "wu_ical:b1"]);
        assert_eq!(items[0].kind, "timetable");
        assert_eq!(items[0].source, "wu_vvz");
        assert_eq!(items[0].url.as_deref(), Some(a.as_str()));
        assert_eq!(items[2].url.as_deref(), Some(b.as_str()));
        assert_eq!(items[2].title, "(no title)");
        assert!(items[2].due_date.is_none());
        assert_eq!(
            to_rfc3339(items[2].start.as_ref().unwrap()),
            "2024-03-01T00:00:00+00:00"
        );
    }

    #[tokio::test]
    async fn test_window_filters_on_start() {
        let server = server_with_feeds().await;
        let from = parse_instant("2024-03-01T00:00:00Z").unwrap();
        let to = parse_instant("2024-03-02T00:00:00Z").unwrap();

        let items = adapter(vec![
            format!("{}/a.ics", server.uri()),
            format!("{}/b.ics", server.uri()),
        ])
        .list_items(TimetableQuery {
            window: TimeWindow::new(Some(from), Some(to)),
        })
        .await
        .unwrap();

        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["wu_ical:a1", "wu_ical:b1"]);
        for item in &items {
            let start = item.start.unwrap();
            assert!(from <= start && start <= to);
        }
    }

    #[tokio::test]
    async fn test_no_feeds_is_empty_and_bad_feed_fails() {
        assert!(
            adapter(vec![])
                .list_items(TimetableQuery::default())
                .await
                .unwrap()
                .is_empty()
        );

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone.ics"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let err = adapter(vec![format!("{}/gone.ics", server.uri())])
            .list_items(TimetableQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::UpstreamStatus { status: 404, .. }));
    }
}
