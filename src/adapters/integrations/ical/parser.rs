//! Minimal RFC 5545 reader. Extracts VEVENT UID, SUMMARY, DTSTART and DTEND.
//!
//! Handles line folding, property parameters (`VALUE=DATE`, `TZID=`), nested
//! components (VALARM inside VEVENT) and TEXT escapes. Everything else is skipped.

use crate::domain::Instant;
use crate::shared::datetime::{date_to_instant, naive_utc_to_instant};
use chrono::{NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use tracing::warn;

/// One VEVENT as read from a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEvent {
    pub uid: String,
    pub summary: Option<String>,
    pub start: Instant,
    pub end: Option<Instant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single unfolded content line: `NAME;PARAM=V:VALUE`.
#[derive(Debug)]
struct ContentLine<'a> {
    name: String,
    params: Vec<(String, String)>,
    value: &'a str,
}

impl ContentLine<'_> {
    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct PendingEvent {
    uid: Option<String>,
    summary: Option<String>,
    start: Option<Instant>,
    end: Option<Instant>,
}

/// Join continuation lines (leading space or tab) onto their predecessor.
fn unfold(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(rest) = line.strip_prefix([' ', '\t']) {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    lines
}

fn split_line(line: &str) -> Option<ContentLine<'_>> {
    // The value starts at the first ':' outside a quoted parameter value.
    let mut in_quotes = false;
    let colon = line.char_indices().find_map(|(i, c)| match c {
        '"' => {
            in_quotes = !in_quotes;
            None
        }
        ':' if !in_quotes => Some(i),
        _ => None,
    })?;
    let (head, value) = (&line[..colon], &line[colon + 1..]);
    let mut parts = head.split(';');
    let name = parts.next()?.trim().to_ascii_uppercase();
    let params = parts
        .filter_map(|p| {
            let (k, v) = p.split_once('=')?;
            Some((k.trim().to_string(), v.trim().trim_matches('"').to_string()))
        })
        .collect();
    Some(ContentLine {
        name,
        params,
        value,
    })
}

fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// DATE values become 00:00 UTC; `Z` values are UTC; `TZID` values resolve through
/// the IANA database; floating values are taken as UTC.
fn parse_date_value(line: &ContentLine<'_>) -> Result<Instant, ParseError> {
    let value = line.value.trim();
    let is_date = line
        .param("VALUE")
        .map(|v| v.eq_ignore_ascii_case("DATE"))
        .unwrap_or(false)
        || (value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()));

    if is_date {
        return NaiveDate::parse_from_str(value, "%Y%m%d")
            .map(date_to_instant)
            .map_err(|e| ParseError(format!("{}: bad date {value:?}: {e}", line.name)));
    }

    let (local, is_utc) = match value.strip_suffix(['Z', 'z']) {
        Some(stripped) => (stripped, true),
        None => (value, false),
    };
    let naive = NaiveDateTime::parse_from_str(local, "%Y%m%dT%H%M%S")
        .map_err(|e| ParseError(format!("{}: bad date-time {value:?}: {e}", line.name)))?;

    if is_utc {
        return Ok(naive_utc_to_instant(naive));
    }
    if let Some(tzid) = line.param("TZID") {
        match tzid.parse::<Tz>() {
            Ok(tz) => {
                if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
                    return Ok(dt.fixed_offset());
                }
                warn!(tzid, value, "local time does not exist in zone; using UTC");
            }
            Err(_) => warn!(tzid, "unknown TZID; using UTC"),
        }
    }
    Ok(naive_utc_to_instant(naive))
}

/// Parse a calendar feed into its VEVENTs, in document order.
///
/// Events without DTSTART are skipped. Malformed date values fail the whole feed.
pub fn parse_feed(text: &str) -> Result<Vec<FeedEvent>, ParseError> {
    let mut events = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut pending: Option<PendingEvent> = None;

    for raw in unfold(text) {
        let Some(line) = split_line(&raw) else {
            continue;
        };
        match line.name.as_str() {
            "BEGIN" => {
                let component = line.value.trim().to_ascii_uppercase();
                if component == "VEVENT" {
                    pending = Some(PendingEvent::default());
                }
                stack.push(component);
            }
            "END" => {
                let component = line.value.trim().to_ascii_uppercase();
                if stack.last() == Some(&component) {
                    stack.pop();
                }
                if component == "VEVENT" {
                    if let Some(event) = pending.take() {
                        match event.start {
                            Some(start) => events.push(FeedEvent {
                                uid: event.uid.unwrap_or_default(),
                                summary: event.summary,
                                start,
                                end: event.end,
                            }),
                            None => warn!(uid = ?event.uid, "VEVENT without DTSTART skipped"),
                        }
                    }
                }
            }
            _ if stack.last().map(String::as_str) == Some("VEVENT") => {
                let Some(event) = pending.as_mut() else {
                    continue;
                };
                match line.name.as_str() {
                    "UID" => event.uid = Some(line.value.trim().to_string()),
                    "SUMMARY" => event.summary = Some(unescape_text(line.value)),
                    "DTSTART" => event.start = Some(parse_date_value(&line)?),
                    "DTEND" => event.end = Some(parse_date_value(&line)?),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    Ok(events)
}
