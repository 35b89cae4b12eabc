//! Traffic incidents from the Flemish road-info RSS feed.

use std::time::Duration;

use encoding_rs::{Encoding, WINDOWS_1252};
use log::{debug, warn};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::http::HttpClient;
use crate::models::AlertList;

use super::{bounded, SourceError};

pub const DEFAULT_FEED_URL: &str = "http://www.wegeninfo.be/rssnl.php";
const ALERTS_TIMEOUT: Duration = Duration::from_secs(10);

/// Only the first items of the feed are considered.
const MAX_SCANNED_ITEMS: usize = 10;
const MAX_ACCEPTED: usize = 5;
/// Entries this short are category markers, not incidents.
const MIN_ENTRY_CHARS: usize = 6;
const TIMESTAMP_DELIMITER: &str = " - ";

/// Category tags the feed prefixes onto incidents.
const NOISE_REPLACEMENTS: [(&str, &str); 2] = [("FILE:", "Vertraging:"), ("ACTUA:", "")];

pub struct AlertFeed<C> {
    http: C,
    url: String,
    timeout: Duration,
}

impl<C: HttpClient> AlertFeed<C> {
    pub fn new(http: C, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            timeout: ALERTS_TIMEOUT,
        }
    }

    /// Current incidents. Never empty: a sentinel entry stands in when the
    /// feed has nothing to report or could not be read.
    pub async fn fetch(&self) -> AlertList {
        match bounded(self.timeout, self.try_fetch()).await {
            Ok(entries) => {
                debug!("traffic feed yielded {} alerts", entries.len());
                AlertList::from_entries(entries)
            }
            Err(err) => {
                warn!("traffic alerts fetch failed: {err}");
                AlertList::unreachable()
            }
        }
    }

    async fn try_fetch(&self) -> Result<Vec<String>, SourceError> {
        let body = self.http.get(&self.url).await?;
        let text = decode_feed(&body);
        let titles = item_titles(&text)?;
        Ok(select_alerts(titles))
    }
}

/// Decode feed bytes with the charset named in the XML declaration,
/// assuming ISO-8859-1 when none is declared. A byte order mark wins over
/// both.
fn decode_feed(bytes: &[u8]) -> String {
    let encoding = declared_encoding(bytes).unwrap_or(WINDOWS_1252);
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!("traffic feed contained bytes invalid for {}", used.name());
    }
    text.into_owned()
}

fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if !head.starts_with(b"<?xml") {
        return None;
    }
    let end = head.windows(2).position(|w| w == b"?>")?;
    let prolog = std::str::from_utf8(&head[..end]).ok()?;

    let after = &prolog[prolog.find("encoding")? + "encoding".len()..];
    let after = after.trim_start().strip_prefix('=')?.trim_start();
    let quote = after.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &after[1..];
    let label = &value[..value.find(quote)?];
    Encoding::for_label(label.as_bytes())
}

/// Text of the first `item/title` elements, in document order.
fn item_titles(xml: &str) -> Result<Vec<String>, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut titles = Vec::new();
    let mut depth_in_item = 0usize;
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" => depth_in_item += 1,
                b"title" if depth_in_item > 0 => current = Some(String::new()),
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if depth_in_item > 0 && e.name().as_ref() == b"title" {
                    titles.push(String::new());
                    if titles.len() >= MAX_SCANNED_ITEMS {
                        break;
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"item" => depth_in_item = depth_in_item.saturating_sub(1),
                b"title" => {
                    if let Some(title) = current.take() {
                        titles.push(title);
                        if titles.len() >= MAX_SCANNED_ITEMS {
                            break;
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some(title) = current.as_mut() {
                    let text = t
                        .unescape()
                        .map_err(|e| SourceError::Malformed(format!("bad title text: {e}")))?;
                    title.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(title) = current.as_mut() {
                    title.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SourceError::Malformed(format!(
                    "feed XML error at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(titles)
}

/// Strip the timestamp and category noise from raw titles, dropping
/// fragments and duplicates. Returns at most five entries, possibly none.
fn select_alerts<I>(titles: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut accepted: Vec<String> = Vec::new();

    for raw in titles.into_iter().take(MAX_SCANNED_ITEMS) {
        if let Some(entry) = clean_title(&raw) {
            if !accepted.contains(&entry) {
                accepted.push(entry);
            }
        }
        if accepted.len() >= MAX_ACCEPTED {
            break;
        }
    }

    accepted
}

fn clean_title(raw: &str) -> Option<String> {
    let (_, content) = raw.split_once(TIMESTAMP_DELIMITER)?;
    let mut content = content.trim().to_string();
    for (noise, replacement) in NOISE_REPLACEMENTS {
        content = content.replace(noise, replacement);
    }
    let content = content.trim();

    (content.chars().count() >= MIN_ENTRY_CHARS).then(|| content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::tests::MockHttpClient;
    use crate::http::HttpError;

    fn feed(titles: &[&str]) -> String {
        let items: String = titles
            .iter()
            .map(|t| format!("<item><title>{t}</title><description>x</description></item>"))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Wegeninfo - verkeer</title>{items}</channel></rss>"#
        )
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(
            clean_title("07:45 - FILE: E40 Brussel - Gent, 5 km").as_deref(),
            Some("Vertraging: E40 Brussel - Gent, 5 km")
        );
        assert_eq!(
            clean_title("08:10 - ACTUA: Ongeval op de R0").as_deref(),
            Some("Ongeval op de R0")
        );
        assert_eq!(clean_title("geen delimiter hier"), None);
        assert_eq!(clean_title("08:00 - ACTUA:"), None);
        assert_eq!(clean_title("08:00 - kort"), None);
    }

    #[test]
    fn test_select_alerts_filters_and_dedupes() {
        let titles = vec![
            "07:01 - Ongeval E17 Kortrijk",
            "Zonder scheidingsteken 1",
            "07:02 - Werken R1 Antwerpen",
            "07:05 - Ongeval E17 Kortrijk",
            "Zonder scheidingsteken 2",
            "07:03 - FILE: E19 Mechelen",
            "07:09 - Werken R1 Antwerpen",
            "07:04 - Pechverhelping A12",
            "Zonder scheidingsteken 3",
            "07:06 - Gladheid N49",
        ];
        let alerts = select_alerts(titles.into_iter().map(String::from));
        assert_eq!(
            alerts,
            vec![
                "Ongeval E17 Kortrijk",
                "Werken R1 Antwerpen",
                "Vertraging: E19 Mechelen",
                "Pechverhelping A12",
                "Gladheid N49",
            ]
        );
    }

    #[test]
    fn test_select_alerts_stops_at_five() {
        let titles = (0..10).map(|i| format!("07:0{i} - Incident nummer {i}"));
        let alerts = select_alerts(titles);
        assert_eq!(alerts.len(), 5);
        assert_eq!(alerts[0], "Incident nummer 0");
        assert_eq!(alerts[4], "Incident nummer 4");
    }

    #[test]
    fn test_select_alerts_scans_only_first_ten() {
        let mut titles: Vec<String> = (0..10).map(|_| "geen delimiter".to_string()).collect();
        titles.push("07:00 - Te laat in de feed".to_string());
        assert!(select_alerts(titles).is_empty());
    }

    #[test]
    fn test_item_titles_skips_channel_title() {
        let xml = feed(&["07:00 - Eerste melding", "07:01 - Tweede &amp; derde"]);
        let titles = item_titles(&xml).unwrap();
        assert_eq!(titles, vec!["07:00 - Eerste melding", "07:01 - Tweede & derde"]);
    }

    #[test]
    fn test_empty_titles_count_toward_scan_limit() {
        let mut items = "<item><title/></item>".repeat(9);
        items.push_str("<item><title>07:00 - Ongeval E17 Gent</title></item>");
        items.push_str("<item><title>07:05 - Na de limiet</title></item>");
        let xml = format!("<rss><channel>{items}</channel></rss>");

        let titles = item_titles(&xml).unwrap();
        assert_eq!(titles.len(), 10);
        assert_eq!(titles[0], "");
        assert_eq!(titles[9], "07:00 - Ongeval E17 Gent");
        assert_eq!(select_alerts(titles), vec!["Ongeval E17 Gent"]);
    }

    #[test]
    fn test_item_titles_reads_cdata() {
        let xml = "<rss><channel><item><title><![CDATA[07:00 - Ongeval <R0>]]></title></item></channel></rss>";
        assert_eq!(item_titles(xml).unwrap(), vec!["07:00 - Ongeval <R0>"]);
    }

    #[test]
    fn test_item_titles_rejects_broken_xml() {
        assert!(item_titles("<rss><channel><item><title>x</item></rss>").is_err());
    }

    #[test]
    fn test_decode_honors_latin1() {
        let mut bytes = br#"<?xml version="1.0" encoding="ISO-8859-1"?><rss><channel><item><title>07:00 - Hinder in Bi"#.to_vec();
        bytes.push(0xE8); // è
        bytes.extend_from_slice(b"vre</title></item></channel></rss>");

        let text = decode_feed(&bytes);
        assert!(text.contains("Hinder in Bièvre"));
    }

    #[test]
    fn test_decode_defaults_to_latin1_without_declaration() {
        let bytes = [b'c', b'a', b'f', 0xE9];
        assert_eq!(decode_feed(&bytes), "café");
    }

    #[test]
    fn test_decode_declared_utf8() {
        let xml = "<?xml version='1.0' encoding='utf-8'?><t>Liège</t>";
        assert_eq!(decode_feed(xml.as_bytes()), xml);
    }

    #[tokio::test]
    async fn test_fetch_returns_alerts() {
        let xml = feed(&["07:00 - Ongeval E313 Herentals", "07:01 - ACTUA:"]);
        let alerts = AlertFeed::new(MockHttpClient::new().respond("rssnl", xml), DEFAULT_FEED_URL)
            .fetch()
            .await;
        assert_eq!(alerts.entries(), ["Ongeval E313 Herentals"]);
    }

    #[tokio::test]
    async fn test_fetch_empty_feed_has_sentinel() {
        let alerts = AlertFeed::new(MockHttpClient::new().respond("rssnl", feed(&[])), DEFAULT_FEED_URL)
            .fetch()
            .await;
        assert_eq!(alerts, AlertList::no_incidents());
    }

    #[tokio::test]
    async fn test_fetch_unreachable_has_sentinel() {
        let http = MockHttpClient::new().fail("rssnl", HttpError::Timeout(DEFAULT_FEED_URL.into()));
        let alerts = AlertFeed::new(http, DEFAULT_FEED_URL).fetch().await;
        assert_eq!(alerts, AlertList::unreachable());
        assert_eq!(alerts.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_malformed_has_sentinel() {
        let http = MockHttpClient::new().respond("rssnl", "<rss><channel><item><title>x</channel>");
        let alerts = AlertFeed::new(http, DEFAULT_FEED_URL).fetch().await;
        assert_eq!(alerts, AlertList::unreachable());
    }
}
