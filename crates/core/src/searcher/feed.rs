//! KAT RSS feed parser.
//!
//! KAT's feed is RSS 2.0 with a `torrent:` namespace carrying the swarm
//! statistics, content length and info hash. Items are first collected into
//! [`FeedItem`] values and then mapped to [`ResultRecord`]s.

use std::collections::HashSet;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::{debug, warn};

use super::util::parse_number;
use super::{ParseError, ResultParser, ResultRecord};

/// Raw fields of one feed `<item>`, as found in the payload.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: Option<String>,
    /// `url` attributes of the item's enclosures, in document order.
    pub enclosures: Vec<String>,
    pub seeds: Option<String>,
    pub peers: Option<String>,
    pub content_length: Option<String>,
    pub info_hash: Option<String>,
}

impl FeedItem {
    /// Map the item to a record.
    ///
    /// Returns `Ok(None)` when the item has no enclosure to download from.
    pub fn into_record(self) -> Result<Option<ResultRecord>, ParseError> {
        let title = self.title.ok_or_else(|| missing("title", "feed item"))?;

        let Some(locator) = self.enclosures.into_iter().next() else {
            warn!(
                title = %title,
                "Could not get url for KAT feed item, the feed format may have changed"
            );
            return Ok(None);
        };

        let seeds: u32 = parse_number(
            "torrent:seeds",
            self.seeds.as_deref().ok_or_else(|| missing("torrent:seeds", &title))?,
        )?;
        let leeches: u32 = parse_number(
            "torrent:peers",
            self.peers.as_deref().ok_or_else(|| missing("torrent:peers", &title))?,
        )?;
        let size_bytes: u64 = parse_number(
            "torrent:contentLength",
            self.content_length
                .as_deref()
                .ok_or_else(|| missing("torrent:contentLength", &title))?,
        )?;
        let info_hash = self
            .info_hash
            .ok_or_else(|| missing("torrent:infoHash", &title))?;

        Ok(Some(
            ResultRecord::new(title, locator, seeds, leeches)
                .with_size_bytes(size_bytes)
                .with_content_hash(info_hash),
        ))
    }
}

fn missing(field: &'static str, context: &str) -> ParseError {
    ParseError::MissingField {
        field,
        context: context.to_string(),
    }
}

/// Outcome of reading the raw XML.
#[derive(Debug)]
enum FeedDocument {
    Items(Vec<FeedItem>),
    /// The payload is not a well-formed feed.
    Bozo(String),
}

/// Parser for KAT RSS search results.
#[derive(Debug, Clone, Default)]
pub struct FeedParser {
    skip_malformed_items: bool,
}

impl FeedParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip items with missing or malformed fields instead of failing the parse.
    pub fn skipping_malformed_items(mut self, skip: bool) -> Self {
        self.skip_malformed_items = skip;
        self
    }
}

impl ResultParser for FeedParser {
    fn parse(&self, payload: &[u8]) -> Result<HashSet<ResultRecord>, ParseError> {
        debug!("Parsing KAT RSS feed");
        let mut records = HashSet::new();

        let items = match read_feed(payload) {
            FeedDocument::Items(items) => items,
            FeedDocument::Bozo(reason) => {
                warn!(reason = %reason, "Got bad feed from KAT");
                return Ok(records);
            }
        };

        for item in items {
            match item.into_record() {
                Ok(Some(record)) => {
                    records.insert(record);
                }
                Ok(None) => {}
                Err(e) if self.skip_malformed_items => {
                    warn!(error = %e, "Skipping malformed KAT feed item");
                }
                Err(e) => return Err(e),
            }
        }

        debug!(records = records.len(), "KAT RSS feed parsed");
        Ok(records)
    }
}

/// Which item field the current text node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemField {
    Title,
    Seeds,
    Peers,
    ContentLength,
    InfoHash,
}

fn item_field(name: &str) -> Option<ItemField> {
    match name.to_ascii_lowercase().as_str() {
        "title" => Some(ItemField::Title),
        "torrent:seeds" => Some(ItemField::Seeds),
        "torrent:peers" => Some(ItemField::Peers),
        "torrent:contentlength" => Some(ItemField::ContentLength),
        "torrent:infohash" => Some(ItemField::InfoHash),
        _ => None,
    }
}

fn is_feed_root(name: &str) -> bool {
    matches!(name, "rss" | "feed" | "rdf:RDF")
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn enclosure_url(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"url")
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.trim().to_string()))
        .filter(|url| !url.is_empty())
}

fn append_text(item: &mut FeedItem, field: ItemField, text: &str) {
    let slot = match field {
        ItemField::Title => &mut item.title,
        ItemField::Seeds => &mut item.seeds,
        ItemField::Peers => &mut item.peers,
        ItemField::ContentLength => &mut item.content_length,
        ItemField::InfoHash => &mut item.info_hash,
    };
    slot.get_or_insert_with(String::new).push_str(text);
}

/// Read every `<item>` of the document into [`FeedItem`]s.
fn read_feed(xml: &[u8]) -> FeedDocument {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut buf = Vec::new();
    let mut depth: usize = 0;
    let mut saw_root = false;

    let mut current_item: Option<FeedItem> = None;
    let mut current_field: Option<ItemField> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = element_name(&e);
                if depth == 0 {
                    saw_root = is_feed_root(&name);
                }
                depth += 1;

                if name == "item" {
                    current_item = Some(FeedItem::default());
                    current_field = None;
                } else if let Some(ref mut item) = current_item {
                    if name == "enclosure" {
                        item.enclosures.extend(enclosure_url(&e));
                    }
                    current_field = item_field(&name);
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(ref mut item) = current_item {
                    if element_name(&e) == "enclosure" {
                        item.enclosures.extend(enclosure_url(&e));
                    }
                }
            }
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                if e.name().as_ref() == b"item" {
                    if let Some(item) = current_item.take() {
                        items.push(item);
                    }
                }
                current_field = None;
            }
            Ok(Event::Text(e)) => {
                if let (Some(item), Some(field)) = (current_item.as_mut(), current_field) {
                    match e.unescape() {
                        Ok(text) => append_text(item, field, &text),
                        Err(e) => return FeedDocument::Bozo(format!("bad text: {}", e)),
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if let (Some(item), Some(field)) = (current_item.as_mut(), current_field) {
                    let text = String::from_utf8_lossy(&e).trim().to_string();
                    append_text(item, field, &text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return FeedDocument::Bozo(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return FeedDocument::Bozo("document is not an RSS feed".to_string());
    }
    if depth != 0 {
        return FeedDocument::Bozo("unexpected end of document".to_string());
    }

    FeedDocument::Items(items)
}
