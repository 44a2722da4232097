//! Testing utilities and mock implementations.
//!
//! This module provides a scripted [`MockTransport`] so the whole search flow
//! can be exercised without reaching KAT, plus fixtures that build payloads
//! shaped like the site's RSS feed and HTML results page.
//!
//! # Example
//!
//! ```rust,ignore
//! use kat_search_core::testing::{fixtures, MockTransport};
//!
//! let transport = Arc::new(MockTransport::new());
//! transport.respond_to_all(TransportResponse::ok(fixtures::html_results_page(&[
//!     fixtures::html_row("torrent_1", "Bar", "//site/bar.torrent", "5", "1"),
//! ])));
//!
//! let searcher = KatSearcher::new(transport.clone(), &KatConfig::default());
//! ```

mod mock_transport;

pub use mock_transport::{MockTransport, RecordedRequest};

/// Payload builders and sample records.
pub mod fixtures {
    use crate::searcher::ResultRecord;

    fn escape(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
    }

    /// One `<item>` of a KAT RSS feed. `enclosure` is the download URL, if any.
    pub fn feed_item_xml(
        title: &str,
        enclosure: Option<&str>,
        seeds: &str,
        peers: &str,
        content_length: &str,
        info_hash: &str,
    ) -> String {
        let enclosure = enclosure
            .map(|url| {
                format!(
                    r#"<enclosure url="{}" length="{}" type="application/x-bittorrent" />"#,
                    escape(url),
                    escape(content_length)
                )
            })
            .unwrap_or_default();

        format!(
            "<item><title>{}</title><category>Movies</category>\
             <link>http://kat.cr/item.html</link>\
             <torrent:contentLength>{}</torrent:contentLength>\
             <torrent:infoHash>{}</torrent:infoHash>\
             <torrent:seeds>{}</torrent:seeds><torrent:peers>{}</torrent:peers>\
             <torrent:verified>1</torrent:verified>{}</item>",
            escape(title),
            escape(content_length),
            escape(info_hash),
            escape(seeds),
            escape(peers),
            enclosure
        )
    }

    /// A complete RSS document. Always ends with `</channel></rss>`.
    pub fn rss_feed(items: &[String]) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <rss version=\"2.0\" xmlns:torrent=\"http://xmlns.ezrss.it/0.1/\">\
             <channel><title>Torrents by keyword</title><link>http://kat.cr/</link>\
             {}</channel></rss>",
            items.concat()
        )
    }

    /// One result row of the HTML results table.
    pub fn html_row(id: &str, title: &str, href: &str, seeds: &str, leeches: &str) -> String {
        format!(
            r#"<tr class="odd" id="{}"><td><div class="iaconbox"><a title="Download torrent file" href="{}" class="idownload icon16"></a></div><div class="torrentname"><a href="/item.html" class="cellMainLink">{}</a></div></td><td class="nobr center">1.4 <span>GB</span></td><td class="center">3</td><td class="center">2&nbsp;days</td><td class="green center">{}</td><td class="red lasttd center">{}</td></tr>"#,
            escape(id),
            escape(href),
            escape(title),
            escape(seeds),
            escape(leeches)
        )
    }

    /// A results page wrapping the given rows in `table.data`.
    pub fn html_results_page(rows: &[String]) -> String {
        format!(
            r#"<!DOCTYPE html><html><head><title>KAT</title></head><body><table class="doublecelltable"><tr><td><table cellpadding="0" cellspacing="0" class="data" style="width: 100%"><tr class="firstr"><th class="width100perc nopad">torrent name</th><th class="center">size</th><th class="center">files</th><th class="center">age</th><th class="center">seed</th><th class="lasttd nobr center">leech</th></tr>{}</table></td></tr></table></body></html>"#,
            rows.concat()
        )
    }

    /// A record as the HTML parser would produce it.
    pub fn html_record(title: &str, href: &str, seeds: u32, leeches: u32) -> ResultRecord {
        ResultRecord::new(title, format!("https:{}", href), seeds, leeches)
    }
}
