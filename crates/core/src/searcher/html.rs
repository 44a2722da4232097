//! KAT HTML search results parser.
//!
//! Results live in `table.data`, one `tr` per torrent with an id starting
//! with `torrent`. The last cell of a row (`td.lasttd`) holds the leechers and
//! the cell before it the seeders.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::util::parse_number;
use super::{ParseError, ResultParser, ResultRecord};

const DOWNLOAD_LINK_TITLE: &str = "Download torrent file";

/// Raw fields of one results row, as found in the page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HtmlRow {
    /// The row's `id` attribute, kept for diagnostics.
    pub id: String,
    pub title: Option<String>,
    /// Protocol-relative href of the download anchor.
    pub download_href: Option<String>,
    pub seeds: Option<String>,
    pub leeches: Option<String>,
}

impl HtmlRow {
    /// Map the row to a record.
    pub fn into_record(self) -> Result<ResultRecord, ParseError> {
        let leeches = self.leeches.ok_or_else(|| missing("td.lasttd", &self.id))?;
        let title = self
            .title
            .filter(|title| !title.is_empty())
            .ok_or_else(|| missing("a.cellMainLink", &self.id))?;
        let href = self
            .download_href
            .ok_or_else(|| missing("download link", &self.id))?;
        let seeds = self.seeds.ok_or_else(|| missing("seeds cell", &self.id))?;

        let seeds: u32 = parse_number("seeds", &seeds)?;
        let leeches: u32 = parse_number("leeches", &leeches)?;

        Ok(ResultRecord::new(
            title,
            format!("https:{}", href),
            seeds,
            leeches,
        ))
    }
}

fn missing(field: &'static str, row_id: &str) -> ParseError {
    ParseError::MissingField {
        field,
        context: format!("row {}", row_id),
    }
}

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::Selector(format!("{css}: {e:?}")))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

fn is_td(element: &ElementRef<'_>) -> bool {
    element.value().name() == "td"
}

/// Parser for KAT HTML search result pages.
#[derive(Debug, Clone, Default)]
pub struct HtmlTableParser {
    skip_malformed_items: bool,
}

impl HtmlTableParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip rows with missing or malformed cells instead of failing the parse.
    pub fn skipping_malformed_items(mut self, skip: bool) -> Self {
        self.skip_malformed_items = skip;
        self
    }

    /// Collect the raw rows of the results table.
    ///
    /// Returns `None` when the page has no results table.
    pub fn read_rows(&self, html: &str) -> Result<Option<Vec<HtmlRow>>, ParseError> {
        let document = Html::parse_document(html);

        let table_sel = selector("table.data")?;
        let row_sel = selector(r#"tr[id^="torrent"]"#)?;
        let title_sel = selector("a.cellMainLink")?;
        let link_sel = selector(&format!(r#"a[title="{}"]"#, DOWNLOAD_LINK_TITLE))?;

        let Some(table) = document.select(&table_sel).next() else {
            return Ok(None);
        };

        let rows = table
            .select(&row_sel)
            .map(|row| {
                // Direct children only; nested tables must not match
                let last_cell = row
                    .children()
                    .filter_map(ElementRef::wrap)
                    .find(|cell| is_td(cell) && cell.value().classes().any(|c| c == "lasttd"));

                let seeds_cell = last_cell.and_then(|cell| {
                    cell.prev_siblings()
                        .filter_map(ElementRef::wrap)
                        .find(is_td)
                });

                HtmlRow {
                    id: row.value().id().unwrap_or_default().to_string(),
                    title: row
                        .select(&title_sel)
                        .next()
                        .map(|a| text_of(a).trim().to_string()),
                    download_href: row
                        .select(&link_sel)
                        .next()
                        .and_then(|a| a.value().attr("href"))
                        .map(str::to_string),
                    seeds: seeds_cell.map(text_of),
                    leeches: last_cell.map(text_of),
                }
            })
            .collect();

        Ok(Some(rows))
    }
}

impl ResultParser for HtmlTableParser {
    fn parse(&self, payload: &[u8]) -> Result<HashSet<ResultRecord>, ParseError> {
        debug!("Parsing KAT web search results");
        let html = String::from_utf8_lossy(payload);
        let mut records = HashSet::new();

        let Some(rows) = self.read_rows(&html)? else {
            debug!("No results table returned from search");
            return Ok(records);
        };

        for row in rows {
            match row.into_record() {
                Ok(record) => {
                    records.insert(record);
                }
                Err(e) if self.skip_malformed_items => {
                    warn!(error = %e, "Skipping malformed KAT result row");
                }
                Err(e) => return Err(e),
            }
        }

        debug!(records = records.len(), "KAT web search results parsed");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{html_results_page, html_row};

    #[test]
    fn test_parse_single_row() {
        let page = html_results_page(&[html_row("torrent_bar1", "Bar", "//site/bar.torrent", "5", "1")]);
        let records = HtmlTableParser::new().parse(page.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        let record = records.into_iter().next().unwrap();
        assert_eq!(record.title, "Bar");
        assert_eq!(record.locator, "https://site/bar.torrent");
        assert_eq!(record.seeds(), 5);
        assert_eq!(record.leeches(), 1);
        assert_eq!(record.size_mb, None);
        assert_eq!(record.content_hash, None);
    }

    #[test]
    fn test_missing_table_returns_empty() {
        let page = "<html><body><table class=\"other\"><tr id=\"torrent_x\"><td>1</td></tr></table></body></html>";
        let records = HtmlTableParser::new().parse(page.as_bytes()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_ignores_rows_without_torrent_id() {
        let page = html_results_page(&[
            r#"<tr class="firstr"><th>name</th><th>seed</th><th>leech</th></tr>"#.to_string(),
            html_row("torrent_bar1", "Bar", "//site/bar.torrent", "5", "1"),
        ]);
        let records = HtmlTableParser::new().parse(page.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_multiple_rows() {
        let page = html_results_page(&[
            html_row("torrent_a", "Alpha", "//site/a.torrent", "100", "20"),
            html_row("torrent_b", "Beta", "//site/b.torrent", "3", "0"),
        ]);
        let records = HtmlTableParser::new().parse(page.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        let alpha = records.iter().find(|r| r.title == "Alpha").unwrap();
        assert_eq!(alpha.locator, "https://site/a.torrent");
        assert!(alpha.rank() > records.iter().find(|r| r.title == "Beta").unwrap().rank());
    }

    #[test]
    fn test_row_missing_lasttd_fails_parse() {
        let row = r#"<tr id="torrent_broken"><td><a class="cellMainLink">Broken</a><a title="Download torrent file" href="//site/x.torrent"></a></td><td>4</td></tr>"#;
        let page = html_results_page(&[row.to_string()]);
        let err = HtmlTableParser::new().parse(page.as_bytes()).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingField {
                field: "td.lasttd",
                context: "row torrent_broken".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_count_fails_parse() {
        let page = html_results_page(&[html_row("torrent_x", "X", "//site/x.torrent", "n/a", "1")]);
        let err = HtmlTableParser::new().parse(page.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { field: "seeds", .. }));
    }

    #[test]
    fn test_malformed_row_skipped_when_lenient() {
        let page = html_results_page(&[
            html_row("torrent_x", "X", "//site/x.torrent", "n/a", "1"),
            html_row("torrent_bar1", "Bar", "//site/bar.torrent", "5", "1"),
        ]);
        let records = HtmlTableParser::new()
            .skipping_malformed_items(true)
            .parse(page.as_bytes())
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(records.iter().all(|r| r.title == "Bar"));
    }

    #[test]
    fn test_row_with_blank_title_fails_parse() {
        let page = html_results_page(&[html_row("torrent_e", "  ", "//site/e.torrent", "5", "1")]);
        let err = HtmlTableParser::new().parse(page.as_bytes()).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingField {
                field: "a.cellMainLink",
                context: "row torrent_e".to_string(),
            }
        );

        let page = html_results_page(&[
            html_row("torrent_e", "", "//site/e.torrent", "5", "1"),
            html_row("torrent_bar1", "Bar", "//site/bar.torrent", "5", "1"),
        ]);
        let records = HtmlTableParser::new()
            .skipping_malformed_items(true)
            .parse(page.as_bytes())
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(records.iter().all(|r| r.title == "Bar"));
    }

    #[test]
    fn test_lasttd_must_be_direct_child() {
        let row = r#"<tr id="torrent_nested"><td><a class="cellMainLink">Nested</a><a title="Download torrent file" href="//site/n.torrent"></a><table><tr><td>9</td><td class="lasttd">9</td></tr></table></td><td>7</td><td class="lasttd">2</td></tr>"#;
        let page = html_results_page(&[row.to_string()]);
        let records = HtmlTableParser::new().parse(page.as_bytes()).unwrap();

        let record = records.into_iter().next().unwrap();
        assert_eq!(record.seeds(), 7);
        assert_eq!(record.leeches(), 2);
    }

    #[test]
    fn test_read_rows_exposes_raw_cells() {
        let page = html_results_page(&[html_row("torrent_bar1", "Bar", "//site/bar.torrent", " 5 ", "1")]);
        let rows = HtmlTableParser::new().read_rows(&page).unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "torrent_bar1");
        assert_eq!(rows[0].download_href.as_deref(), Some("//site/bar.torrent"));
        assert_eq!(rows[0].seeds.as_deref(), Some(" 5 "));
    }
}
