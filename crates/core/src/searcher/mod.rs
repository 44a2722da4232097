//! KAT torrent search.
//!
//! This module provides the [`Searcher`] trait and its KAT implementation.
//! A search fans out over every normalized term and both sort orders, parses
//! each payload as an RSS feed or an HTML results table, and unions the
//! records into one set. Request and parse failures are logged and skipped;
//! a search never errors.

mod feed;
mod html;
mod kat;
mod query;
mod transport;
mod types;
mod util;

pub use feed::{FeedItem, FeedParser};
pub use html::{HtmlRow, HtmlTableParser};
pub use kat::KatSearcher;
pub use query::{base_params, query_term, sorted_params, QueryExecutor};
pub use transport::{HttpTransport, ReqwestTransport, TransportError, TransportResponse};
pub use types::*;
pub use util::{normalize_search_term, normalize_unicode, torrent_availability};
