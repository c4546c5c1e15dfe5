//! MAR-Search: asynchronous client for the Active Response search API
//!
//! The search service is reached over a message fabric rather than direct
//! HTTP. A search is created, started and polled until the service reports it
//! finished; result pages are then fetched from the returned
//! [`ResultsContext`] with paging, sorting and text filtering.
//!
//! ```no_run
//! use mar_search::{HttpTransport, MarClient, Projection, ResultOptions};
//! use std::sync::Arc;
//!
//! # async fn run() -> mar_search::Result<()> {
//! let transport = Arc::new(HttpTransport::new("http://127.0.0.1:8080/fabric")?);
//! let client = MarClient::new(transport);
//! let ctx = client
//!     .search(vec![Projection::new("HostInfo").output("ip_address")], None)
//!     .await?;
//! if ctx.has_results() {
//!     let page = ctx.get_results(&ResultOptions::new().limit(10)).await?;
//!     for item in page.items {
//!         println!("{:?}", item.output_value("HostInfo", "ip_address"));
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod network;
pub mod query;
pub mod results;
pub mod search;
pub mod transport;

pub use config::Settings;
pub use error::{MarError, Result, TransportError};
pub use network::HttpTransport;
pub use query::{AndClause, Condition, Operator, Predicate, Projection};
pub use results::{ResultItem, ResultOptions, ResultPage, ResultsContext, SortDirection};
pub use search::{MarClient, SearchRequest};
pub use transport::Transport;

use std::time::Duration;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fabric topic of the search service
pub const DEFAULT_TOPIC: &str = "/mcafee/mar/service/api/search";

/// Default wait between status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Shortest wait between status checks that can be configured
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(5);
