//! Tab directory abstraction
//!
//! The host browser's tab and window APIs, reduced to the queries and
//! commands the engine needs. Bulk closes go out as one batch command.

mod memory;

pub use memory::InMemoryDirectory;

use crate::error::Result;
use crate::types::{BulkOutcome, TabId, TabInfo};
use async_trait::async_trait;

/// Host tab directory.
#[async_trait]
pub trait TabDirectory: Send + Sync {
    /// All tabs in the current (focused) window
    async fn current_window_tabs(&self) -> Result<Vec<TabInfo>>;

    /// Look up one tab by id
    async fn get_tab(&self, tab_id: TabId) -> Result<Option<TabInfo>>;

    /// Foreground tab of the current window
    async fn active_tab(&self) -> Result<Option<TabId>>;

    /// Open a new tab on `url`
    async fn open_tab(&self, url: &str) -> Result<TabId>;

    /// Close a batch of tabs in one command; per-tab failures are reported, not raised
    async fn close_tabs(&self, tab_ids: &[TabId]) -> BulkOutcome<TabId>;

    /// Point an existing tab at a new URL
    async fn navigate(&self, tab_id: TabId, url: &str) -> Result<()>;

    /// Show a user notification
    async fn notify(&self, message: &str) -> Result<()>;
}
