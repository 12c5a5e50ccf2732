//! Fetch adapter implementations.
//!
//! [`LiveSearchAdapter`] performs a real DuckDuckGo search followed by page
//! download and text extraction. Providers without an integration are
//! served by [`UnintegratedAdapter`], which always reports
//! [`crate::RetrievalError::NotImplemented`].

pub mod duckduckgo;
pub mod unintegrated;

pub use duckduckgo::LiveSearchAdapter;
pub use unintegrated::UnintegratedAdapter;
