/*
    core_enrich - Async message enrichment

    Resolves the first link in a posted message into display metadata:
    - URL extraction and fetching (trait-backed for tests)
    - Image detection by file signature
    - Open Graph / HTML fallback page metadata
    - Supervised worker pool feeding persisted results back as notices
*/

pub mod extract;
pub mod fetch;
pub mod page;
pub mod sniff;
pub mod worker;

#[cfg(test)]
pub mod tests;

// Re-export commonly used types
pub use fetch::{FetchError, Fetcher, HttpFetcher, StaticFetcher};
pub use page::{extract_page_meta, PageMeta};
pub use sniff::{sniff_image, ImageFormat};
pub use worker::{EnrichmentJob, EnrichmentNotice, EnrichmentRunner};
