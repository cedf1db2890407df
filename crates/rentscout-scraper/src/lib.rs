pub mod artifacts;
pub mod discover;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod gateway;
pub mod llm;
pub mod normalize;
pub mod rate_limit;
pub mod scraper;
pub mod simplify;

pub use discover::{discover_listings, RawListing};
pub use error::ScraperError;
pub use extract::{build_extraction_request, interpret_extraction, ExtractionOutcome};
pub use gateway::PersistenceGateway;
pub use llm::LlmClient;
pub use normalize::normalize_property;
pub use scraper::{ListingOutcome, PropertyScraper, ScrapeRun};
pub use simplify::simplify_fragment;
