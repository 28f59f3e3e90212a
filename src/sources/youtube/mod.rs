pub mod clients;
pub mod extractor;
pub mod formats;
pub mod playlist;
pub mod resolver;

pub use clients::{ClientProfile, InnerTubeClient, Negotiation, PlayerData, PlayerProvider};
pub use formats::{FormatDescriptor, QualityCeiling, StreamKind, StreamResolution};
pub use playlist::{CrawlResult, InnerTubeBrowser, ListingSource, PlaylistCrawler, PlaylistEntry};
pub use resolver::{ResolvedStream, StreamResolver};
