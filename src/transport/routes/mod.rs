pub mod crawl;
pub mod info;
pub mod relay;
pub mod resolve;
