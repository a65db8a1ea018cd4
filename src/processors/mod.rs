//! Text processors: chunking, truncation, detection, extraction, domain hints

pub mod chunker;
pub mod detector;
pub mod domain;
pub mod excerpts;
pub mod extractor;
pub mod sanitize;
pub mod truncator;
