// Import pipeline: calendar cards in, events and images out

pub mod images;
pub mod importer;
pub mod maps;
pub mod summary;

pub use images::{ImageResolver, ImageStorage};
pub use importer::EventImporter;
pub use maps::MapLinkResolver;
pub use summary::{ErrorInfo, EventInfo, ImportProgress, ImportRunSummary, SkipInfo};
