pub mod classifier;
pub mod config;
pub mod error;
pub mod extract;
pub mod identify;
pub mod infer;
pub mod models;
pub mod vision;
pub mod wiki;
pub mod wikidata;

pub use config::AppConfig;
pub use error::IdentifyError;
pub use identify::IdentifyService;
pub use models::SpeciesProfile;
