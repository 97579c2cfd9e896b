pub mod intent;
pub mod providers;
pub mod recommendations;

pub use intent::IntentParser;
pub use recommendations::Recommender;
