pub mod analyzer;
pub mod app_service;
pub mod read_aloud;
pub mod resolver;

pub use analyzer::SymptomAnalyzer;
pub use app_service::{AudioToggle, GuideDeps, GuideService, InitError};
pub use read_aloud::ReadAloudOrchestrator;
pub use resolver::GuidanceResolver;
