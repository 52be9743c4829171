pub mod error;
pub mod guidance;
pub mod i18n;
pub mod screen;
pub mod settings;
pub mod symptoms;
pub mod types;

mod serde_tests;
