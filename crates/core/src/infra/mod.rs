pub mod audio;
pub mod metrics;
pub mod offline_store;
pub mod reasoning;
