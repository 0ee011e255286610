pub mod backup;
pub mod clubs;
pub mod core;
pub mod events;
pub mod exports;
pub mod imports;
pub mod participants;
pub mod setup;
pub mod templates;
pub mod volunteers;
