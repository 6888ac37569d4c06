pub mod classify;
pub mod clean;
pub mod config;
pub mod enrich;
pub mod history;
pub mod logging;
pub mod source;
pub mod table;
