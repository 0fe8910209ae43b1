pub mod batch;
pub mod cleaning;
pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod logging;
pub mod pipeline;
pub mod warehouse;
