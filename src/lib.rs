pub mod compare;
pub mod config;
pub mod logging;
pub mod model;
pub mod platform;
pub mod port_forward;
pub mod prometheus;
pub mod report;
pub mod store;
