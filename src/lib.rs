#![forbid(unsafe_code)]

pub mod api;
pub mod capture;
pub mod cli;
pub mod context;
pub mod error;
pub mod fix;
pub mod generate;
pub mod logging;
pub mod model;
pub mod poller;
pub mod section;
pub mod status;
pub mod translate;
pub mod watch;
pub mod workflow;
