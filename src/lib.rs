/*
 * Route Scanner - DEX aggregator pair scanner
 * Core library exports and module declarations
 */

pub mod aggregator;
pub mod bootstrap;
pub mod config;
pub mod confirmation;
pub mod execution;
pub mod models;
pub mod pairs;
pub mod report;
pub mod rpc;
pub mod scanner;
pub mod utils;
pub mod wallet;

pub use config::Config;
pub use models::*;
pub use scanner::ScanOrchestrator;
