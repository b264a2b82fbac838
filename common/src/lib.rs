// Shared modules for the upgrade conformance checker
pub mod chain_data;
pub mod execution_layer;
pub mod shared;
pub mod utils;
