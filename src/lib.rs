pub mod aggregator;
pub mod command_handlers;
pub mod command_helpers;
pub mod constants;
pub mod data_backend;
pub mod data_types;
pub mod errors;
pub mod render;
pub mod search;
pub mod shared_main;
pub mod shopping_list;
