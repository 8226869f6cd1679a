//! Integration tests for the shardfs storage driver

mod config_layers;
mod local_registry;
mod memory_registry;
