//! Unit tests for qagraph-cli, organized by module.

mod config;
