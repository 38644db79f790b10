//! qagraph-cli library: reusable run logic for the `qagraph` binary and other crates.
//!
//! Reads config from `.env`, builds the question-answering pipeline and runs one
//! query, returning the final output.
//!
//! ## Usage
//!
//! ```rust,no_run
//! # async fn demo() -> Result<(), qagraph_cli::Error> {
//! use qagraph_cli::{render_output, PipelineRequest};
//!
//! let request = PipelineRequest::new("Does metformin reduce cancer risk?", "cli");
//! let output = qagraph_cli::run(&request).await?;
//! print!("{}", render_output(&output));
//! # Ok(())
//! # }
//! ```

mod config;
mod run;

pub use config::{Error, RunConfig, RunOptions};
pub use qagraph::pipeline::{PipelineOutput, PipelineRequest};
pub use run::{
    config_summary, describe_event, render_output, run, run_with_config, run_with_options,
    run_with_runner,
};

#[cfg(test)]
mod tests;
