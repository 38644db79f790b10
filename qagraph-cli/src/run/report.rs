//! Plain-text report of a finished run.

use std::fmt::Write;

use qagraph::pipeline::PipelineOutput;

/// Explanation first, then summary, verdict and citation. Missing fields print as `-`.
pub fn render_output(output: &PipelineOutput) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", output.explanation().unwrap_or("-"));
    let _ = writeln!(out, "---");
    let _ = writeln!(out, "Summary: {}", output.summary().unwrap_or("-"));
    let _ = writeln!(out, "Verdict: {}", output.verdict().unwrap_or("-"));
    let _ = writeln!(out, "Citation: {}", output.citation());
    out
}
