//! One-line progress messages for `--stream`.

use qagraph::pipeline::{DECOMPOSE, ENRICH, EXPLAIN, RETRIEVE, SYNTHESIZE, VALIDATE};
use qagraph::{StateUpdate, StreamEvent};
use serde_json::Value;

fn list_len(update: &StateUpdate, key: &str) -> usize {
    update.get(key).and_then(Value::as_array).map_or(0, Vec::len)
}

fn flag(update: &StateUpdate, key: &str) -> bool {
    update.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Progress line for a stage update or a run error; `None` for events not worth a line.
pub fn describe_event(event: &StreamEvent) -> Option<String> {
    match event {
        StreamEvent::Updates { node_id, update } => {
            let detail = match node_id.as_str() {
                DECOMPOSE => format!("{} sub-questions", list_len(update, "subquestions")),
                RETRIEVE => format!("{} answers", list_len(update, "responses")),
                SYNTHESIZE => "summary ready".to_string(),
                VALIDATE if flag(update, "needs_more_context") => "needs more context".to_string(),
                VALIDATE => "answer accepted".to_string(),
                ENRICH if flag(update, "context_fetched") => "context fetched".to_string(),
                ENRICH => "context fetch failed".to_string(),
                EXPLAIN => "explanation ready".to_string(),
                _ => "done".to_string(),
            };
            Some(format!("[{}] {}", node_id, detail))
        }
        StreamEvent::Error(message) => Some(format!("[error] {}", message)),
        StreamEvent::Values(_) | StreamEvent::Custom(_) => None,
    }
}
