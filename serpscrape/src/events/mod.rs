//! Pipeline events.
//!
//! Every pipeline run reports what happened to each candidate URL through an
//! [`EventSink`]. Event names used by the orchestrator:
//!
//! | Event | Emitted when |
//! |-------|--------------|
//! | `search.completed` | the result finder returned candidates |
//! | `search.failed` | the result finder failed recoverably |
//! | `url.duplicate` | a URL was seen earlier in the same batch |
//! | `url.skipped` | a stored URL was left out of the results |
//! | `url.included` | a stored URL was returned without refetching |
//! | `url.extracted` | a page was fetched and extracted |
//! | `url.failed` | fetching or extracting a page failed recoverably |
//! | `batch.stored` | new records were persisted |
//! | `run.completed` | the run finished |

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use chrono::Utc;
use serde_json::{json, Value};

/// Builds an event payload stamped with the current time.
#[must_use]
pub fn event_payload(pipeline: &str, fields: Value) -> Value {
    let mut payload = json!({
        "pipeline": pipeline,
        "timestamp": Utc::now().to_rfc3339(),
    });
    if let (Some(target), Value::Object(extra)) = (payload.as_object_mut(), fields) {
        target.extend(extra);
    }
    payload
}
