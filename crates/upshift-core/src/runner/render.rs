use crate::domain::{CALLBACK_SEPARATOR, Task};

/// `"<callback joined by ::>(<arguments joined by ,>)"`.
///
/// Strings render raw, anything else as compact JSON.
pub fn render_callback(task: &Task) -> String {
    let args = task
        .arguments()
        .iter()
        .map(render_argument)
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "{}({})",
        task.callback().segments().join(CALLBACK_SEPARATOR),
        args
    )
}

fn render_argument(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
