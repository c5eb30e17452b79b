use serde::Serialize;
use serde_json::json;

use crate::cli::OutputFormat;

/// Print `data` as the `{ok, data}` envelope in JSON mode, or hand it to
/// `text` for a human-readable rendering
pub fn output_result<T, F>(output_format: OutputFormat, data: &T, text: F) -> anyhow::Result<()>
where
    T: Serialize,
    F: FnOnce(&T),
{
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "ok": true, "data": data }))?);
        }
        OutputFormat::Text => text(data),
    }
    Ok(())
}

pub fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
