use crate::error::ToolError;
use serde_json::Value;

pub mod arithmetic;

pub use arithmetic::{ArithmeticTool, arithmetic_tools};

/// Reads an integer argument, accepting whole-valued numbers and numeric
/// strings the way models tend to emit them.
pub fn extract_int_arg(args: &Value, tool: &str, key: &str) -> Result<i64, ToolError> {
    let value = args.get(key).ok_or_else(|| {
        ToolError::invalid_arguments(tool, format!("missing '{}' parameter", key))
    })?;

    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            // `as` saturates, so anything outside [i64::MIN, i64::MAX) is refused here.
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f))
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| {
        ToolError::invalid_arguments(tool, format!("'{}' must be an integer, got {}", key, value))
    })
}
