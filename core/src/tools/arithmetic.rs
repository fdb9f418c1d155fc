use crate::error::ToolError;
use crate::tools::extract_int_arg;
use crate::traits::Tool;
use async_trait::async_trait;
use serde_json::json;

type BinaryOp = fn(i64, i64) -> Option<i64>;

/// Integer tool of the form `name(a, b)`.
pub struct ArithmeticTool {
    name: &'static str,
    description: &'static str,
    op: BinaryOp,
}

impl ArithmeticTool {
    pub fn add() -> Self {
        Self {
            name: "add",
            description: "Add two integers together and return the sum",
            op: i64::checked_add,
        }
    }

    pub fn subtract() -> Self {
        Self {
            name: "subtract",
            description: "Subtract the second integer from the first and return the difference",
            op: i64::checked_sub,
        }
    }

    pub fn multiply() -> Self {
        Self {
            name: "multiply",
            description: "Multiply two integers and return the product",
            op: i64::checked_mul,
        }
    }
}

pub fn arithmetic_tools() -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(ArithmeticTool::add()),
        Box::new(ArithmeticTool::subtract()),
        Box::new(ArithmeticTool::multiply()),
    ]
}

#[async_trait]
impl Tool for ArithmeticTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "a": {
                    "type": "integer",
                    "description": "First operand"
                },
                "b": {
                    "type": "integer",
                    "description": "Second operand"
                }
            },
            "required": ["a", "b"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let a = extract_int_arg(&args, self.name, "a")?;
        let b = extract_int_arg(&args, self.name, "b")?;

        (self.op)(a, b).map(|result| json!(result)).ok_or_else(|| {
            ToolError::execution(self.name, format!("integer overflow on {} and {}", a, b))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn computes_each_operation() {
        let args = json!({"a": 21, "b": 999});
        assert_eq!(ArithmeticTool::add().execute(args.clone()).await.unwrap(), json!(1020));
        assert_eq!(
            ArithmeticTool::subtract().execute(args.clone()).await.unwrap(),
            json!(-978)
        );
        assert_eq!(
            ArithmeticTool::multiply()
                .execute(json!({"a": 1020, "b": 3}))
                .await
                .unwrap(),
            json!(3060)
        );
    }

    #[tokio::test]
    async fn overflow_is_an_execution_error() {
        let err = ArithmeticTool::multiply()
            .execute(json!({"a": i64::MAX, "b": 2}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Execution { .. }));
    }

    #[test]
    fn declares_integer_parameters() {
        let specs: Vec<_> = arithmetic_tools().iter().map(|t| t.spec()).collect();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["add", "subtract", "multiply"]);
        for spec in &specs {
            assert_eq!(spec.parameters_schema["properties"]["a"]["type"], "integer");
            assert_eq!(spec.parameters_schema["required"], json!(["a", "b"]));
        }
    }
}
