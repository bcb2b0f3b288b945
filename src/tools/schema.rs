//! 工具入参的 JSON Schema 构造函数

use serde_json::{json, Value};

/// 对象类型，`required` 为必填字段名
pub fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// 字符串类型
pub fn string(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description,
    })
}

/// 枚举字符串，带默认值
pub fn enumeration(description: &str, allowed: &[&str], default: &str) -> Value {
    json!({
        "type": "string",
        "description": description,
        "enum": allowed,
        "default": default,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_schema() {
        let schema = object(json!({ "name": string("股票名称") }), &["name"]);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["name"]["type"], "string");
        assert_eq!(schema["required"], json!(["name"]));
    }

    #[test]
    fn test_enumeration_schema() {
        let schema = enumeration("周期", &["daily", "weekly"], "daily");
        assert_eq!(schema["enum"], json!(["daily", "weekly"]));
        assert_eq!(schema["default"], "daily");
    }
}
