//! 配置升级模块
//!
//! 旧版本配置文件缺少新字段时，用默认值补全并报告补全的字段路径。

use serde_json::Value;

/// 将 `defaults` 中存在而 `target` 中缺失的键补入 `target`
///
/// 只递归进入对象；数组 (如 `sinks`) 视为整体，存在即保留。
/// 返回补全的字段路径 (点分隔，如 `batching.backoff_s`)。
pub fn fill_missing(target: &mut Value, defaults: &Value) -> Vec<String> {
    let mut added = Vec::new();
    fill_at(target, defaults, "", &mut added);
    added
}

fn fill_at(target: &mut Value, defaults: &Value, prefix: &str, added: &mut Vec<String>) {
    let (Value::Object(target_map), Value::Object(default_map)) = (target, defaults) else {
        return;
    };

    for (key, default_value) in default_map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match target_map.get_mut(key) {
            Some(existing) => fill_at(existing, default_value, &path, added),
            None => {
                target_map.insert(key.clone(), default_value.clone());
                added.push(path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_keys_filled_and_reported() {
        let mut target = json!({
            "batching": { "msg_delay_s": 2.0 },
            "sinks": [{ "name": "console", "sink_type": "log" }]
        });
        let defaults = json!({
            "version": "V1",
            "batching": { "msg_delay_s": 1.5, "backoff_s": 1.0 },
            "sinks": [{ "name": "chatbox", "sink_type": "osc" }]
        });

        let mut added = fill_missing(&mut target, &defaults);
        added.sort();

        assert_eq!(added, vec!["batching.backoff_s", "version"]);
        assert_eq!(target["batching"]["msg_delay_s"], json!(2.0));
        assert_eq!(target["batching"]["backoff_s"], json!(1.0));
        assert_eq!(target["sinks"][0]["name"], json!("console"));
    }

    #[test]
    fn test_complete_config_untouched() {
        let defaults = json!({ "chat": { "print_chat_log": false } });
        let mut target = json!({ "chat": { "print_chat_log": true } });
        assert!(fill_missing(&mut target, &defaults).is_empty());
        assert_eq!(target["chat"]["print_chat_log"], json!(true));
    }
}
