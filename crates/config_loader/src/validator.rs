//! 配置校验模块
//!
//! 校验规则：
//! - batching 边界合法 (见 `BatchingConfig::validate`)
//! - sink 名称非空且唯一
//! - osc sink 的 `addr` 可解析为 socket 地址
//! - file sink 必须提供 `path`

use std::collections::HashSet;
use std::net::SocketAddr;

use contracts::{AppBlueprint, ContractError, SinkType};

/// 校验 AppBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &AppBlueprint) -> Result<(), ContractError> {
    blueprint.batching.validate()?;
    validate_sink_names(blueprint)?;
    validate_sink_params(blueprint)?;
    Ok(())
}

/// 校验 sink 名称
fn validate_sink_names(blueprint: &AppBlueprint) -> Result<(), ContractError> {
    if blueprint.sinks.is_empty() {
        return Err(ContractError::invalid_configuration(
            "sinks",
            "at least one sink is required",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.trim().is_empty() {
            return Err(ContractError::invalid_configuration(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::invalid_configuration(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}

/// 校验 sink 类型特定参数
fn validate_sink_params(blueprint: &AppBlueprint) -> Result<(), ContractError> {
    for sink in &blueprint.sinks {
        match sink.sink_type {
            SinkType::Osc => {
                if let Some(addr) = sink.params.get("addr") {
                    addr.parse::<SocketAddr>().map_err(|e| {
                        ContractError::invalid_configuration(
                            format!("sinks[{}].params.addr", sink.name),
                            format!("invalid socket address '{}': {}", addr, e),
                        )
                    })?;
                }
            }
            SinkType::File => {
                let has_path = sink
                    .params
                    .get("path")
                    .is_some_and(|p| !p.trim().is_empty());
                if !has_path {
                    return Err(ContractError::invalid_configuration(
                        format!("sinks[{}].params.path", sink.name),
                        "file sink requires a non-empty 'path'",
                    ));
                }
            }
            SinkType::Log => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{BatchingConfig, SinkConfig};
    use std::collections::HashMap;

    fn minimal_blueprint() -> AppBlueprint {
        AppBlueprint {
            sinks: vec![
                SinkConfig::osc("chatbox", "127.0.0.1:9000"),
                SinkConfig::log("console"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_batching_rules_enforced() {
        let mut bp = minimal_blueprint();
        bp.batching = BatchingConfig {
            big_msg_length: 144,
            ..Default::default()
        };
        let err = validate(&bp).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("big_msg_length"), "got: {err}");
    }

    #[test]
    fn test_duplicate_sink_name() {
        let mut bp = minimal_blueprint();
        bp.sinks.push(SinkConfig::log("console"));
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("duplicate sink name"), "got: {err}");
    }

    #[test]
    fn test_empty_sink_name() {
        let mut bp = minimal_blueprint();
        bp.sinks[0].name = String::new();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_no_sinks() {
        let mut bp = minimal_blueprint();
        bp.sinks.clear();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("at least one sink"), "got: {err}");
    }

    #[test]
    fn test_invalid_osc_addr() {
        let mut bp = minimal_blueprint();
        bp.sinks[0] = SinkConfig::osc("chatbox", "localhost");
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("params.addr"), "got: {err}");
    }

    #[test]
    fn test_file_sink_requires_path() {
        let mut bp = minimal_blueprint();
        bp.sinks.push(SinkConfig {
            name: "transcript".into(),
            sink_type: SinkType::File,
            params: HashMap::new(),
        });
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("requires a non-empty 'path'"), "got: {err}");

        bp.sinks[2]
            .params
            .insert("path".into(), "logs/chat.log".into());
        assert!(validate(&bp).is_ok());
    }
}
