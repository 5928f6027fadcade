//! AppBlueprint - Config Loader 输出
//!
//! 描述完整的应用配置：批处理节奏、聊天显示、输出路由。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{Badge, BatchingConfig};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的应用配置蓝图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 批处理与限速配置
    #[serde(default)]
    pub batching: BatchingConfig,

    /// 聊天显示配置
    #[serde(default)]
    pub chat: ChatConfig,

    /// 输出路由配置
    #[serde(default = "default_sinks")]
    pub sinks: Vec<SinkConfig>,
}

impl Default for AppBlueprint {
    fn default() -> Self {
        Self {
            version: ConfigVersion::V1,
            batching: BatchingConfig::default(),
            chat: ChatConfig::default(),
            sinks: default_sinks(),
        }
    }
}

fn default_sinks() -> Vec<SinkConfig> {
    vec![SinkConfig::osc("chatbox", DEFAULT_OSC_ADDR)]
}

/// OSC 默认目标地址 (本机 VRChat)
pub const DEFAULT_OSC_ADDR: &str = "127.0.0.1:9000";

/// 聊天显示配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// 是否在控制台打印聊天记录
    pub print_chat_log: bool,

    /// 徽章图标
    pub badges: BadgeConfig,
}

/// 徽章图标配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeConfig {
    /// 是否渲染徽章
    pub enable: bool,
    pub sub: String,
    pub gift_sub: String,
    pub bits: String,
    pub broadcaster: String,
    pub moderator: String,
    pub verified: String,
    pub artist: String,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            enable: true,
            sub: "🐾".to_string(),
            gift_sub: "🎁".to_string(),
            bits: "▲".to_string(),
            broadcaster: "🎥".to_string(),
            moderator: "⚔️".to_string(),
            verified: "✅".to_string(),
            artist: "🎨".to_string(),
        }
    }
}

impl BadgeConfig {
    /// 查找徽章对应的图标
    pub fn icon(&self, badge: Badge) -> &str {
        match badge {
            Badge::Subscriber => &self.sub,
            Badge::GiftSub => &self.gift_sub,
            Badge::Bits => &self.bits,
            Badge::Broadcaster => &self.broadcaster,
            Badge::Moderator => &self.moderator,
            Badge::Verified => &self.verified,
            Badge::Artist => &self.artist,
        }
    }
}

/// Sink 输出配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SinkConfig {
    /// 创建 OSC sink 配置
    pub fn osc(name: impl Into<String>, addr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sink_type: SinkType::Osc,
            params: HashMap::from([("addr".to_string(), addr.into())]),
        }
    }

    /// 创建日志 sink 配置
    pub fn log(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sink_type: SinkType::Log,
            params: HashMap::new(),
        }
    }
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// OSC/UDP 聊天框
    Osc,
    /// tracing 日志
    Log,
    /// 文本记录文件
    File,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_blueprint_targets_local_chatbox() {
        let bp = AppBlueprint::default();
        assert_eq!(bp.sinks.len(), 1);
        assert_eq!(bp.sinks[0].sink_type, SinkType::Osc);
        assert_eq!(bp.sinks[0].params.get("addr").unwrap(), DEFAULT_OSC_ADDR);
        assert!(bp.chat.badges.enable);
    }

    #[test]
    fn test_empty_json_fills_defaults() {
        let bp: AppBlueprint = serde_json::from_str("{}").unwrap();
        assert_eq!(bp, AppBlueprint::default());
    }

    #[test]
    fn test_badge_icon_lookup() {
        let badges = BadgeConfig::default();
        assert_eq!(badges.icon(Badge::Subscriber), "🐾");
        assert_eq!(badges.icon(Badge::Moderator), "⚔️");
    }

    #[test]
    fn test_sink_type_snake_case() {
        let json = serde_json::to_string(&SinkType::File).unwrap();
        assert_eq!(json, "\"file\"");
    }
}
