//! 聊天行格式化
//!
//! `"{徽章图标}{作者}:{内容}"`，自身发出的 echo 消息不转发。

use contracts::{ChatConfig, ChatMessage};

/// Renders chat messages into relay lines
#[derive(Debug, Clone, Default)]
pub struct ChatFormatter {
    config: ChatConfig,
}

impl ChatFormatter {
    pub fn new(config: ChatConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Relay line for `message`, `None` for echo messages
    pub fn format(&self, message: &ChatMessage) -> Option<String> {
        if message.echo {
            return None;
        }

        let mut line = String::with_capacity(message.author.len() + message.content.len() + 8);
        if self.config.badges.enable {
            for badge in &message.badges {
                line.push_str(self.config.badges.icon(*badge));
            }
        }
        line.push_str(&message.author);
        line.push(':');
        line.push_str(&message.content);
        Some(line)
    }
}
