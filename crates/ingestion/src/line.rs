//! 行文本聊天源
//!
//! 从任意 `AsyncBufRead` (CLI 中为 stdin) 读取聊天行：
//! `[badge,badge] author: content` 或 `author: content`。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{Badge, ChatMessage};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::error::{IngestionError, Result};
use crate::metrics::IngestionMetrics;

/// 解析一行聊天文本
///
/// 空行返回 `Ok(None)`；未知徽章被忽略。
pub fn parse_line(line: &str) -> Result<Option<ChatMessage>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (badges, rest) = match trimmed.strip_prefix('[') {
        Some(after) => {
            let (list, rest) = after
                .split_once(']')
                .ok_or_else(|| IngestionError::parse_failed(line, "unclosed badge list"))?;
            (parse_badges(list), rest.trim_start())
        }
        None => (Vec::new(), trimmed),
    };

    let (author, content) = rest
        .split_once(':')
        .ok_or_else(|| IngestionError::parse_failed(line, "expected 'author: content'"))?;
    let author = author.trim();
    if author.is_empty() {
        return Err(IngestionError::parse_failed(line, "empty author"));
    }
    let content = content.strip_prefix(' ').unwrap_or(content);

    Ok(Some(ChatMessage::new(author, content).with_badges(badges)))
}

fn parse_badges(list: &str) -> Vec<Badge> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| match s.parse::<Badge>() {
            Ok(badge) => Some(badge),
            Err(e) => {
                debug!(error = %e, "badge ignored");
                None
            }
        })
        .collect()
}

/// 行文本聊天源
pub struct LineChatSource {
    name: String,
    running: Arc<AtomicBool>,
}

impl LineChatSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 启动读取任务，返回消息接收端
    ///
    /// 读到 EOF、读取出错或接收端关闭时任务结束，通道随之关闭。
    /// 无法解析的行记录 warn 日志并跳过。
    pub fn start<R>(
        &self,
        reader: R,
        channel_capacity: usize,
        metrics: Option<Arc<IngestionMetrics>>,
    ) -> mpsc::Receiver<ChatMessage>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(channel_capacity.max(1));
        let name = self.name.clone();
        let running = self.running.clone();
        let metrics = metrics.unwrap_or_else(|| Arc::new(IngestionMetrics::new()));

        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            debug!(source = %name, "line chat source started");
            let mut lines = reader.lines();

            while running.load(Ordering::Relaxed) {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        debug!(source = %name, "end of input");
                        break;
                    }
                    Err(e) => {
                        warn!(source = %name, error = %e, "read failed, stopping source");
                        break;
                    }
                };

                match parse_line(&line) {
                    Ok(Some(message)) => {
                        metrics.record_received(&name);
                        trace!(source = %name, author = %message.author, "chat line parsed");
                        if tx.send(message).await.is_err() {
                            debug!(source = %name, "chat channel closed");
                            break;
                        }
                    }
                    Ok(None) => metrics.record_blank(),
                    Err(e) => {
                        metrics.record_parse_error(&name);
                        warn!(source = %name, error = %e, "chat line skipped");
                    }
                }
            }

            running.store(false, Ordering::SeqCst);
            debug!(source = %name, "line chat source stopped");
        });

        rx
    }

    /// 停止读取 (在下一行到达后生效)
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// 检查是否正在运行
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
