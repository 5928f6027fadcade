//! Mock 聊天源
//!
//! 用于无聊天服务环境的演示与测试。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{Badge, ChatMessage};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::metrics::IngestionMetrics;

const AUTHORS: [&str; 5] = ["alice", "bob", "carol", "dave", "eve"];

const PHRASES: [&str; 6] = [
    "hello chat",
    "that was a great play",
    "gg",
    "can you explain how the batching works?",
    "🐾🐾🐾",
    "first time here, love the stream",
];

/// Mock 聊天源配置
#[derive(Debug, Clone)]
pub struct MockChatConfig {
    /// 来源名称
    pub source_name: String,

    /// 发送频率 (条/秒)
    pub rate_hz: f64,

    /// 最多发送条数 (None = 无限)
    pub max_messages: Option<u64>,

    /// 每隔多少条插入一条超长消息 (0 = 不插入)
    pub long_every: u64,
}

impl Default for MockChatConfig {
    fn default() -> Self {
        Self {
            source_name: "mock".to_string(),
            rate_hz: 2.0,
            max_messages: None,
            long_every: 7,
        }
    }
}

/// Mock 聊天源
///
/// 按固定频率生成确定性的聊天消息，轮换作者与徽章。
pub struct MockChatSource {
    config: MockChatConfig,
    running: Arc<AtomicBool>,
}

impl MockChatSource {
    /// 创建新的 Mock 聊天源
    pub fn new(config: MockChatConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 指定频率和条数
    pub fn with_rate(rate_hz: f64, max_messages: Option<u64>) -> Self {
        Self::new(MockChatConfig {
            rate_hz,
            max_messages,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &MockChatConfig {
        &self.config
    }

    /// 第 `seq` 条消息 (从 1 开始)
    pub fn message(config: &MockChatConfig, seq: u64) -> ChatMessage {
        let idx = (seq - 1) as usize;
        let author = AUTHORS[idx % AUTHORS.len()];

        let content = if config.long_every > 0 && seq % config.long_every == 0 {
            format!(
                "#{seq} {}",
                "this is a deliberately long message that will not fit into a single chatbox block "
                    .repeat(2)
                    .trim_end()
            )
        } else {
            format!("#{seq} {}", PHRASES[idx % PHRASES.len()])
        };

        let badges = match seq % 4 {
            0 => vec![Badge::Subscriber],
            1 => Vec::new(),
            2 => vec![Badge::Moderator, Badge::Bits],
            _ => vec![Badge::Verified],
        };

        ChatMessage::new(author, content).with_badges(badges)
    }

    /// 启动 Mock 源，返回消息接收端
    ///
    /// # Arguments
    /// * `channel_capacity` - 通道容量
    /// * `metrics` - 可选的 metrics 实例
    pub fn start(
        &self,
        channel_capacity: usize,
        metrics: Option<Arc<IngestionMetrics>>,
    ) -> mpsc::Receiver<ChatMessage> {
        let (tx, rx) = mpsc::channel(channel_capacity.max(1));
        let config = self.config.clone();
        let running = self.running.clone();
        let metrics = metrics.unwrap_or_else(|| Arc::new(IngestionMetrics::new()));

        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let rate = if config.rate_hz.is_finite() && config.rate_hz > 0.0 {
                config.rate_hz
            } else {
                1.0
            };
            let interval = Duration::from_secs_f64(1.0 / rate);
            let mut seq: u64 = 0;

            debug!(
                source = %config.source_name,
                rate_hz = rate,
                max_messages = ?config.max_messages,
                "mock chat source started"
            );

            while running.load(Ordering::Relaxed) {
                if config.max_messages.is_some_and(|max| seq >= max) {
                    break;
                }
                seq += 1;

                let message = Self::message(&config, seq);
                metrics.record_received(&config.source_name);

                if tx.send(message).await.is_err() {
                    debug!(source = %config.source_name, "mock chat channel closed");
                    break;
                }

                trace!(source = %config.source_name, seq, "mock message sent");

                tokio::time::sleep(interval).await;
            }

            running.store(false, Ordering::SeqCst);
            debug!(source = %config.source_name, sent = seq, "mock chat source stopped");
        });

        rx
    }

    /// 停止 Mock 源
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// 检查是否正在运行
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
