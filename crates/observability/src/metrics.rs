//! 批处理/转发指标收集模块
//!
//! 基于 `metrics` facade 记录运行指标，并在内存中聚合转发统计。

use std::collections::HashMap;
use std::time::Duration;

use contracts::ChatMessage;
use metrics::{counter, gauge, histogram};

/// 记录片段入队
///
/// 每次 `submit`/`enqueue` 成功后调用。
pub fn record_fragments_enqueued(count: usize, queue_len: usize) {
    counter!("chat_relay_fragments_enqueued_total").increment(count as u64);
    gauge!("chat_relay_queue_depth").set(queue_len as f64);
}

/// 记录 block 刷新到 sink
pub fn record_block_flushed(chars: usize, next_delay: Duration) {
    counter!("chat_relay_blocks_flushed_total").increment(1);
    histogram!("chat_relay_block_chars").record(chars as f64);
    gauge!("chat_relay_next_delay_ms").set(next_delay.as_secs_f64() * 1000.0);
}

/// 记录 sink 发送失败
pub fn record_sink_failure(sink_name: &str) {
    counter!(
        "chat_relay_sink_failures_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
}

/// 记录永远无法放入 block 的片段
pub fn record_starved_fragment(length: usize) {
    counter!("chat_relay_starved_fragments_total").increment(1);
    histogram!("chat_relay_starved_fragment_chars").record(length as f64);
}

/// 记录聊天消息接收
pub fn record_chat_message(source: &str, relayed: bool) {
    let status = if relayed { "relayed" } else { "skipped" };
    counter!(
        "chat_relay_messages_total",
        "source" => source.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 转发指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct RelayMetricsAggregator {
    /// 收到的消息总数
    pub total_messages: u64,

    /// 成功提交的消息数
    pub relayed: u64,

    /// 跳过的消息数 (echo / 空消息)
    pub skipped: u64,

    /// 被拒绝的消息数
    pub rejected: u64,

    /// 提交的片段总数
    pub fragments: u64,

    /// 消息长度统计 (chars)
    pub message_len_stats: RunningStats,

    /// 各作者消息数
    pub author_counts: HashMap<String, u64>,
}

impl RelayMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条已提交的消息
    pub fn record_relayed(&mut self, message: &ChatMessage, line_chars: usize, fragments: usize) {
        self.total_messages += 1;
        self.relayed += 1;
        self.fragments += fragments as u64;
        self.message_len_stats.push(line_chars as f64);
        *self.author_counts.entry(message.author.clone()).or_insert(0) += 1;
    }

    /// 记录一条跳过的消息
    pub fn record_skipped(&mut self) {
        self.total_messages += 1;
        self.skipped += 1;
    }

    /// 记录一条被拒绝的消息
    pub fn record_rejected(&mut self) {
        self.total_messages += 1;
        self.rejected += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let mut top_authors: Vec<(String, u64)> = self
            .author_counts
            .iter()
            .map(|(author, count)| (author.clone(), *count))
            .collect();
        top_authors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_authors.truncate(5);

        MetricsSummary {
            total_messages: self.total_messages,
            relayed: self.relayed,
            skipped: self.skipped,
            rejected: self.rejected,
            fragments: self.fragments,
            relay_rate: if self.total_messages > 0 {
                self.relayed as f64 / self.total_messages as f64 * 100.0
            } else {
                0.0
            },
            message_chars: StatsSummary::from(&self.message_len_stats),
            top_authors,
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_messages: u64,
    pub relayed: u64,
    pub skipped: u64,
    pub rejected: u64,
    pub fragments: u64,
    pub relay_rate: f64,
    pub message_chars: StatsSummary,
    pub top_authors: Vec<(String, u64)>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Relay Metrics Summary ===")?;
        writeln!(f, "Total messages: {}", self.total_messages)?;
        writeln!(f, "Relayed: {} ({:.2}%)", self.relayed, self.relay_rate)?;
        writeln!(f, "Skipped: {}", self.skipped)?;
        writeln!(f, "Rejected: {}", self.rejected)?;
        writeln!(f, "Fragments: {}", self.fragments)?;
        writeln!(f, "Message length (chars): {}", self.message_chars)?;

        if !self.top_authors.is_empty() {
            writeln!(f, "Top authors:")?;
            for (author, count) in &self.top_authors {
                writeln!(f, "  {}: {}", author, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
