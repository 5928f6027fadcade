//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（无需游戏客户端）
//! - 节奏 / 顺序 / 边界等跨 crate 性质

#[cfg(test)]
mod contract_tests {
    use contracts::{AppBlueprint, BatchingConfig, BLOCK_SEPARATOR};

    #[test]
    fn test_contract_defaults() {
        let bp = AppBlueprint::default();
        assert_eq!(bp.version, contracts::ConfigVersion::V1);
        assert_eq!(bp.batching, BatchingConfig::default());
        assert_eq!(bp.batching.chunk_width(), 143);
        assert_eq!(BLOCK_SEPARATOR, '\u{2028}');
    }
}

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};

    use contracts::{ContractError, TextSink, BLOCK_SEPARATOR};
    use tokio::time::Instant;

    /// Sink recording every block with the instant it arrived
    #[derive(Clone, Default)]
    pub struct RecordingSink {
        sent: Arc<Mutex<Vec<(Instant, String)>>>,
    }

    impl RecordingSink {
        pub fn blocks(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
        }

        pub fn instants(&self) -> Vec<Instant> {
            self.sent.lock().unwrap().iter().map(|(i, _)| *i).collect()
        }

        /// Every fragment in arrival order
        pub fn fragments(&self) -> Vec<String> {
            self.blocks()
                .iter()
                .flat_map(|b| b.split(BLOCK_SEPARATOR).map(str::to_string).collect::<Vec<_>>())
                .collect()
        }
    }

    impl TextSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&mut self, text: &str) -> Result<(), ContractError> {
            self.sent
                .lock()
                .unwrap()
                .push((Instant::now(), text.to_string()));
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{BatchingConfig, Fragment};
    use dispatcher::{chunk, Batcher};
    use ingestion::{ChatFormatter, MockChatConfig, MockChatSource};

    use crate::support::RecordingSink;

    fn expected_fragments(lines: &[String], max_len: usize) -> Vec<String> {
        lines
            .iter()
            .flat_map(|l| chunk(l, max_len).unwrap())
            .map(|f: Fragment| f.as_str().to_string())
            .collect()
    }

    /// End-to-end test: MockChatSource -> ChatFormatter -> Batcher -> sink
    ///
    /// 验证完整的数据流：
    /// 1. 片段按提交顺序到达 sink
    /// 2. 每个 block 不超过上限
    /// 3. 相邻发送间隔符合节奏 (大 block 之后为 big_msg_delay)
    #[tokio::test(start_paused = true)]
    async fn test_e2e_mock_relay() {
        let config = BatchingConfig::default();
        let sink = RecordingSink::default();
        let batcher = Batcher::spawn(config.clone(), sink.clone()).unwrap();
        let formatter = ChatFormatter::default();

        let source = MockChatSource::new(MockChatConfig {
            rate_hz: 4.0,
            max_messages: Some(20),
            ..Default::default()
        });
        let mut rx = source.start(16, None);

        let mut lines = Vec::new();
        while let Some(message) = rx.recv().await {
            let line = formatter.format(&message).unwrap();
            batcher.submit(&line).unwrap();
            lines.push(line);
        }
        assert_eq!(lines.len(), 20);

        // Let everything drain
        while batcher.pending_len() > 0 || batcher.block_len() > 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        for block in sink.blocks() {
            assert!(block.chars().count() <= config.max_block_length, "block: {block}");
        }
        assert_eq!(sink.fragments(), expected_fragments(&lines, config.max_fragment_length));

        let blocks = sink.blocks();
        let instants = sink.instants();
        for i in 1..instants.len() {
            let gap = instants[i] - instants[i - 1];
            let previous_len = blocks[i - 1].chars().count();
            let min_gap = if previous_len >= config.big_msg_length {
                config.big_msg_delay()
            } else {
                config.msg_delay()
            };
            assert!(gap >= min_gap, "gap {gap:?} after {previous_len} chars");
        }

        batcher.shutdown().await;
    }

    /// 多个生产者并发提交时，每个生产者的片段保持相对顺序
    #[tokio::test(start_paused = true)]
    async fn test_concurrent_producers_keep_order() {
        let sink = RecordingSink::default();
        let batcher = Arc::new(Batcher::spawn(BatchingConfig::default(), sink.clone()).unwrap());

        let mut handles = Vec::new();
        for producer in 0..4 {
            let batcher = Arc::clone(&batcher);
            handles.push(tokio::spawn(async move {
                for seq in 0..25 {
                    batcher.submit(&format!("p{producer}:{seq:02}")).unwrap();
                    tokio::task::yield_now().await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        while batcher.pending_len() > 0 || batcher.block_len() > 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let fragments = sink.fragments();
        assert_eq!(fragments.len(), 100);
        for producer in 0..4 {
            let prefix = format!("p{producer}:");
            let seen: Vec<String> = fragments
                .iter()
                .filter(|f| f.starts_with(&prefix))
                .cloned()
                .collect();
            let expected: Vec<String> = (0..25).map(|s| format!("{prefix}{s:02}")).collect();
            assert_eq!(seen, expected);
        }
        for block in sink.blocks() {
            assert!(block.chars().count() <= 144);
        }

        match Arc::try_unwrap(batcher) {
            Ok(batcher) => batcher.shutdown().await,
            Err(_) => panic!("batcher still shared"),
        }
    }

    /// 无消息时不发送任何 block
    #[tokio::test(start_paused = true)]
    async fn test_quiet_chat_sends_nothing() {
        let sink = RecordingSink::default();
        let batcher = Batcher::spawn(BatchingConfig::default(), sink.clone()).unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(sink.blocks().is_empty());
        batcher.shutdown().await;
    }
}

#[cfg(test)]
mod sink_tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use config_loader::{ConfigLoader, LoadOutcome};
    use contracts::{AppBlueprint, BatchingConfig, SinkConfig, SinkType, BLOCK_SEPARATOR};
    use dispatcher::{create_batcher, OscMessage};
    use tokio::net::UdpSocket;
    use tokio_util::sync::CancellationToken;

    fn fast_batching() -> BatchingConfig {
        BatchingConfig {
            msg_delay_s: 0.05,
            big_msg_delay_s: 0.1,
            idle_wait_s: 0.02,
            backoff_s: 0.02,
            ..Default::default()
        }
    }

    /// Batcher -> OscSink -> UDP loopback -> decode
    #[tokio::test]
    async fn test_osc_loopback() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = receiver.local_addr().unwrap().to_string();

        let blueprint = AppBlueprint {
            batching: fast_batching(),
            sinks: vec![SinkConfig::osc("chatbox", addr)],
            ..Default::default()
        };
        let batcher = create_batcher(&blueprint, CancellationToken::new())
            .await
            .unwrap();

        batcher.submit("alice:hello").unwrap();
        batcher.submit("🐾bob:hi").unwrap();

        let mut buf = vec![0u8; 2048];
        let mut fragments = Vec::new();
        while fragments.len() < 2 {
            let len = tokio::time::timeout(Duration::from_secs(5), receiver.recv(&mut buf))
                .await
                .expect("no packet within 5s")
                .unwrap();
            let message = OscMessage::decode(&buf[..len]).unwrap();
            let text = message.chatbox_text().unwrap().to_string();
            fragments.extend(text.split(BLOCK_SEPARATOR).map(str::to_string));
        }

        assert_eq!(fragments, vec!["alice:hello", "🐾bob:hi"]);
        batcher.shutdown().await;
    }

    /// 首次运行生成配置 → 加载 → 文件 sink 写入记录
    #[tokio::test]
    async fn test_config_to_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("chat-relay.toml");
        let transcript = dir.path().join("out").join("chat.log");

        assert!(matches!(
            ConfigLoader::load_or_init(&config_path).unwrap(),
            LoadOutcome::Created { .. }
        ));

        let mut blueprint = ConfigLoader::load_from_path(&config_path).unwrap();
        blueprint.batching = fast_batching();
        blueprint.sinks = vec![SinkConfig {
            name: "transcript".into(),
            sink_type: SinkType::File,
            params: HashMap::from([(
                "path".to_string(),
                transcript.display().to_string(),
            )]),
        }];
        std::fs::write(&config_path, ConfigLoader::to_toml(&blueprint).unwrap()).unwrap();

        let blueprint = ConfigLoader::load_from_path(&config_path).unwrap();
        let batcher = create_batcher(&blueprint, CancellationToken::new())
            .await
            .unwrap();
        batcher.submit("alice:one").unwrap();
        batcher.submit("bob:two").unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while batcher.metrics().blocks_sent() == 0 || batcher.pending_len() > 0 || batcher.block_len() > 0 {
            assert!(tokio::time::Instant::now() < deadline, "transcript not written");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        batcher.shutdown().await;

        let content = std::fs::read_to_string(&transcript).unwrap();
        let joined: Vec<&str> = content
            .lines()
            .map(|l| l.split_once('\t').unwrap().1)
            .collect();
        assert_eq!(joined.join(" | "), "alice:one | bob:two");
    }
}
