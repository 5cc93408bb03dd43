//! Mock backend for testing
//!
//! Returns a canned reply for every prompt and records what it was asked.
//! Useful for unit tests and development without an API key.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::AIBackend;

/// Reply used when no canned reply is configured
const DEFAULT_REPLY: &str = r#"```json
{
  "alerts": [],
  "insights": [
    "Doanh thu ổn định so với mục tiêu ngày.",
    "Sản phẩm bán chạy tập trung vào một vài mẫu.",
    "Tỷ lệ bỏ giỏ hàng cần được theo dõi."
  ],
  "action_plan": [
    {"action": "Nhập thêm hàng sắp hết", "details": "Ưu tiên các mẫu còn dưới 5 sản phẩm."},
    {"action": "Đẩy hàng bán chậm", "details": "Tạo combo với sản phẩm bán chạy."},
    {"action": "Nhắc khách bỏ giỏ", "details": "Gửi email kèm mã giảm giá nhỏ."}
  ]
}
```"#;

/// Mock AI backend for testing
#[derive(Clone)]
pub struct MockBackend {
    /// Reply to return; `None` makes every call fail as an upstream error
    reply: Option<String>,
    /// Whether health_check should return true
    pub healthy: bool,
    calls: Arc<AtomicUsize>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::with_reply(DEFAULT_REPLY)
    }
}

impl MockBackend {
    /// Create a mock backend with the default canned analysis
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock backend returning `reply` verbatim
    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            healthy: true,
            calls: Arc::new(AtomicUsize::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a mock backend whose calls always fail
    pub fn failing() -> Self {
        Self {
            reply: None,
            healthy: false,
            ..Self::default()
        }
    }

    /// Reply from `MOCK_AI_REPLY`, or the default canned analysis
    pub fn from_env() -> Self {
        match std::env::var("MOCK_AI_REPLY") {
            Ok(reply) if !reply.is_empty() => Self::with_reply(&reply),
            _ => Self::default(),
        }
    }

    /// Number of `generate` calls made so far (shared between clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent prompt received
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }

        self.reply
            .clone()
            .ok_or_else(|| Error::Upstream("Mock AI backend configured to fail".into()))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
