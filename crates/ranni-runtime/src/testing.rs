//! Test doubles shared by the runtime tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use ranni_core::ApiResult;
use ranni_framework::{ApiCaller, Gateway};

/// Records every POST and answers with a successful send acknowledgment.
#[derive(Default)]
pub struct RecordingCaller {
    pub posts: Mutex<Vec<(String, Value)>>,
    pub fail_sends: bool,
}

impl RecordingCaller {
    pub fn posts_to(&self, path: &str) -> Vec<Value> {
        self.posts
            .lock()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

#[async_trait]
impl ApiCaller for RecordingCaller {
    async fn post_json(&self, path: &str, body: Value) -> ApiResult<Value> {
        self.posts.lock().push((path.to_string(), body));
        let status = if self.fail_sends { "failed" } else { "ok" };
        Ok(json!({"status": status, "retcode": 0, "data": {"message_id": 42}}))
    }

    async fn get_json(&self, _path: &str, _params: &[(&str, String)]) -> ApiResult<Value> {
        Ok(json!({"status": "ok", "retcode": 0, "data": null}))
    }
}

pub fn gateway() -> (Arc<RecordingCaller>, Gateway) {
    let caller = Arc::new(RecordingCaller::default());
    (Arc::clone(&caller), Gateway::new(caller))
}

pub fn failing_gateway() -> (Arc<RecordingCaller>, Gateway) {
    let caller = Arc::new(RecordingCaller {
        fail_sends: true,
        ..Default::default()
    });
    (Arc::clone(&caller), Gateway::new(caller))
}
