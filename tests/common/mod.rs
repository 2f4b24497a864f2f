//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use weibo_spyder::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
use weibo_spyder::{Result, Session, Spyder, WeiboApi};
use wiremock::MockServer;

pub const TEST_COOKIE: &str = "SUB=test-cookie; SUBP=0033";

/// Client pointed at a wiremock server for both the JSON and search hosts.
pub fn api_for(server: &MockServer) -> WeiboApi {
    let transport = HttpTransport::new(Duration::from_secs(5)).expect("Failed to build transport");
    WeiboApi::new(Arc::new(transport), Session::new(TEST_COOKIE))
        .with_bases(&server.uri(), &server.uri())
}

pub fn spyder_for(server: &MockServer) -> Spyder {
    Spyder::new(api_for(server))
}

type Responder = dyn Fn(&ApiRequest) -> ApiResponse + Send + Sync;

/// In-memory transport that answers through a closure and records every request.
pub struct ScriptedTransport {
    respond: Box<Responder>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(respond: impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose URL ends with `suffix`.
    pub fn count(&self, suffix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.ends_with(suffix))
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(&self, request: ApiRequest) -> Result<ApiResponse> {
        let response = (self.respond)(&request);
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}

pub fn scripted_api(transport: &Arc<ScriptedTransport>) -> WeiboApi {
    WeiboApi::new(transport.clone(), Session::new(TEST_COOKIE))
        .with_bases("https://api.test", "https://search.test")
}

pub fn ok(body: impl Into<String>) -> ApiResponse {
    ApiResponse {
        status: 200,
        body: body.into(),
    }
}

/// A feed-shape post payload.
pub fn feed_post(mblogid: &str, text: &str) -> Value {
    json!({
        "visible": {"type": 0, "list_id": 0},
        "created_at": "Sat Nov 20 10:00:00 +0800 2021",
        "id": 4_711_111_111_111_111u64,
        "mid": "4711111111111111",
        "mblogid": mblogid,
        "text": text,
        "text_raw": "纯文本",
        "pic_ids": [],
        "reposts_count": 1,
        "comments_count": 2,
        "attitudes_count": 3,
        "user": {"id": 1_234_567_890u64, "screen_name": "作者", "profile_url": "/u/1234567890"}
    })
}

pub fn profile(uid: u64, followers: u64, friends: u64) -> Value {
    json!({
        "ok": 1,
        "data": {"user": {
            "id": uid,
            "idstr": uid.to_string(),
            "screen_name": "测试用户",
            "profile_url": format!("/u/{uid}"),
            "followers_count": followers,
            "friends_count": friends,
            "description": "简介"
        }}
    })
}

/// `count` partial-user payloads starting at `start`.
pub fn users(start: usize, count: usize) -> Value {
    let users: Vec<Value> = (start..start + count)
        .map(|i| json!({"id": i, "screen_name": format!("user{i}")}))
        .collect();
    json!({"users": users})
}

/// A search page holding `count` post cards.
pub fn search_page(count: usize, notice: Option<&str>) -> String {
    let cards: String = (0..count).map(|i| post_card(&format!("47000000000{i:05}"))).collect();
    let notice = notice
        .map(|text| format!(r#"<div class="m-error">{text}</div>"#))
        .unwrap_or_default();
    format!("<html><body>{notice}<div id=\"pl_feedlist_index\">{cards}</div></body></html>")
}

pub fn post_card(mid: &str) -> String {
    format!(
        r#"<div class="card-wrap" mid="{mid}"><div class="card">
            <div class="card-feed"><div class="content">
              <div class="info"><a class="name" href="//weibo.com/1234567890?refer_flag=1" nick-name="作者">作者</a></div>
              <p class="txt" nick-name="作者">正文 {mid}</p>
              <div class="from"><a href="//weibo.com/1234567890/Abc?refer_flag=1">今天 10:00</a></div>
            </div></div>
            <div class="card-act"><ul><li>转发</li><li>评论 5</li><li>赞</li></ul></div>
        </div></div>"#
    )
}

pub fn topic_page(count: usize) -> String {
    let cards: String = (0..count)
        .map(|i| {
            format!(
                r#"<div class="card"><div class="info"><a href="//s.weibo.com/weibo?q=%23t{i}%23">#话题{i}#</a>
                   <p>1万讨论 200万阅读</p></div></div>"#
            )
        })
        .collect();
    format!("<html><body>{cards}</body></html>")
}
