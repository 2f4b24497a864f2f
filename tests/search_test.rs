//! Integration tests for the search aggregation.

mod common;

use weibo_spyder::model::{SearchParams, SearchResult, SearchType};
use weibo_spyder::{Error, Spyder};

use common::{ok, post_card, scripted_api, search_page, topic_page, ScriptedTransport};

fn page_number(request: &weibo_spyder::transport::ApiRequest) -> u32 {
    request
        .query_value("page")
        .and_then(|p| p.parse().ok())
        .expect("search request without page")
}

#[tokio::test]
async fn test_topic_search_fetches_a_single_page() {
    let transport = ScriptedTransport::new(|_| ok(topic_page(3)));
    let spyder = Spyder::new(scripted_api(&transport));

    let results = spyder
        .search("话题", SearchType::Topic, 50, &SearchParams::new())
        .await
        .unwrap();

    assert_eq!(transport.requests().len(), 1);
    assert_eq!(results.len(), 3);
    match &results[0] {
        SearchResult::Topic(topic) => {
            assert_eq!(topic.name, "#话题0#");
            assert_eq!(topic.num, "1万讨论 200万阅读");
        }
        other => panic!("expected a topic, got {other:?}"),
    }
}

#[tokio::test]
async fn test_weibo_search_clamps_to_reported_total() {
    let transport = ScriptedTransport::new(|request| {
        let notice = "抱歉，未找到更多结果，共7条";
        match page_number(request) {
            1 => ok(search_page(5, Some(notice))),
            2 => ok(search_page(5, None)),
            _ => ok(search_page(0, None)),
        }
    });
    let spyder = Spyder::new(scripted_api(&transport));

    let results = spyder
        .search("关键词", SearchType::Weibo, 50, &SearchParams::new())
        .await
        .unwrap();

    assert_eq!(results.len(), 7);
    // Page one is read once for the total and reused for the results.
    assert_eq!(transport.count("/weibo"), 2);
    let requests = transport.requests();
    assert_eq!(requests[0].query_value("q"), Some("关键词"));
    assert!(requests
        .iter()
        .all(|r| r.headers.iter().any(|(name, _)| name == "Cookie")));
}

#[tokio::test]
async fn test_nodup_search_skips_clamp_and_stops_on_empty_page() {
    let transport = ScriptedTransport::new(|request| match page_number(request) {
        1 => ok(search_page(4, Some("共2条"))),
        _ => ok(search_page(0, None)),
    });
    let spyder = Spyder::new(scripted_api(&transport));
    let params = SearchParams::new().with("nodup", 1);

    let results = spyder
        .search("关键词", SearchType::Weibo, 10, &params)
        .await
        .unwrap();

    assert_eq!(results.len(), 4);
    assert_eq!(transport.requests().len(), 2);
    assert_eq!(transport.requests()[0].query_value("nodup"), Some("1"));
}

#[tokio::test]
async fn test_realtime_search_truncates_and_parses_posts() {
    let transport = ScriptedTransport::new(|_| ok(search_page(6, None)));
    let spyder = Spyder::new(scripted_api(&transport));

    let results = spyder
        .search("实时", SearchType::Realtime, 8, &SearchParams::new())
        .await
        .unwrap();

    assert_eq!(results.len(), 8);
    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url, "https://search.test/realtime");
    assert_eq!(requests[0].query_value("rd"), Some("realtime"));

    let SearchResult::Post(post) = &results[0] else {
        panic!("expected a post");
    };
    let engagement = post.engagement();
    assert_eq!(engagement.forward.to_string(), "0");
    assert_eq!(engagement.comment.exact(), Some(5));
    assert_eq!(engagement.like.to_string(), "0");
    assert_eq!(post.created_time().unwrap(), "今天 10:00");
}

#[tokio::test]
async fn test_user_search_returns_stubs() {
    let transport = ScriptedTransport::new(|_| {
        ok(r#"<html><body>
            <div class="card"><div class="info">
              <a class="name" href="//weibo.com/u/5555">某 用户</a>
              <p><span class="s-nobr">粉丝：1.2万</span></p>
            </div></div>
        </body></html>"#)
    });
    let spyder = Spyder::new(scripted_api(&transport));

    let results = spyder
        .search("用户", SearchType::User, 1, &SearchParams::new())
        .await
        .unwrap();

    assert_eq!(transport.count("/user"), 1);
    match &results[..] {
        [SearchResult::User(stub)] => {
            assert_eq!(stub.url, "https://weibo.com/u/5555");
            assert_eq!(stub.num, "粉丝：1.2万");
        }
        other => panic!("expected one user stub, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_card_fails_the_search() {
    let transport = ScriptedTransport::new(|_| {
        ok(format!(
            "<html><body>{}<div class=\"card-wrap\" mid=\"1\"><div class=\"card\"></div></div></body></html>",
            post_card("4700000000000001")
        ))
    });
    let spyder = Spyder::new(scripted_api(&transport));

    let err = spyder
        .search("坏", SearchType::Video, 2, &SearchParams::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingField { field } if field == "card-feed"));
}
