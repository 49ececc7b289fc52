use std::collections::HashMap;
use std::sync::Arc;

use plume::channel::{self, JsonLinesSink, MemorySink, OutboundMessage};
use plume::model::{GenerationConfig, GenerationRequest, Length, Provider, RoutingHandle, TweetInput};
use plume::orchestrator::SuggestionOrchestrator;
use plume::prompt::{EMOJIS_OFF, HASHTAGS_ON, TONE_AUTHORITATIVE, length_guide};
use plume::providers::{OpenAiClient, ProviderRegistry};
use plume::stats::{self, MemoryStore, STATE_KEY, Store};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPLETION: &str = r#"["Great insight!","Have you considered X?","Love this take 🔥"]"#;

async fn mock_openai(completion: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": completion}}]
        })))
        .mount(&server)
        .await;
    server
}

fn registry_for(server: &MockServer) -> ProviderRegistry {
    ProviderRegistry::new().with_client(Arc::new(
        OpenAiClient::new(reqwest::Client::new()).with_base_url(server.uri()),
    ))
}

#[tokio::test]
async fn openai_request_end_to_end() {
    let server = mock_openai(COMPLETION).await;
    let store = Arc::new(MemoryStore::new());
    store
        .set(
            STATE_KEY,
            json!({"stats": {"repliesGenerated": 2, "tweetsAnalyzed": 0, "lastReset": stats::today()}}),
        )
        .await
        .expect("seed store");
    let sink = Arc::new(MemorySink::new());
    let orchestrator =
        SuggestionOrchestrator::new(registry_for(&server), store.clone()).with_sink(sink.clone());

    let result = orchestrator
        .handle(GenerationRequest {
            tweet: TweetInput {
                text: "Most outages are config changes".to_string(),
                author: "SRE Weekly".to_string(),
                handle: "sreweekly".to_string(),
            },
            config: GenerationConfig {
                provider: Provider::Openai,
                api_key: "sk-live-abcdefghijklmnopqrstuvwxyz".to_string(),
                tone: 80,
                length: Length::Concise,
                include_emojis: false,
                add_hashtags: true,
                ..GenerationConfig::default()
            },
            reply_to: Some(RoutingHandle::Id(9)),
        })
        .await;

    assert_eq!(
        result.as_slice(),
        ["Great insight!", "Have you considered X?", "Love this take 🔥"]
    );
    assert_eq!(
        sink.sent(),
        vec![(
            RoutingHandle::Id(9),
            OutboundMessage::SuggestionsReady {
                suggestions: result.clone()
            }
        )]
    );

    let after = stats::current_stats(&*store, &stats::today())
        .await
        .expect("read stats");
    assert_eq!(after.replies_generated, 3);

    let requests = server.received_requests().await.expect("recorded requests");
    assert_eq!(requests.len(), 1);
    let body: Value = requests[0].body_json().expect("json body");
    let prompt = body["messages"][1]["content"].as_str().expect("prompt");
    assert!(prompt.contains(TONE_AUTHORITATIVE));
    assert!(prompt.contains(length_guide(Length::Concise)));
    assert!(prompt.contains(EMOJIS_OFF));
    assert!(prompt.contains(HASHTAGS_ON));
}

#[tokio::test]
async fn serve_answers_each_request_on_its_handle() {
    let server = mock_openai(COMPLETION).await;
    let sink = Arc::new(JsonLinesSink::new(Vec::new()));
    let orchestrator = Arc::new(
        SuggestionOrchestrator::new(registry_for(&server), Arc::new(MemoryStore::new()))
            .with_sink(sink.clone()),
    );

    let input = [
        json!({"tabId": 1, "message": {
            "type": "GENERATE_SUGGESTIONS",
            "tweet": {"text": "hello", "author": "A", "handle": "a"},
            "config": {"provider": "openai", "apiKey": "sk-abcdefghijklmnopqrstuvwxyz"}
        }})
        .to_string(),
        json!({"tabId": "tab-2", "message": {
            "type": "GENERATE_SUGGESTIONS",
            "tweet": {"text": "hello again"},
            "config": {"provider": "openai"}
        }})
        .to_string(),
        "this is not json".to_string(),
        json!({"tabId": 1, "message": {"type": "STATE_UPDATED"}}).to_string(),
    ]
    .join("\n");

    let summary = channel::serve(input.as_bytes(), sink.clone(), orchestrator)
        .await
        .expect("serve should finish at end of input");
    assert_eq!(summary.requests, 2);
    assert_eq!(summary.ignored, 2);

    let Ok(sink) = Arc::try_unwrap(sink) else {
        panic!("sink should have no other owners after serve returns");
    };
    let output = String::from_utf8(sink.into_writer()).expect("utf-8 output");
    let responses: HashMap<String, Value> = output
        .lines()
        .map(|line| {
            let envelope: Value = serde_json::from_str(line).expect("json line");
            assert_eq!(envelope["message"]["type"], "SUGGESTIONS_READY");
            (
                envelope["tabId"].to_string(),
                envelope["message"]["suggestions"].clone(),
            )
        })
        .collect();

    assert_eq!(responses.len(), 2);
    assert_eq!(
        responses["1"],
        json!(["Great insight!", "Have you considered X?", "Love this take 🔥"])
    );
    assert_eq!(responses["\"tab-2\""], json!([]));
    assert_eq!(server.received_requests().await.expect("recorded").len(), 1);
}

#[tokio::test]
async fn serve_replies_empty_to_requests_with_odd_config_values() {
    let server = mock_openai(COMPLETION).await;
    let sink = Arc::new(JsonLinesSink::new(Vec::new()));
    let orchestrator = Arc::new(
        SuggestionOrchestrator::new(registry_for(&server), Arc::new(MemoryStore::new()))
            .with_sink(sink.clone()),
    );

    let tweet = json!({"text": "hello", "author": "A", "handle": "a"});
    let input = [
        json!({"tabId": 1, "message": {
            "type": "GENERATE_SUGGESTIONS",
            "tweet": tweet,
            "config": {"provider": "openai", "apiKey": null}
        }}),
        json!({"tabId": 2, "message": {
            "type": "GENERATE_SUGGESTIONS",
            "tweet": tweet,
            "config": {"provider": "openai", "tone": 80.5}
        }}),
        json!({"tabId": 3, "message": {
            "type": "GENERATE_SUGGESTIONS",
            "tweet": tweet,
            "config": {"provider": "openai", "tone": "loud"}
        }}),
    ]
    .iter()
    .map(Value::to_string)
    .collect::<Vec<_>>()
    .join("\n");

    let summary = channel::serve(input.as_bytes(), sink.clone(), orchestrator)
        .await
        .expect("serve should finish at end of input");
    assert_eq!(summary.requests, 3);
    assert_eq!(summary.ignored, 0);

    let Ok(sink) = Arc::try_unwrap(sink) else {
        panic!("sink should have no other owners after serve returns");
    };
    let output = String::from_utf8(sink.into_writer()).expect("utf-8 output");
    let mut replies: Vec<Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    replies.sort_by_key(|reply| reply["tabId"].as_u64());

    assert_eq!(
        replies,
        (1..=3)
            .map(|tab| json!({"tabId": tab, "message": {"type": "SUGGESTIONS_READY", "suggestions": []}}))
            .collect::<Vec<_>>()
    );
    assert!(server.received_requests().await.expect("recorded").is_empty());
}
