//! OpenAI-compatible invoker against a mock backend

#[cfg(test)]
mod tests {
    use crate::common::{assert_err, assert_ok};
    use llm_batch_gateway::config::ProviderConfig;
    use llm_batch_gateway::core::batch::{FanOutConfig, ModelFanOut};
    use llm_batch_gateway::core::invoker::{
        InvocationError, InvokerRegistry, ModelInvoker, OpenAICompatibleInvoker,
    };
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, models: &[&str]) -> ProviderConfig {
        ProviderConfig {
            name: "mock".to_string(),
            base_url: format!("{}/v1/", server.uri()),
            api_key: "test-key".to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
            timeout: 5,
            enabled: true,
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn test_invoke_sends_prompt_and_reads_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-test",
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("hi there")))
            .expect(1)
            .mount(&server)
            .await;

        let invoker = assert_ok!(OpenAICompatibleInvoker::new(&provider(&server, &[])));
        let text = assert_ok!(invoker.invoke("gpt-test", "hello").await);
        assert_eq!(text, "hi there");
    }

    #[tokio::test]
    async fn test_backend_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let invoker = assert_ok!(OpenAICompatibleInvoker::new(&provider(&server, &[])));
        let err = assert_err!(invoker.invoke("gpt-test", "hello").await);
        match err {
            InvocationError::Backend {
                model,
                status,
                message,
            } => {
                assert_eq!(model, "gpt-test");
                assert_eq!(status, 429);
                assert_eq!(message, "slow down");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let invoker = assert_ok!(OpenAICompatibleInvoker::new(&provider(&server, &[])));
        let err = assert_err!(invoker.invoke("gpt-test", "hello").await);
        assert!(matches!(err, InvocationError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn test_registry_routes_prefixed_models_to_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"model": "small"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("from small")))
            .mount(&server)
            .await;

        let registry = assert_ok!(InvokerRegistry::from_providers(&[provider(
            &server,
            &["small"]
        )]));
        assert_eq!(assert_ok!(registry.invoke("small", "q").await), "from small");
        assert_eq!(
            assert_ok!(registry.invoke("mock/small", "q").await),
            "from small"
        );

        let err = assert_err!(registry.invoke("other", "q").await);
        assert!(matches!(err, InvocationError::UnknownModel(_)));
    }

    #[tokio::test]
    async fn test_slow_backend_hits_fanout_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let invoker = assert_ok!(OpenAICompatibleInvoker::new(&provider(&server, &[])));
        let fanout =
            ModelFanOut::new(FanOutConfig::new().with_timeout(Duration::from_millis(50)));
        let err = assert_err!(
            fanout
                .run(&invoker, "q", &["m1".to_string(), "m2".to_string()])
                .await
        );
        assert!(matches!(err, InvocationError::Timeout { .. }));
    }
}
