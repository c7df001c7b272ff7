//! HTTP surface over a SeaORM store and a live consumer

#[cfg(test)]
mod tests {
    use crate::common::fixtures::{ndjson, words};
    use crate::common::{ScriptedInvoker, TestDatabase};
    use actix_web::{http::StatusCode, test, web};
    use llm_batch_gateway::config::Config;
    use llm_batch_gateway::core::Gateway;
    use llm_batch_gateway::core::queue::{MemoryQueue, QueueHandles};
    use llm_batch_gateway::server::server::HttpServer;
    use llm_batch_gateway::storage::BatchStore;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;

    async fn gateway(invoker: ScriptedInvoker) -> (Gateway, Arc<ScriptedInvoker>) {
        let db = TestDatabase::new().await;
        let queue = Arc::new(MemoryQueue::with_poll_interval(Duration::from_millis(10)));
        let invoker = Arc::new(invoker);
        let gateway = Gateway::from_parts(
            Config::default(),
            db.store_arc(),
            QueueHandles {
                queue: queue.clone(),
                receiver: queue,
            },
            invoker.clone(),
        );
        (gateway, invoker)
    }

    #[actix_web::test]
    async fn test_submit_then_poll_until_complete() {
        let (gateway, _) = gateway(ScriptedInvoker::new()).await;
        let app =
            test::init_service(HttpServer::create_app(web::Data::new(gateway.app_state()))).await;

        let (shutdown, rx) = watch::channel(false);
        let handle = gateway
            .consumer()
            .clone()
            .spawn(gateway.queues().receiver.clone(), rx);

        let req = test::TestRequest::post()
            .uri("/v1/batches")
            .set_payload(ndjson(&words(3)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let json: Value = test::read_body_json(resp).await;
        let batch_id = json["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(json["data"]["status"], "queued");

        let mut snapshot = Value::Null;
        for _ in 0..200 {
            let req = test::TestRequest::get()
                .uri(&format!("/v1/batches/{}", batch_id))
                .to_request();
            snapshot = test::call_and_read_body_json(&app, req).await;
            if snapshot["data"]["status"] == "complete" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let data = &snapshot["data"];
        assert_eq!(data["status"], "complete");
        assert_eq!(data["progress"]["completed"], 3);
        assert_eq!(data["output"][0]["id"], "w1");
        assert_eq!(data["output"][2]["results"][1]["result"], "m2:p3");

        shutdown.send(true).unwrap();
        handle.await.unwrap();
    }

    #[actix_web::test]
    async fn test_unknown_batch_is_404_with_error_body() {
        let (gateway, _) = gateway(ScriptedInvoker::new()).await;
        let app =
            test::init_service(HttpServer::create_app(web::Data::new(gateway.app_state()))).await;

        let req = test::TestRequest::get()
            .uri("/v1/batches/batch_nope")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let json: Value = test::read_body_json(resp).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[actix_web::test]
    async fn test_chat_does_not_persist() {
        let (gateway, invoker) = gateway(ScriptedInvoker::failing(&["bad"])).await;
        let app =
            test::init_service(HttpServer::create_app(web::Data::new(gateway.app_state()))).await;

        let req = test::TestRequest::post()
            .uri("/v1/chat")
            .set_json(serde_json::json!({"prompt": "good", "models": ["m1", "m2"]}))
            .to_request();
        let json: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(json["data"][1]["result"], "m2:good");
        assert_eq!(invoker.calls(), 2);

        let req = test::TestRequest::post()
            .uri("/v1/chat")
            .set_json(serde_json::json!({"prompt": "bad", "models": ["m1"]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        assert!(
            gateway
                .store()
                .pending_orchestrations()
                .await
                .unwrap()
                .is_empty()
        );
    }
}
