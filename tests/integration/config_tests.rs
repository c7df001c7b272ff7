//! Configuration loading and gateway assembly

#[cfg(test)]
mod tests {
    use crate::common::{assert_err, assert_ok};
    use llm_batch_gateway::config::{Config, QueueBackend, StorageBackend};
    use llm_batch_gateway::core::Gateway;
    use llm_batch_gateway::core::batch::Word;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(yaml.as_bytes()).expect("write config");
        file
    }

    #[tokio::test]
    async fn test_example_config_parses() {
        let example = include_str!("../../config/gateway.yaml.example");
        let file = write_config(example);

        let config = assert_ok!(Config::from_file(file.path()).await);
        assert_eq!(config.providers().len(), 2);
        assert_eq!(config.pipeline().retry_delay_secs, 5);
        assert_eq!(config.pipeline().max_attempts, None);
        assert_eq!(config.server().request_timeout_secs, 30);
        assert_eq!(config.queue().claim_idle_ms, 300_000);
    }

    #[tokio::test]
    async fn test_memory_gateway_assembles_and_runs_a_batch() {
        let file = write_config(
            r#"
storage:
  backend: memory
queue:
  backend: memory
pipeline:
  poll_interval_ms: 10
  max_attempts: 4
providers:
  - name: local
    base_url: "http://127.0.0.1:9/v1"
"#,
        );

        let config = assert_ok!(Config::from_file(file.path()).await);
        assert_eq!(config.storage().backend, StorageBackend::Memory);
        assert_eq!(config.queue().backend, QueueBackend::Memory);
        assert_eq!(config.pipeline().max_attempts, Some(4));

        let gateway = assert_ok!(Gateway::new(config).await);
        let batch = assert_ok!(
            gateway
                .orchestrator()
                .create(vec![Word::new("w1", "hi", ["m1"])])
                .await
        );
        assert_eq!(batch.progress.total, 1);
        assert_eq!(gateway.consumer().config().max_attempts, Some(4));
    }

    #[tokio::test]
    async fn test_invalid_pipeline_rejected() {
        let file = write_config(
            r#"
pipeline:
  consumer_concurrency: 0
"#,
        );

        let err = assert_err!(Config::from_file(file.path()).await);
        assert!(err.to_string().contains("concurrency"));
    }
}
