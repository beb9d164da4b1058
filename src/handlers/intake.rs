use serde::Deserialize;
use std::sync::Arc;

use crate::broadcast::{BroadcastDispatcher, BroadcastReport};
use crate::error::AppError;
use crate::registry::ConnectionRegistry;
use crate::transport::TransportProvider;

/// Body a client sends on the message route.
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Parse a raw frame into a message with a non-empty body.
pub fn parse_inbound(raw_body: &str) -> Result<InboundMessage, AppError> {
    let parsed: InboundMessage = serde_json::from_str(raw_body)
        .map_err(|_| AppError::Validation("invalid message format".to_string()))?;
    if !parsed.message.as_deref().is_some_and(|body| !body.is_empty()) {
        return Err(AppError::Validation("invalid message format".to_string()));
    }
    Ok(parsed)
}

#[derive(Clone)]
pub struct IntakeHandler {
    registry: ConnectionRegistry,
    transports: Arc<dyn TransportProvider>,
    endpoint_override: Option<String>,
}

impl IntakeHandler {
    pub fn new(
        registry: ConnectionRegistry,
        transports: Arc<dyn TransportProvider>,
        endpoint_override: Option<String>,
    ) -> Self {
        Self {
            registry,
            transports,
            endpoint_override,
        }
    }

    /// Where deliveries for a message received on `domain`/`stage` are pushed.
    pub fn delivery_endpoint(&self, domain: &str, stage: &str) -> String {
        match &self.endpoint_override {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{domain}/{stage}"),
        }
    }

    /// Validate `raw_body` and fan its message out to every other connection.
    /// Nothing is sent when validation fails.
    pub async fn on_message(
        &self,
        sender_id: &str,
        domain: &str,
        stage: &str,
        raw_body: &str,
    ) -> Result<BroadcastReport, AppError> {
        if sender_id.is_empty() || domain.is_empty() {
            return Err(AppError::Validation(
                "connection information not found".to_string(),
            ));
        }
        let inbound = parse_inbound(raw_body)?;
        let body = inbound.message.unwrap_or_default();

        let endpoint = self.delivery_endpoint(domain, stage);
        let transport = self.transports.resolve(&endpoint);
        tracing::debug!(
            connection_id = %sender_id,
            action = ?inbound.action,
            endpoint = %endpoint,
            "message received"
        );

        BroadcastDispatcher::new(self.registry.clone(), transport)
            .broadcast(sender_id, &body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::memory_registry;
    use crate::transport::testing::{FixedProvider, ScriptedTransport};

    async fn setup(ids: &[&str], endpoint_override: Option<&str>) -> (IntakeHandler, Arc<FixedProvider>) {
        let registry = memory_registry();
        for id in ids {
            registry.register(id, None).await.unwrap();
        }
        let provider = Arc::new(FixedProvider::new(Arc::new(ScriptedTransport::default())));
        let handler = IntakeHandler::new(
            registry,
            provider.clone(),
            endpoint_override.map(str::to_string),
        );
        (handler, provider)
    }

    #[tokio::test]
    async fn test_empty_message_fails_without_sends() {
        let (handler, provider) = setup(&["A", "B"], None).await;
        let err = handler
            .on_message("A", "example.com", "dev", r#"{"message":""}"#)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(provider.transport.call_count(), 0);
        assert!(provider.endpoints.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_and_missing_bodies_rejected() {
        let (handler, provider) = setup(&["A", "B"], None).await;
        for raw in ["not json", "{}", r#"{"action":"message"}"#, r#"{"message":42}"#] {
            let err = handler.on_message("A", "example.com", "dev", raw).await.unwrap_err();
            assert!(err.is_validation(), "expected validation error for {raw}");
        }
        assert_eq!(provider.transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_message_resolves_endpoint_and_broadcasts() {
        let (handler, provider) = setup(&["A", "B", "C"], None).await;
        let report = handler
            .on_message("A", "abc.example.com", "dev", r#"{"action":"message","message":"hi"}"#)
            .await
            .unwrap();
        assert_eq!(report, BroadcastReport { delivered: 2, failed: 0 });
        assert_eq!(
            provider.endpoints.lock().unwrap().as_slice(),
            ["https://abc.example.com/dev".to_string()]
        );
    }

    #[tokio::test]
    async fn test_endpoint_override_wins() {
        let (handler, provider) = setup(&["A", "B"], Some("http://gateway.internal/prod")).await;
        handler
            .on_message("A", "abc.example.com", "dev", r#"{"message":"hi"}"#)
            .await
            .unwrap();
        assert_eq!(
            provider.endpoints.lock().unwrap().as_slice(),
            ["http://gateway.internal/prod".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_domain_rejected() {
        let (handler, _) = setup(&["A"], None).await;
        let err = handler.on_message("A", "", "dev", r#"{"message":"hi"}"#).await.unwrap_err();
        assert!(err.is_validation());
    }
}
