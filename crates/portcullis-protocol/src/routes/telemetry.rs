//! No-op telemetry sink. Accepts anything, stores nothing.

use super::ServiceRoute;
use crate::error::ProtocolError;
use crate::request::QueryParams;
use crate::response::ProtocolResponse;
use async_trait::async_trait;

pub struct TelemetryRoute;

#[async_trait]
impl ServiceRoute for TelemetryRoute {
    fn name(&self) -> &str {
        "telemetry"
    }

    async fn handle(&self, _query: &QueryParams) -> Result<ProtocolResponse, ProtocolError> {
        Ok(ProtocolResponse::json(200, &serde_json::json!({})))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_empty_json() {
        let query = QueryParams::from_pairs([("event", "boot"), ("ms", "12")]);
        let response = TelemetryRoute.handle(&query).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.into_bytes().await.unwrap(), b"{}");
    }
}
