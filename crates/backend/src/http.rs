//! REST + WebSocket client for a hosted backend-as-a-service.

use std::time::Duration;

use chatline_config::BackendConfig;
use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message as Frame;
use tracing::{debug, warn};

use crate::client::BackendClient;
use crate::error::{BackendError, BackendResult};
use crate::events::ChangeEvent;
use crate::predicate::Predicate;
use crate::response::BackendResponse;
use crate::subscription::{Subscription, SUBSCRIPTION_BUFFER};

/// Client-to-server realtime frames
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RealtimeRequest<'a> {
    Subscribe {
        collection: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        predicate: Option<&'a Predicate>,
    },
}

#[derive(Debug, Clone)]
pub struct HttpBackendClient {
    client: Client,
    base_url: String,
    realtime_url: String,
    api_key: Option<String>,
}

impl HttpBackendClient {
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        reqwest::Url::parse(&config.base_url).map_err(|e| {
            BackendError::Configuration(format!("invalid base_url {}: {}", config.base_url, e))
        })?;
        if !(config.realtime_url.starts_with("ws://") || config.realtime_url.starts_with("wss://")) {
            return Err(BackendError::Configuration(format!(
                "realtime_url must be a ws:// or wss:// url, got {}",
                config.realtime_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| BackendError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            realtime_url: config.realtime_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/data/{}", self.base_url, collection)
    }

    fn bulk_url(&self, collection: &str) -> String {
        format!("{}/data/bulk/{}", self.base_url, collection)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Turn an HTTP response into an envelope without judging the status.
    async fn envelope(response: Response) -> BackendResult<BackendResponse> {
        let status = response.status();
        let body = response.bytes().await?;

        if body.is_empty() {
            return Ok(BackendResponse::new(status.as_u16(), None));
        }

        let data = match serde_json::from_slice::<Value>(&body) {
            Ok(value) => value,
            // error pages are often plain text
            Err(_) if !status.is_success() => {
                Value::String(String::from_utf8_lossy(&body).into_owned())
            }
            Err(error) => return Err(error.into()),
        };

        Ok(BackendResponse::new(status.as_u16(), Some(data)))
    }
}

impl BackendClient for HttpBackendClient {
    async fn insert(&self, collection: &str, record: Value) -> BackendResult<BackendResponse> {
        debug!(collection, "POST record");
        let request = self
            .authorize(self.client.post(self.collection_url(collection)))
            .json(&record);
        Self::envelope(request.send().await?).await
    }

    async fn update_where(
        &self,
        collection: &str,
        predicate: &Predicate,
        patch: Value,
    ) -> BackendResult<BackendResponse> {
        let clause = predicate.to_string();
        debug!(collection, %clause, "PUT bulk update");
        let request = self
            .authorize(self.client.put(self.bulk_url(collection)))
            .query(&[("where", clause.as_str())])
            .json(&patch);
        Self::envelope(request.send().await?).await
    }

    async fn query_where(
        &self,
        collection: &str,
        predicate: &Predicate,
    ) -> BackendResult<BackendResponse> {
        let clause = predicate.to_string();
        debug!(collection, %clause, "GET query");
        let request = self
            .authorize(self.client.get(self.collection_url(collection)))
            .query(&[("where", clause.as_str())]);

        let mut response = Self::envelope(request.send().await?).await?;
        response.data = response.data.take().map(|data| match data {
            Value::Array(rows) => serde_json::json!({ "result": rows }),
            other => other,
        });
        Ok(response)
    }

    async fn subscribe(
        &self,
        collection: &str,
        predicate: Option<Predicate>,
    ) -> BackendResult<Subscription> {
        let mut request = self.realtime_url.as_str().into_client_request()?;
        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| BackendError::Configuration(e.to_string()))?;
            request.headers_mut().insert("Authorization", value);
        }

        let (socket, _) = tokio_tungstenite::connect_async(request).await?;
        let (mut sink, mut stream) = socket.split();

        let frame = serde_json::to_string(&RealtimeRequest::Subscribe {
            collection,
            predicate: predicate.as_ref(),
        })?;
        sink.send(Frame::Text(frame)).await?;
        debug!(collection, "realtime subscription opened");

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let name = collection.to_string();
        let reader = tokio::spawn(async move {
            // the write half stays alive for as long as the connection is read
            let _sink = sink;
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Frame::Text(text)) => match serde_json::from_str::<ChangeEvent>(&text) {
                        Ok(event) => {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(error) => {
                            debug!(collection = %name, %error, "ignoring non-event frame");
                        }
                    },
                    Ok(Frame::Close(_)) => break,
                    Ok(_) => {}
                    Err(error) => {
                        warn!(collection = %name, %error, "realtime connection failed");
                        break;
                    }
                }
            }
            debug!(collection = %name, "realtime reader finished");
        });

        Ok(Subscription::new(collection, predicate, rx).with_reader(reader))
    }
}
