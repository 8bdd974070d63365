//! Zulip destination — REST client over reqwest.

use std::collections::HashSet;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::channels::Destination;
use crate::config::ZulipConfig;
use crate::error::MirrorError;
use crate::pipeline::types::{OutboundMessage, PostOutcome};

/// Client for the Zulip REST API.
pub struct ZulipClient {
    http: reqwest::Client,
    config: ZulipConfig,
}

#[derive(Debug, Deserialize)]
struct StreamIdResponse {
    result: String,
    msg: Option<String>,
    stream_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TopicsResponse {
    result: String,
    msg: Option<String>,
    #[serde(default)]
    topics: Vec<Topic>,
}

#[derive(Debug, Deserialize)]
struct Topic {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    result: String,
    msg: Option<String>,
    code: Option<String>,
}

impl ZulipClient {
    pub fn new(config: ZulipConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{path}", self.config.base_url)
    }

    async fn get_stream_id(&self, stream: &str) -> Result<u64, MirrorError> {
        let response: StreamIdResponse = self
            .http
            .get(self.url("get_stream_id"))
            .basic_auth(&self.config.email, Some(self.config.api_key.expose_secret()))
            .query(&[("stream", stream)])
            .send()
            .await
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;

        if response.result != "success" {
            return Err(MirrorError::Transport(format!(
                "stream lookup failed: {}",
                response.msg.unwrap_or_default()
            )));
        }
        response
            .stream_id
            .ok_or_else(|| MirrorError::Transport("stream lookup returned no id".into()))
    }
}

#[async_trait]
impl Destination for ZulipClient {
    async fn list_topics(&self, channel: &str) -> Result<HashSet<String>, MirrorError> {
        let stream_id = self.get_stream_id(channel).await?;

        let response: TopicsResponse = self
            .http
            .get(self.url(&format!("users/me/{stream_id}/topics")))
            .basic_auth(&self.config.email, Some(self.config.api_key.expose_secret()))
            .send()
            .await
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;

        if response.result != "success" {
            return Err(MirrorError::Transport(format!(
                "topic listing failed: {}",
                response.msg.unwrap_or_default()
            )));
        }

        Ok(response.topics.into_iter().map(|t| t.name).collect())
    }

    async fn post(&self, message: &OutboundMessage) -> Result<PostOutcome, MirrorError> {
        let response: SendResponse = self
            .http
            .post(self.url("messages"))
            .basic_auth(&self.config.email, Some(self.config.api_key.expose_secret()))
            .form(&[
                ("type", "stream"),
                ("to", message.channel.as_str()),
                ("topic", message.topic.as_str()),
                ("content", message.content.as_str()),
            ])
            .send()
            .await
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;

        if response.result == "success" {
            Ok(PostOutcome::Success)
        } else {
            Ok(PostOutcome::Failure {
                code: response.code.unwrap_or_else(|| "UNKNOWN".into()),
                message: response.msg.unwrap_or_default(),
            })
        }
    }
}

fn transport(e: reqwest::Error) -> MirrorError {
    MirrorError::Transport(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_response_failure_parses() {
        let json = r#"{"result":"error","msg":"bad","code":"BAD_REQUEST"}"#;
        let response: SendResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.result, "error");
        assert_eq!(response.code.as_deref(), Some("BAD_REQUEST"));
        assert_eq!(response.msg.as_deref(), Some("bad"));
    }

    #[test]
    fn topics_response_parses() {
        let json = r#"{"result":"success","msg":"","topics":[{"name":"a","max_id":1},{"name":"b","max_id":2}]}"#;
        let response: TopicsResponse = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = response.topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn topics_response_defaults_to_empty() {
        let json = r#"{"result":"error","msg":"denied"}"#;
        let response: TopicsResponse = serde_json::from_str(json).unwrap();
        assert!(response.topics.is_empty());
    }
}
