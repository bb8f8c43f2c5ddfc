//! REST transport over reqwest

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use super::{create_body, update_body, EquipmentTransport};
use crate::{
    config::ApiConfig,
    error::{AppError, AppResult},
    models::{NewEquipment, UpdateEquipment},
};

/// Talks to `GET/POST /equipments` and `GET/PATCH/DELETE /equipments/{id}`
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/equipments", self.base_url)
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/equipments/{}", self.base_url, id)
    }

    /// Map non-success statuses to application errors
    async fn check(response: Response, what: &str) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(AppError::NotFound(what.to_string())),
            _ => Err(AppError::Transport(format!(
                "{} failed with status {}: {}",
                what,
                status.as_u16(),
                body
            ))),
        }
    }
}

#[async_trait]
impl EquipmentTransport for HttpTransport {
    async fn fetch_all(&self) -> AppResult<Value> {
        tracing::debug!(url = %self.collection_url(), "fetching equipment list");
        let response = self.client.get(self.collection_url()).send().await?;
        let response = Self::check(response, "Equipment list").await?;
        Ok(response.json().await?)
    }

    async fn fetch_by_id(&self, id: &str) -> AppResult<Value> {
        let response = self.client.get(self.item_url(id)).send().await?;
        let response = Self::check(response, &format!("Equipment {}", id)).await?;
        Ok(response.json().await?)
    }

    async fn create(&self, data: &NewEquipment) -> AppResult<Value> {
        let body = create_body(data)?;
        let response = self
            .client
            .post(self.collection_url())
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response, "Equipment creation").await?;
        Ok(response.json().await?)
    }

    async fn update(&self, id: &str, changes: &UpdateEquipment) -> AppResult<Value> {
        let body = update_body(changes)?;
        let response = self
            .client
            .patch(self.item_url(id))
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response, &format!("Equipment {}", id)).await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let response = self.client.delete(self.item_url(id)).send().await?;
        Self::check(response, &format!("Equipment {}", id)).await?;
        Ok(())
    }
}
