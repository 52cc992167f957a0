use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::EntryBackend;
use crate::models::entry::{Entry, EntryDraft, EntryId, EntryPatch};
use crate::models::settings::BackendConfig;

const PAGE_SIZE: u32 = 200;

/// Client for a records-collection REST API
/// (`/api/collections/{collection}/records`).
pub struct RestBackend {
    client: Client,
    base_url: String,
    collection: String,
    auth_header: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordPage {
    items: Vec<Entry>,
    page: u32,
    total_pages: u32,
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base_url = config
            .rest_url
            .as_deref()
            .context("REST backend URL not configured")?
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .context("Failed to build REST HTTP client")?;

        Ok(Self {
            client,
            base_url,
            collection: config.collection.clone(),
            auth_header: config.api_token.as_ref().map(|token| format!("Bearer {}", token)),
        })
    }

    fn records_url(&self) -> String {
        format!(
            "{}/api/collections/{}/records",
            self.base_url,
            urlencoding::encode(&self.collection)
        )
    }

    fn record_url(&self, id: &EntryId) -> String {
        format!("{}/{}", self.records_url(), urlencoding::encode(id.as_str()))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        match &self.auth_header {
            Some(auth) => builder.header(header::AUTHORIZATION, auth),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API request failed: {} - {}", status, body);
        }

        let result = response.json::<T>().await?;
        Ok(result)
    }

    async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let builder = self
            .request(method, url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(body);
        self.send(builder).await
    }
}

/// Filter expression selecting records that intersect `[start, end)`.
pub(crate) fn range_filter(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "(start < \"{}\" && end > \"{}\")",
        end.to_rfc3339_opts(SecondsFormat::Millis, true),
        start.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

impl EntryBackend for RestBackend {
    async fn get_entries(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Entry>> {
        let filter = urlencoding::encode(&range_filter(start, end)).into_owned();
        let mut entries = Vec::new();
        let mut page = 1;
        loop {
            let url = format!(
                "{}?filter={}&sort=start&perPage={}&page={}",
                self.records_url(),
                filter,
                PAGE_SIZE,
                page
            );
            let result: RecordPage = self
                .send(self.request(Method::GET, &url))
                .await
                .with_context(|| format!("Failed to list entries (page {})", page))?;
            entries.extend(result.items);
            if result.page >= result.total_pages {
                break;
            }
            page = result.page + 1;
        }
        log::debug!("Fetched {} entries between {} and {}", entries.len(), start, end);
        Ok(entries)
    }

    async fn get_entry(&self, id: &EntryId) -> Result<Option<Entry>> {
        let response = self
            .request(Method::GET, &self.record_url(id))
            .send()
            .await
            .with_context(|| format!("Failed to fetch entry {}", id))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API request failed: {} - {}", status, body);
        }
        Ok(Some(response.json::<Entry>().await?))
    }

    async fn create_entry(&self, draft: EntryDraft) -> Result<Entry> {
        self.send_json(Method::POST, &self.records_url(), &draft)
            .await
            .context("Failed to create entry")
    }

    async fn update_entry(&self, id: &EntryId, patch: &EntryPatch) -> Result<Entry> {
        self.send_json(Method::PATCH, &self.record_url(id), patch)
            .await
            .with_context(|| format!("Failed to update entry {}", id))
    }

    async fn delete_entry(&self, id: &EntryId) -> Result<()> {
        let response = self
            .request(Method::DELETE, &self.record_url(id))
            .send()
            .await
            .with_context(|| format!("Failed to delete entry {}", id))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API request failed: {} - {}", status, body);
        }
        Ok(())
    }
}
