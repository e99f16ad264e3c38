use crate::{Error, Result};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

#[derive(Deserialize)]
struct FeatureCollection {
    features: Option<Vec<Value>>,
}

/// Raw upstream reply, passed to clients as is
pub struct Forwarded {
    pub status: u16,
    pub body: Vec<u8>,
}

pub struct Upstream {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

impl Upstream {
    pub fn new(base_url: &str, token: &str) -> Result<Upstream> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            Err(Error::Config(format!(
                "Upstream URL can't have path segments: {base_url}"
            )))?
        }
        Ok(Upstream {
            client: reqwest::Client::new(),
            base_url,
            token: token.to_owned(),
        })
    }

    /// Appends percent-encoded path segments to the base URL. A segment
    /// can't introduce extra path levels, `/` inside it becomes `%2F`.
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response> {
        debug!(%url, "Querying upstream");
        let res = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(res)
    }

    pub async fn forward(&self, segments: &[&str]) -> Result<Forwarded> {
        let res = self.get(self.url(segments)).await?;
        let status = res.status().as_u16();
        let body = res.bytes().await?.to_vec();
        Ok(Forwarded { status, body })
    }

    /// Fetches a GeoJSON feature collection and returns its features
    /// untouched. A collection without `features` yields nothing.
    pub async fn get_feature_collection(&self, url: Url) -> Result<Vec<Value>> {
        let res = self.get(url).await?;
        let status = res.status();
        if !status.is_success() {
            Err(Error::Upstream(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
            )))?
        }
        let collection: FeatureCollection = res.json().await?;
        Ok(collection.features.unwrap_or_default())
    }
}
