use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, ClientBuilder, StatusCode, Url};
use std::{fmt::Debug, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::time;
use tracing::debug;

const IMAGE_EXTENSION: &str = "jpg";
const FALLBACK_IMAGE: &str = "none";

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("probe timed out")]
    Timeout,
}

/// Existence check against a URL without downloading the body.
#[async_trait]
pub trait ImageProbe: Send + Sync + Debug {
    async fn probe(&self, url: &Url) -> Result<StatusCode, ProbeError>;
}

#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        Self::from_builder(Client::builder(), timeout)
    }

    /// Redirects are reported as-is; only a direct 200 counts as an image.
    fn from_builder(builder: ClientBuilder, timeout: Duration) -> Result<Self, ProbeError> {
        Ok(Self {
            client: builder.redirect(Policy::none()).build()?,
            timeout,
        })
    }
}

#[async_trait]
impl ImageProbe for HttpProbe {
    async fn probe(&self, url: &Url) -> Result<StatusCode, ProbeError> {
        let request = self.client.head(url.clone()).send();
        match time::timeout(self.timeout, request).await {
            Ok(response) => Ok(response?.status()),
            Err(_) => Err(ProbeError::Timeout),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MapImageResolver {
    base: Url,
    probe: Arc<dyn ImageProbe>,
}

impl MapImageResolver {
    pub fn new(base: Url, probe: Arc<dyn ImageProbe>) -> Self {
        Self { base, probe }
    }

    fn image_url(&self, name: &str) -> Url {
        let mut url = self.base.clone();
        // A base that cannot hold path segments is rejected by BotConfig.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&format!("{}.{}", name, IMAGE_EXTENSION));
        }
        url
    }

    pub fn fallback(&self) -> Url {
        self.image_url(FALLBACK_IMAGE)
    }

    /// URL of the map's image if the host has it, otherwise the fallback.
    pub async fn resolve(&self, map: &str) -> Url {
        let url = self.image_url(map);
        match self.probe.probe(&url).await {
            Ok(StatusCode::OK) => url,
            Ok(status) => {
                debug!("No image for map {} ({})", map, status);
                self.fallback()
            }
            Err(e) => {
                debug!("Image probe for map {} failed: {}", map, e);
                self.fallback()
            }
        }
    }
}
