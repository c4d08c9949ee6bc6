use std::env;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nc_core::{Article, Error, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::FeedSource;

pub const DEFAULT_NEWS_API_URL: &str = "https://newsapi.org/v2/top-headlines";

#[derive(Clone)]
pub struct NewsApiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub country: Option<String>,
    pub language: Option<String>,
    pub query: Option<String>,
    pub page_size: u32,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_NEWS_API_URL.to_string(),
            country: Some("us".to_string()),
            language: None,
            query: None,
            page_size: 100,
        }
    }
}

impl NewsApiConfig {
    /// Reads `NEWS_API_KEY`, `NEWS_API_URL`, `NEWS_API_COUNTRY` and `NEWS_API_LANGUAGE`.
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());
        let defaults = Self::default();
        Self {
            api_key: var("NEWS_API_KEY"),
            base_url: var("NEWS_API_URL").unwrap_or(defaults.base_url),
            country: var("NEWS_API_COUNTRY").or(defaults.country),
            language: var("NEWS_API_LANGUAGE"),
            ..defaults
        }
    }

    fn request_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(country) = &self.country {
                query.append_pair("country", country);
            }
            if let Some(language) = &self.language {
                query.append_pair("language", language);
            }
            if let Some(q) = &self.query {
                query.append_pair("q", q);
            }
            query.append_pair("pageSize", &self.page_size.to_string());
        }
        Ok(url)
    }
}

impl fmt::Debug for NewsApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiConfig")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("country", &self.country)
            .field("language", &self.language)
            .field("query", &self.query)
            .field("page_size", &self.page_size)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    published_at: Option<String>,
    url: Option<String>,
    source: Option<NewsApiSourceRef>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSourceRef {
    name: Option<String>,
}

/// Drop the `… [+1234 chars]` marker NewsAPI appends to truncated bodies.
fn clean_content(content: &str) -> &str {
    match content.rfind(" [+") {
        Some(idx) if content.ends_with(" chars]") => content[..idx].trim_end(),
        _ => content.trim(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl NewsApiArticle {
    fn into_article(self) -> Option<Article> {
        let url = non_blank(self.url)?;
        let title = non_blank(self.title).filter(|t| t != "[Removed]")?;
        let description = non_blank(self.description);
        let content = non_blank(self.content)
            .map(|c| clean_content(&c).to_string())
            .or_else(|| description.clone())
            .unwrap_or_default();
        let published_at = self
            .published_at
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let mut article = Article::new(url, title, content, published_at);
        if let Some(name) = self.source.and_then(|s| non_blank(s.name)) {
            article = article.with_source(name);
        }
        if let Some(description) = description {
            article = article.with_summary(description);
        }
        Some(article)
    }
}

/// Top headlines from a NewsAPI-compatible endpoint.
pub struct NewsApiSource {
    client: Arc<Client>,
    config: NewsApiConfig,
}

impl NewsApiSource {
    pub fn new(config: NewsApiConfig) -> Result<Self> {
        if config.api_key.is_none() {
            return Err(Error::Feed("NewsAPI key is required (set NEWS_API_KEY)".to_string()));
        }
        Ok(Self {
            client: Arc::new(Client::new()),
            config,
        })
    }

    pub fn config(&self) -> &NewsApiConfig {
        &self.config
    }
}

#[async_trait]
impl FeedSource for NewsApiSource {
    fn name(&self) -> &str {
        "newsapi"
    }

    async fn fetch_articles(&self) -> Result<Vec<Article>> {
        let url = self.config.request_url()?;
        debug!("Fetching headlines from {}", self.config.base_url);
        let response = self
            .client
            .get(url)
            .header("X-Api-Key", self.config.api_key.as_deref().unwrap_or_default())
            .send()
            .await?
            .json::<NewsApiResponse>()
            .await?;

        if response.status != "ok" {
            return Err(Error::Feed(
                response
                    .message
                    .unwrap_or_else(|| format!("NewsAPI returned status {}", response.status)),
            ));
        }

        let total = response.articles.len();
        let articles: Vec<Article> = response
            .articles
            .into_iter()
            .filter_map(NewsApiArticle::into_article)
            .collect();
        debug!("Kept {} of {} headlines", articles.len(), total);
        Ok(articles)
    }
}
