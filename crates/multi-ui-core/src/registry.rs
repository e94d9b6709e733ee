//! Component fetching from the remote registry
//!
//! Components live in a fixed GitHub repository served as raw files. The URL
//! for a component is fully determined by its name: `Dropdown_5` resolves to
//! `<base>/dropdown/_components/Dropdown_5.tsx`. One GET per `add`, no
//! retries, no caching; timeouts and redirects are the HTTP client defaults.

use thiserror::Error;
use url::Url;

/// Default base URL of the component registry
pub const DEFAULT_REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/multi-ui/multi-ui/main/src/app/components";

/// Environment variable overriding the registry base URL
pub const REGISTRY_URL_ENV: &str = "MULTI_UI_REGISTRY_URL";

/// Errors fetching a component, classified so the CLI can report a missing
/// component differently from a transport problem
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("component '{component}' was not found in the registry (tried {url})")]
    NotFound { component: String, url: Url },

    #[error("failed to fetch component '{component}': {message}")]
    Request { component: String, message: String },

    #[error("registry URL cannot hold path segments: {url}")]
    InvalidBaseUrl { url: Url },
}

/// Retrieves raw component source from the registry
pub struct ComponentFetcher {
    base_url: Url,
    client: reqwest::Client,
}

impl ComponentFetcher {
    /// Create a fetcher with a custom user agent
    pub fn new(base_url: Url, user_agent: &str) -> Self {
        Self {
            base_url,
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Create a fetcher from the default registry URL, honoring the
    /// `MULTI_UI_REGISTRY_URL` override
    pub fn from_env(user_agent: &str) -> anyhow::Result<Self> {
        let url_str = std::env::var(REGISTRY_URL_ENV)
            .unwrap_or_else(|_| DEFAULT_REGISTRY_URL.to_string());
        let base_url = Url::parse(&url_str)
            .map_err(|e| anyhow::anyhow!("Invalid registry URL '{}': {}", url_str, e))?;
        Ok(Self::new(base_url, user_agent))
    }

    /// Base directory of a component: the lowercased identifier up to the
    /// first underscore (`Dropdown_5` -> `dropdown`)
    fn base_name(component: &str) -> String {
        let lower = component.to_ascii_lowercase();
        match lower.split_once('_') {
            Some((head, _)) => head.to_string(),
            None => lower,
        }
    }

    /// Build the raw-file URL for a component
    pub fn component_url(&self, component: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidBaseUrl {
                url: self.base_url.clone(),
            })?
            .pop_if_empty()
            .push(&Self::base_name(component))
            .push("_components")
            .push(&format!("{component}.tsx"));
        Ok(url)
    }

    /// Fetch a component's source text. 404 is classified as "not found";
    /// any other failure is a generic fetch error.
    pub async fn fetch(&self, component: &str) -> Result<String, FetchError> {
        let url = self.component_url(component)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Request {
                component: component.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                component: component.to_string(),
                url,
            });
        }
        if !status.is_success() {
            return Err(FetchError::Request {
                component: component.to_string(),
                message: format!("HTTP {status} from {url}"),
            });
        }

        response.text().await.map_err(|e| FetchError::Request {
            component: component.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher_for(base: &str) -> ComponentFetcher {
        ComponentFetcher::new(Url::parse(base).unwrap(), "multi-ui-test")
    }

    #[test]
    fn test_component_url_derivation() {
        let fetcher = fetcher_for("https://example.com/registry/main/components");
        let url = fetcher.component_url("Dropdown_5").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/registry/main/components/dropdown/_components/Dropdown_5.tsx"
        );
    }

    #[test]
    fn test_component_url_without_underscore() {
        let fetcher = fetcher_for("https://example.com/components");
        let url = fetcher.component_url("Accordion").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/components/accordion/_components/Accordion.tsx"
        );
    }

    #[tokio::test]
    async fn test_fetch_returns_body_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let body = "export default function Button(){}";
        let mock = server
            .mock("GET", "/button/_components/Button_1.tsx")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let fetcher = fetcher_for(&server.url());
        let source = fetcher.fetch("Button_1").await.unwrap();
        assert_eq!(source, body);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_404_names_component_and_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing/_components/Missing_1.tsx")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = fetcher_for(&server.url());
        let err = fetcher.fetch("Missing_1").await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));
        let message = err.to_string();
        assert!(message.contains("Missing_1"));
        assert!(message.contains("/missing/_components/Missing_1.tsx"));
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_generic() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/button/_components/Button_1.tsx")
            .with_status(500)
            .create_async()
            .await;

        let fetcher = fetcher_for(&server.url());
        let err = fetcher.fetch("Button_1").await.unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }));
        assert!(err.to_string().contains("500"));
    }
}
