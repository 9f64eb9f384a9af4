use reqwest::{Client, Method};
use serde_json::{Value, json};

use crate::error::{Result, SermonError};

/// Headless page rendering, narrowed to what scroll discovery needs.
pub trait Renderer {
    async fn open(&mut self, url: &str) -> Result<()>;
    async fn evaluate(&mut self, script: &str) -> Result<Value>;
    async fn current_html(&mut self) -> Result<String>;
    async fn close(&mut self) -> Result<()>;
}

/// Renderer backed by a W3C WebDriver endpoint such as chromedriver.
pub struct WebDriverRenderer {
    client: Client,
    endpoint: String,
    session_id: Option<String>,
}

impl WebDriverRenderer {
    pub fn new(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            session_id: None,
        }
    }

    fn capabilities() -> Value {
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": ["--headless=new", "--disable-gpu", "--no-sandbox"]
                    }
                }
            }
        })
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}/{}", self.endpoint, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SermonError::transport(&url, e))?;
        let status = response.status();
        let payload = response
            .json::<Value>()
            .await
            .map_err(|e| SermonError::transport(&url, e))?;

        if !status.is_success() {
            let message = payload["value"]["message"]
                .as_str()
                .or_else(|| payload["value"]["error"].as_str())
                .unwrap_or("unknown WebDriver error");
            return Err(SermonError::Renderer {
                reason: format!("WebDriver {} -> HTTP {}: {}", path, status.as_u16(), message),
            });
        }

        Ok(payload["value"].clone())
    }

    async fn session(&mut self) -> Result<String> {
        if let Some(id) = &self.session_id {
            return Ok(id.clone());
        }

        let value = self
            .command(Method::POST, "session", Some(Self::capabilities()))
            .await?;
        let id = value["sessionId"]
            .as_str()
            .ok_or_else(|| SermonError::Renderer {
                reason: format!("Invalid new session response: {:?}", value),
            })?
            .to_string();

        tracing::debug!(session_id = %id, "webdriver session created");
        self.session_id = Some(id.clone());
        Ok(id)
    }

    fn current_session(&self) -> Result<&str> {
        self.session_id.as_deref().ok_or_else(|| SermonError::Renderer {
            reason: "no page is open".to_string(),
        })
    }
}

impl Renderer for WebDriverRenderer {
    async fn open(&mut self, url: &str) -> Result<()> {
        let id = self.session().await?;
        self.command(
            Method::POST,
            &format!("session/{}/url", id),
            Some(json!({ "url": url })),
        )
        .await?;
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value> {
        let id = self.current_session()?.to_string();
        self.command(
            Method::POST,
            &format!("session/{}/execute/sync", id),
            Some(json!({ "script": script, "args": [] })),
        )
        .await
    }

    async fn current_html(&mut self) -> Result<String> {
        let id = self.current_session()?.to_string();
        let value = self
            .command(Method::GET, &format!("session/{}/source", id), None)
            .await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SermonError::Renderer {
                reason: "page source is not a string".to_string(),
            })
    }

    async fn close(&mut self) -> Result<()> {
        let Some(id) = self.session_id.take() else {
            return Ok(());
        };
        self.command(Method::DELETE, &format!("session/{}", id), None)
            .await?;
        tracing::debug!(session_id = %id, "webdriver session closed");
        Ok(())
    }
}
