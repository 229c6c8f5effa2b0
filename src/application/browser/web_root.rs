//! Screenshot flows against the pages under the static web root.

use std::{sync::Arc, time::Duration};

use serde_json::Value;
use url::Url;

use super::{BrowserError, CaptureKind, CaptureOutput, CaptureRequest, PageCapture};

pub const DEFAULT_TARGET_PAGE: &str = "examples/hello-world.html";
pub const MERMAID_PAGE: &str = "mermaid/index.html";
pub const CYTOSCAPE_PAGE: &str = "cytoscape/index.html";
pub const CYTOSCAPE_WAIT: Duration = Duration::from_millis(500);

pub const DEMO_JS: &str = "document.body.style.backgroundColor = 'black';\n\
document.body.style.color = 'white';\n\
document.body.innerHTML = '<h1>Dynamic JS</h1>';";

pub const SAMPLE_MERMAID: &str = "graph TD\n    A[Start] --> B{Is it working?}\n    B -->|Yes| C[Great]\n    B -->|No| D[Debug]\n    D --> B";

#[derive(Debug, Clone)]
pub struct WebRootSettings {
    pub target_server: Url,
    pub mermaid_wait: Duration,
}

#[derive(Clone)]
pub struct WebRootRender {
    capture: Arc<dyn PageCapture>,
    target_server: Url,
    mermaid_wait: Duration,
}

impl WebRootRender {
    pub fn new(capture: Arc<dyn PageCapture>, settings: WebRootSettings) -> Self {
        let mut target_server = settings.target_server;
        if !target_server.path().ends_with('/') {
            let path = format!("{}/", target_server.path());
            target_server.set_path(&path);
        }
        Self {
            capture,
            target_server,
            mermaid_wait: settings.mermaid_wait,
        }
    }

    pub fn target_server(&self) -> &Url {
        &self.target_server
    }

    /// Resolves a page path against the target server. Paths that could
    /// escape the web root are rejected.
    pub fn target_url(&self, page: &str) -> Result<Url, BrowserError> {
        let invalid = || BrowserError::InvalidTarget(page.to_string());
        let has_scheme = page
            .split('/')
            .next()
            .is_some_and(|segment| segment.contains(':'));
        if page.contains("..")
            || page.contains('\\')
            || page.starts_with("//")
            || has_scheme
        {
            return Err(invalid());
        }
        let url = self
            .target_server
            .join(page.trim_start_matches('/'))
            .map_err(|_| invalid())?;
        if !url.as_str().starts_with(self.target_server.as_str()) {
            return Err(invalid());
        }
        Ok(url)
    }

    pub async fn render_page(
        &self,
        url: Url,
        js_code: Option<String>,
        wait_for: Duration,
    ) -> Result<CaptureOutput, BrowserError> {
        self.capture
            .capture(CaptureRequest {
                url: url.into(),
                js_code,
                wait_for,
                kind: CaptureKind::Screenshot,
            })
            .await
    }

    pub async fn render_file(&self, page: &str) -> Result<CaptureOutput, BrowserError> {
        let url = self.target_url(page)?;
        self.render_page(url, None, Duration::ZERO).await
    }

    pub async fn render_js(
        &self,
        page: &str,
        js_code: &str,
    ) -> Result<CaptureOutput, BrowserError> {
        let url = self.target_url(page)?;
        self.render_page(url, Some(js_code.to_string()), Duration::ZERO)
            .await
    }

    pub async fn render_mermaid(&self, mermaid_code: &str) -> Result<CaptureOutput, BrowserError> {
        let url = self.target_url(MERMAID_PAGE)?;
        self.render_page(url, Some(mermaid_script(mermaid_code)), self.mermaid_wait)
            .await
    }

    pub async fn render_cytoscape(&self, data: &Value) -> Result<CaptureOutput, BrowserError> {
        let url = self.target_url(CYTOSCAPE_PAGE)?;
        self.render_page(url, Some(format!("updateGraph({data});")), CYTOSCAPE_WAIT)
            .await
    }

    pub async fn render_pdf(&self, page: &str) -> Result<CaptureOutput, BrowserError> {
        self.capture_page(page, CaptureKind::Pdf).await
    }

    /// Page HTML after scripts have run.
    pub async fn render_html(&self, page: &str) -> Result<CaptureOutput, BrowserError> {
        self.capture_page(page, CaptureKind::Html).await
    }

    async fn capture_page(
        &self,
        page: &str,
        kind: CaptureKind,
    ) -> Result<CaptureOutput, BrowserError> {
        let url = self.target_url(page)?;
        self.capture
            .capture(CaptureRequest {
                url: url.into(),
                js_code: None,
                wait_for: Duration::ZERO,
                kind,
            })
            .await
    }
}

/// The diagram source travels as a JSON string literal.
fn mermaid_script(mermaid_code: &str) -> String {
    let literal = Value::String(mermaid_code.to_string()).to_string();
    format!(
        "const target = document.querySelector('.mermaid');\n\
         target.textContent = {literal};\n\
         target.removeAttribute('data-processed');\n\
         mermaid.init(undefined, '.mermaid');"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCapture {
        requests: Mutex<Vec<CaptureRequest>>,
    }

    #[async_trait]
    impl PageCapture for RecordingCapture {
        async fn capture(&self, request: CaptureRequest) -> Result<CaptureOutput, BrowserError> {
            let kind = request.kind;
            self.requests.lock().expect("lock").push(request);
            Ok(CaptureOutput {
                bytes: b"captured".to_vec(),
                kind,
            })
        }
    }

    fn render(server: &str) -> (WebRootRender, Arc<RecordingCapture>) {
        let capture = Arc::new(RecordingCapture::default());
        let render = WebRootRender::new(
            capture.clone(),
            WebRootSettings {
                target_server: Url::parse(server).expect("url"),
                mermaid_wait: Duration::from_millis(1000),
            },
        );
        (render, capture)
    }

    #[test]
    fn target_url_joins_without_duplicate_slashes() {
        for server in ["http://localhost:8080/static", "http://localhost:8080/static/"] {
            let (render, _) = render(server);
            for page in ["examples/hello-world.html", "/examples/hello-world.html"] {
                assert_eq!(
                    render.target_url(page).expect("url").as_str(),
                    "http://localhost:8080/static/examples/hello-world.html"
                );
            }
        }
    }

    #[test]
    fn target_url_rejects_escapes() {
        let (render, _) = render("http://localhost:8080/static");
        for page in [
            "../secret",
            "examples/../../x",
            "http://evil.example/",
            "//evil.example/x",
            "javascript:alert(1)",
            "examples\\x.html",
        ] {
            assert!(
                matches!(render.target_url(page), Err(BrowserError::InvalidTarget(_))),
                "{page} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn mermaid_flow_injects_escaped_source() {
        let (render, capture) = render("http://localhost:8080/static");
        render
            .render_mermaid("graph TD\n  A['x'] --> B")
            .await
            .expect("captured");

        let requests = capture.requests.lock().expect("lock");
        let request = &requests[0];
        assert_eq!(request.url, "http://localhost:8080/static/mermaid/index.html");
        assert_eq!(request.wait_for, Duration::from_millis(1000));
        let script = request.js_code.as_deref().expect("script");
        assert!(script.contains(r#"target.textContent = "graph TD\n  A['x'] --> B";"#));
        assert!(script.contains("mermaid.init(undefined, '.mermaid')"));
    }

    #[tokio::test]
    async fn cytoscape_flow_calls_update_graph() {
        let (render, capture) = render("http://localhost:8080/static");
        let data = serde_json::json!({"nodes": [{"data": {"id": "a"}}]});
        render.render_cytoscape(&data).await.expect("captured");

        let requests = capture.requests.lock().expect("lock");
        assert_eq!(
            requests[0].js_code.as_deref(),
            Some(r#"updateGraph({"nodes":[{"data":{"id":"a"}}]});"#)
        );
        assert_eq!(requests[0].wait_for, CYTOSCAPE_WAIT);
    }

    #[tokio::test]
    async fn pdf_flow_requests_pdf_capture() {
        let (render, capture) = render("http://localhost:8080/static");
        let output = render.render_pdf(DEFAULT_TARGET_PAGE).await.expect("pdf");
        assert_eq!(output.kind, CaptureKind::Pdf);
        assert_eq!(capture.requests.lock().expect("lock")[0].kind, CaptureKind::Pdf);
    }

    #[tokio::test]
    async fn html_flow_requests_page_content() {
        let (render, capture) = render("http://localhost:8080/static");
        let output = render.render_html("examples/markdown.html").await.expect("html");
        assert_eq!(output.kind, CaptureKind::Html);

        let requests = capture.requests.lock().expect("lock");
        assert_eq!(requests[0].kind, CaptureKind::Html);
        assert_eq!(
            requests[0].url,
            "http://localhost:8080/static/examples/markdown.html"
        );
        assert_eq!(requests[0].js_code, None);
    }

    #[tokio::test]
    async fn html_flow_rejects_escaping_pages() {
        let (render, capture) = render("http://localhost:8080/static");
        let err = render.render_html("../etc/passwd").await.expect_err("rejected");
        assert!(matches!(err, BrowserError::InvalidTarget(_)));
        assert!(capture.requests.lock().expect("lock").is_empty());
    }
}
