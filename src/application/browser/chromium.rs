use std::{path::PathBuf, time::Duration, time::Instant};

use async_trait::async_trait;
use chromiumoxide::{
    Page,
    browser::{Browser, BrowserConfig},
    cdp::{
        browser_protocol::page::{CaptureScreenshotFormat, PrintToPdfParams},
        js_protocol::runtime::EvaluateParams,
    },
    handler::viewport::Viewport,
    page::ScreenshotParams,
};
use futures::StreamExt;
use tracing::{info, warn};

use super::{BrowserError, CaptureKind, CaptureOutput, CaptureRequest, PageCapture};

const TARGET: &str = "application::browser::chromium";
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ChromiumSettings {
    pub executable: Option<PathBuf>,
    pub viewport: (u32, u32),
    pub no_sandbox: bool,
    pub launch_timeout: Duration,
}

/// Launches a fresh Chromium per capture and drives it over CDP.
#[derive(Debug, Clone)]
pub struct ChromiumCapture {
    settings: ChromiumSettings,
}

impl ChromiumCapture {
    pub fn new(settings: ChromiumSettings) -> Self {
        Self { settings }
    }

    fn browser_config(&self) -> Result<BrowserConfig, BrowserError> {
        let (width, height) = self.settings.viewport;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .viewport(Viewport {
                width,
                height,
                ..Viewport::default()
            })
            .launch_timeout(self.settings.launch_timeout)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--hide-scrollbars");
        if let Some(path) = &self.settings.executable {
            if !path.exists() {
                return Err(BrowserError::Unavailable(format!(
                    "{} does not exist",
                    path.display()
                )));
            }
            builder = builder.chrome_executable(path);
        }
        if self.settings.no_sandbox {
            builder = builder.no_sandbox();
        }
        // Auto-detection failure is the only error `build` reports.
        builder.build().map_err(BrowserError::Unavailable)
    }
}

#[async_trait]
impl PageCapture for ChromiumCapture {
    async fn capture(&self, request: CaptureRequest) -> Result<CaptureOutput, BrowserError> {
        let started_at = Instant::now();
        let config = self.browser_config()?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| BrowserError::Launch(err.to_string()))?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let budget = PAGE_TIMEOUT + request.wait_for;
        let outcome = tokio::time::timeout(budget, visit(&browser, &request))
            .await
            .unwrap_or_else(|_| Err(BrowserError::Timeout(budget)));

        if let Err(err) = browser.close().await {
            warn!(
                target = TARGET,
                op = "chromium::close",
                result = "error",
                error = %err,
                "Failed to close browser cleanly"
            );
        }
        let _ = browser.wait().await;
        handler_task.abort();

        match &outcome {
            Ok(output) => info!(
                target = TARGET,
                op = "chromium::capture",
                result = "captured",
                kind = request.kind.as_str(),
                url = %request.url,
                scripted = request.js_code.is_some(),
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                output_bytes = output.bytes.len(),
                "Page captured"
            ),
            Err(err) => warn!(
                target = TARGET,
                op = "chromium::capture",
                result = "error",
                kind = request.kind.as_str(),
                url = %request.url,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                error = %err,
                "Page capture failed"
            ),
        }
        outcome
    }
}

async fn visit(browser: &Browser, request: &CaptureRequest) -> Result<CaptureOutput, BrowserError> {
    let page = browser
        .new_page(request.url.as_str())
        .await
        .map_err(|err| BrowserError::Navigation(err.to_string()))?;
    page.wait_for_navigation()
        .await
        .map_err(|err| BrowserError::Navigation(err.to_string()))?;

    if let Some(js_code) = &request.js_code {
        run_script(&page, js_code).await?;
    }
    if !request.wait_for.is_zero() {
        tokio::time::sleep(request.wait_for).await;
    }

    let bytes = match request.kind {
        CaptureKind::Screenshot => page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await
            .map_err(|err| BrowserError::Capture(err.to_string()))?,
        CaptureKind::Pdf => page
            .pdf(PrintToPdfParams {
                print_background: Some(true),
                ..PrintToPdfParams::default()
            })
            .await
            .map_err(|err| BrowserError::Capture(err.to_string()))?,
        CaptureKind::Html => page
            .content()
            .await
            .map(String::into_bytes)
            .map_err(|err| BrowserError::Capture(err.to_string()))?,
    };
    Ok(CaptureOutput {
        bytes,
        kind: request.kind,
    })
}

async fn run_script(page: &Page, js_code: &str) -> Result<(), BrowserError> {
    let params = EvaluateParams::builder()
        .expression(js_code)
        .await_promise(true)
        .build()
        .map_err(BrowserError::Script)?;
    page.evaluate_expression(params)
        .await
        .map_err(|err| BrowserError::Script(err.to_string()))?;
    Ok(())
}
