//! Asynchronous loading of external scripts.
//!
//! The loader performs no privacy check of its own; callers gate before
//! requesting a load.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::ScriptLoadError;

/// CORS mode of a script request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossOrigin {
    /// Cross-origin request without credentials
    Anonymous,
    /// Cross-origin request with credentials
    UseCredentials,
}

/// A script-loading directive inserted into the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptElement {
    pub src: String,
    pub cross_origin: CrossOrigin,
    pub is_async: bool,
}

impl ScriptElement {
    /// Directive for an async, credential-less cross-origin load.
    pub fn anonymous(src: &str) -> Self {
        Self {
            src: src.to_string(),
            cross_origin: CrossOrigin::Anonymous,
            is_async: true,
        }
    }
}

/// The host's script-loading mechanism.
///
/// Resolves once the script has either loaded or failed. Timeouts are
/// whatever the host's native error event reports.
#[async_trait]
pub trait ScriptFetcher: Send + Sync {
    async fn fetch(&self, script: &ScriptElement) -> Result<(), ScriptLoadError>;
}

/// Loads scripts on the captured runtime and reports each result once.
#[derive(Clone)]
pub struct ScriptLoader {
    fetcher: Arc<dyn ScriptFetcher>,
    runtime: Handle,
}

impl ScriptLoader {
    /// Create a loader that spawns its loads on `runtime`.
    pub fn new(fetcher: Arc<dyn ScriptFetcher>, runtime: Handle) -> Self {
        Self { fetcher, runtime }
    }

    /// Load `url` and await the outcome.
    pub async fn fetch(&self, url: &str) -> Result<(), ScriptLoadError> {
        let script = ScriptElement::anonymous(url);
        tracing::debug!(url, "requesting script");
        let result = self.fetcher.fetch(&script).await;
        match &result {
            Ok(()) => tracing::debug!(url, "script loaded"),
            Err(e) => tracing::debug!(url, error = %e, "script failed to load"),
        }
        result
    }

    /// Start loading `url` in the background.
    ///
    /// `on_complete` runs exactly once on the runtime with the load result.
    /// When `None`, the result is discarded. A load cannot be cancelled once
    /// requested; dropping the returned handle detaches it.
    pub fn load<F>(&self, url: &str, on_complete: Option<F>) -> JoinHandle<()>
    where
        F: FnOnce(Result<(), ScriptLoadError>) + Send + 'static,
    {
        let loader = self.clone();
        let url = url.to_string();
        self.runtime.spawn(async move {
            let result = loader.fetch(&url).await;
            if let Some(callback) = on_complete {
                callback(result);
            }
        })
    }
}

impl fmt::Debug for ScriptLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptLoader").finish_non_exhaustive()
    }
}
