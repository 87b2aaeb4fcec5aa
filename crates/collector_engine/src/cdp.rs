use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use collector_logging::{ctx_debug, ContextLabel};
use headless_chrome::{Browser, LaunchOptions, Tab};
use tokio::sync::broadcast;

use crate::runtime::TargetRuntime;
use crate::scroll::PageDriver;
use crate::types::{CollectError, TargetEvent, TargetId};

const SCROLL_JS: &str = "window.scrollBy(0, window.innerHeight); true";

// Expand actions already fired are marked on the element itself, so every
// re-scan stays idempotent no matter how often the page re-renders around it.
const EXPAND_JS: &str = r#"
(() => {
  const selectors = [
    'button.see-more:not([data-expanded="true"])',
    'button[aria-label*="see more"]:not([data-expanded="true"])',
    'button[aria-label*="Show more"]:not([data-expanded="true"])',
  ];
  let fired = 0;
  for (const selector of selectors) {
    for (const button of document.querySelectorAll(selector)) {
      button.click();
      button.setAttribute('data-expanded', 'true');
      fired += 1;
    }
  }
  return fired;
})()
"#;

/// Target runtime over a locally launched DevTools browser.
///
/// Handles are plain counters owned by this runtime; the tab registry maps
/// them onto DevTools tabs for as long as each target lives.
pub struct CdpRuntime {
    browser: Arc<Browser>,
    tabs: Mutex<HashMap<TargetId, Arc<Tab>>>,
    next_id: AtomicU64,
    events: broadcast::Sender<TargetEvent>,
}

impl CdpRuntime {
    /// Launches a headless browser and an empty target registry.
    pub fn launch() -> Result<Self, CollectError> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .build()
            .map_err(|err| CollectError::TargetUnavailable(err.to_string()))?;
        let browser = Browser::new(options)
            .map_err(|err| CollectError::TargetUnavailable(err.to_string()))?;
        let (events, _) = broadcast::channel(32);
        Ok(Self {
            browser: Arc::new(browser),
            tabs: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            events,
        })
    }

    /// Closes a target and tells subscribers it is gone.
    pub async fn close_target(&self, target: TargetId) {
        let Some(tab) = self.tab(target) else {
            return;
        };
        let _ = blocking(move || {
            tab.close(false)
                .map_err(|err| CollectError::TargetUnavailable(err.to_string()))
        })
        .await;
        self.mark_removed(target);
    }

    /// Drops a target from the registry and broadcasts its removal. Also the
    /// healing path when a liveness probe finds a tab dead.
    pub fn mark_removed(&self, target: TargetId) {
        let existed = self
            .tabs
            .lock()
            .expect("lock tab registry")
            .remove(&target)
            .is_some();
        if existed {
            ctx_debug!("target {} removed from registry", target);
            let _ = self.events.send(TargetEvent::Removed { target });
        }
    }

    fn tab(&self, target: TargetId) -> Option<Arc<Tab>> {
        self.tabs.lock().expect("lock tab registry").get(&target).cloned()
    }
}

#[async_trait]
impl TargetRuntime for CdpRuntime {
    async fn open_target(&self, url: &str) -> Result<TargetId, CollectError> {
        let url = url::Url::parse(url)
            .map_err(|err| CollectError::TargetUnavailable(format!("invalid url: {err}")))?
            .to_string();
        let browser = Arc::clone(&self.browser);
        let tab = blocking(move || {
            let tab = browser
                .new_tab()
                .map_err(|err| CollectError::TargetUnavailable(err.to_string()))?;
            tab.navigate_to(&url)
                .map_err(|err| CollectError::TargetUnavailable(err.to_string()))?;
            tab.wait_until_navigated()
                .map_err(|err| CollectError::TargetUnavailable(err.to_string()))?;
            Ok(tab)
        })
        .await?;

        let target = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = tab.get_url();
        self.tabs
            .lock()
            .expect("lock tab registry")
            .insert(target, tab);
        let _ = self.events.send(TargetEvent::Ready {
            target,
            url: url.clone(),
        });
        ctx_debug!("opened target {} at {}", target, url);
        Ok(target)
    }

    async fn target_exists(&self, target: TargetId) -> bool {
        let Some(tab) = self.tab(target) else {
            return false;
        };
        let alive = blocking(move || {
            tab.evaluate("true", false)
                .map(|_| ())
                .map_err(|err| CollectError::TargetUnavailable(err.to_string()))
        })
        .await
        .is_ok();
        if !alive {
            self.mark_removed(target);
        }
        alive
    }

    async fn target_url(&self, target: TargetId) -> Option<String> {
        self.tab(target).map(|tab| tab.get_url())
    }

    fn driver(&self, target: TargetId) -> Option<Arc<dyn PageDriver>> {
        let tab = self.tab(target)?;
        Some(Arc::new(CdpDriver { tab }))
    }

    fn subscribe(&self) -> broadcast::Receiver<TargetEvent> {
        self.events.subscribe()
    }
}

/// Scroll/expand/snapshot over one DevTools tab.
pub struct CdpDriver {
    tab: Arc<Tab>,
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn scroll_by_page(&self) -> Result<(), CollectError> {
        let tab = Arc::clone(&self.tab);
        blocking(move || {
            tab.evaluate(SCROLL_JS, false)
                .map(|_| ())
                .map_err(|err| CollectError::TargetUnavailable(err.to_string()))
        })
        .await
    }

    async fn trigger_expanders(&self) -> Result<usize, CollectError> {
        let tab = Arc::clone(&self.tab);
        blocking(move || {
            let fired = tab
                .evaluate(EXPAND_JS, false)
                .map_err(|err| CollectError::TargetUnavailable(err.to_string()))?;
            Ok(fired
                .value
                .as_ref()
                .and_then(|value| value.as_u64())
                .unwrap_or(0) as usize)
        })
        .await
    }

    async fn snapshot(&self) -> Result<String, CollectError> {
        let tab = Arc::clone(&self.tab);
        blocking(move || {
            tab.get_content()
                .map_err(|err| CollectError::TargetUnavailable(err.to_string()))
        })
        .await
    }

    async fn fill_search(&self, selector: &str, query: &str) -> Result<bool, CollectError> {
        let script = fill_search_js(selector, query)?;
        let tab = Arc::clone(&self.tab);
        blocking(move || {
            let filled = tab
                .evaluate(&script, false)
                .map_err(|err| CollectError::Communication(err.to_string()))?;
            Ok(filled
                .value
                .as_ref()
                .and_then(|value| value.as_bool())
                .unwrap_or(false))
        })
        .await
    }
}

/// Retypes the page's own search input and submits it, the way a user would.
fn fill_search_js(selector: &str, query: &str) -> Result<String, CollectError> {
    let selector = serde_json::to_string(selector)
        .map_err(|err| CollectError::Communication(err.to_string()))?;
    let query = serde_json::to_string(query)
        .map_err(|err| CollectError::Communication(err.to_string()))?;
    Ok(format!(
        r#"
(() => {{
  const input = document.querySelector({selector});
  if (!input) return false;
  input.value = "";
  input.focus();
  input.value = {query};
  input.dispatchEvent(new Event('input', {{ bubbles: true, cancelable: true }}));
  for (const type of ['keydown', 'keyup']) {{
    input.dispatchEvent(new KeyboardEvent(type, {{
      key: 'Enter', code: 'Enter', keyCode: 13, which: 13,
      bubbles: true, cancelable: true,
    }}));
  }}
  const form = input.closest('form');
  if (form) form.submit();
  input.blur();
  return true;
}})()
"#
    ))
}

/// Runs one blocking DevTools call on the blocking pool, tagged as
/// page-context work for the logs.
async fn blocking<T: Send + 'static>(
    task: impl FnOnce() -> Result<T, CollectError> + Send + 'static,
) -> Result<T, CollectError> {
    tokio::task::spawn_blocking(move || {
        collector_logging::set_context(ContextLabel::Page);
        task()
    })
    .await
    .map_err(|err| CollectError::TargetUnavailable(err.to_string()))?
}
