//! Per-UI-session application context.
//!
//! A `ChatSession` ties together the dispatcher, the history store, and the
//! currently selected project. It allows one outstanding request at a time:
//! a second `ask` while the first is still waiting fails fast with
//! `RequestInFlight` instead of sending a duplicate call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use sidechat_core::presets::QuickAction;
use sidechat_core::{ChatEntry, HistoryStore, Result, SidechatError};

use crate::dispatcher::{Completion, Dispatcher};

pub struct ChatSession {
    dispatcher: Arc<Dispatcher>,
    history: Arc<HistoryStore>,
    active_project: Option<String>,
    in_flight: AtomicBool,
}

impl ChatSession {
    pub fn new(dispatcher: Arc<Dispatcher>, history: Arc<HistoryStore>) -> Self {
        Self {
            dispatcher,
            history,
            active_project: None,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    pub fn active_project(&self) -> Option<&str> {
        self.active_project.as_deref()
    }

    /// Make `project_id` the active project, or clear it with `None`.
    pub async fn select_project(&mut self, project_id: Option<&str>) -> Result<()> {
        match project_id {
            Some(id) => {
                self.history.get_project(id).await?;
                debug!(project = id, "project selected");
                self.active_project = Some(id.to_string());
            }
            None => self.active_project = None,
        }
        Ok(())
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Send a prompt and record the exchange.
    ///
    /// With an active project, its recent history is prepended as context.
    /// History stores the prompt as the user typed it. Failed dispatches
    /// write nothing, and history write failures do not fail the call.
    pub async fn ask(&self, provider: &str, prompt: &str, model: Option<&str>) -> Result<Completion> {
        if prompt.trim().is_empty() {
            return Err(SidechatError::validation("prompt cannot be empty"));
        }
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let full_prompt = match &self.active_project {
            Some(id) => {
                let context = self.history.context_for(id).await?;
                if context.is_empty() {
                    prompt.to_string()
                } else {
                    format!("{}\n\n{}", context, prompt)
                }
            }
            None => prompt.to_string(),
        };

        let completion = self.dispatcher.send(provider, &full_prompt, model).await?;

        let entry = ChatEntry::new(prompt, &completion.text, &completion.provider, &completion.model);
        if let Err(e) = self.history.append_global(entry.clone()).await {
            warn!(error = %e, "failed to save global history");
        }
        if let Some(id) = &self.active_project {
            if let Err(e) = self.history.append_to_project(id, entry).await {
                warn!(project = %id, error = %e, "failed to save project history");
            }
        }

        Ok(completion)
    }

    /// Run a quick action over selected text.
    pub async fn quick_action(
        &self,
        provider: &str,
        action: QuickAction,
        selection: &str,
        model: Option<&str>,
    ) -> Result<Completion> {
        let prompt = action.prompt_for(selection)?;
        self.ask(provider, &prompt, model).await
    }
}

/// Holds the session's in-flight flag; releases it on drop.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SidechatError::RequestInFlight)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
