//! Prompt presets and quick actions.
//!
//! Both are fixed instruction strings that get prepended to text the user
//! supplies (a typed prompt or a page selection).

use crate::error::{Result, SidechatError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PromptPreset {
    pub label: &'static str,
    pub instruction: &'static str,
}

/// Presets offered in the prompt picker, in display order.
pub const PRESETS: &[PromptPreset] = &[
    PromptPreset {
        label: "Summarize this email",
        instruction: "Summarize this email:",
    },
    PromptPreset {
        label: "Generate a reply",
        instruction: "Generate a reply:",
    },
    PromptPreset {
        label: "Fix grammar",
        instruction: "Fix grammar:",
    },
    PromptPreset {
        label: "Translate to Spanish",
        instruction: "Translate to Spanish:",
    },
    PromptPreset {
        label: "Translate to French",
        instruction: "Translate to French:",
    },
    PromptPreset {
        label: "Rewrite selected text",
        instruction: "Rewrite the following text:",
    },
];

// ─────────────────────────────────────────────
// Quick actions
// ─────────────────────────────────────────────

/// One-shot actions applied to selected text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuickAction {
    Summarize,
    Generate,
    Translate,
}

impl QuickAction {
    pub const ALL: [QuickAction; 3] = [QuickAction::Summarize, QuickAction::Generate, QuickAction::Translate];

    pub fn name(self) -> &'static str {
        match self {
            QuickAction::Summarize => "summarize",
            QuickAction::Generate => "generate",
            QuickAction::Translate => "translate",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            QuickAction::Summarize => "Summarize this article:",
            QuickAction::Generate => "Generate a response based on this:",
            QuickAction::Translate => "Translate this text to:",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Build the prompt for this action over `selection`.
    pub fn prompt_for(self, selection: &str) -> Result<String> {
        compose_prompt(self.instruction(), selection)
    }
}

impl std::fmt::Display for QuickAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `"{instruction}\n\n{selection}"`. A blank selection is rejected.
pub fn compose_prompt(instruction: &str, selection: &str) -> Result<String> {
    if selection.trim().is_empty() {
        return Err(SidechatError::validation("missing selection"));
    }
    Ok(format!("{}\n\n{}", instruction, selection))
}
