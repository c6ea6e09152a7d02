// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! System prompt rendering.
//!
//! The prompt sent with `NewSession` is a template expanded with the
//! session's plan directory (`<plans_root>/<thread_id>`) and any
//! additional plan directories configured for the deployment.

use std::path::PathBuf;
use swb_core::Session;

/// Placeholders: `{plan_dir}`, `{extra_plan_dirs}`.
pub const DEFAULT_TEMPLATE: &str = "\
You are a coding agent operated through the Switchboard control plane.

Keep plan documents for this session under {plan_dir}.
Additional plan directories available to you:
{extra_plan_dirs}

Narrate what you do; your output is streamed live to the user.";

/// Expands the system-prompt template for a session.
#[derive(Clone)]
pub struct SystemPromptRenderer {
    template: String,
    plans_root: PathBuf,
    extra_plan_dirs: Vec<PathBuf>,
}

impl SystemPromptRenderer {
    pub fn new(plans_root: PathBuf, extra_plan_dirs: Vec<PathBuf>) -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string(), plans_root, extra_plan_dirs }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn render(&self, session: &Session) -> String {
        let plan_dir = self.plans_root.join(session.thread_id.as_str());
        let extra = if self.extra_plan_dirs.is_empty() {
            "(none)".to_string()
        } else {
            self.extra_plan_dirs
                .iter()
                .map(|d| d.display().to_string())
                .collect::<Vec<_>>()
                .join("\n")
        };
        self.template
            .replace("{plan_dir}", &plan_dir.display().to_string())
            .replace("{extra_plan_dirs}", &extra)
    }
}

#[cfg(test)]
#[path = "sysprompt_tests.rs"]
mod tests;
