//! System prompt rendering with the local date and time.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};
use sgprovider::Message;

pub const DEFAULT_SYSTEM_PROMPT_TEMPLATE: &str = include_str!("../assets/system_prompt.md");

/// A rendered system prompt, refreshed on demand from its template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPromptContext {
    template: String,
    rendered: String,
}

impl SystemPromptContext {
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let rendered = render_template(&template, &Local::now());
        Self { template, rendered }
    }

    pub fn at<Tz>(template: impl Into<String>, now: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let template = template.into();
        let rendered = render_template(&template, now);
        Self { template, rendered }
    }

    pub fn refresh(&mut self) {
        self.rendered = render_template(&self.template, &Local::now());
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn to_message(&self) -> Message {
        Message::system(self.rendered.clone())
    }
}

impl Default for SystemPromptContext {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT_TEMPLATE)
    }
}

/// Fills `{{CURRENT_DATE}}`, `{{CURRENT_TIME}}` and `{{DAY_OF_WEEK}}`.
pub fn render_template<Tz>(template: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    template
        .replace("{{CURRENT_DATE}}", &now.format("%B %-d, %Y").to_string())
        .replace("{{CURRENT_TIME}}", &now.format("%I:%M:%S %p UTC%:z").to_string())
        .replace("{{DAY_OF_WEEK}}", &now.format("%A").to_string())
}
