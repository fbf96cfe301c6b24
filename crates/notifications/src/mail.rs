//! Plain-text mail messages.

use serde::{Deserialize, Serialize};

use tradeerp_core::string_enum;

string_enum! {
    pub enum MailLevel {
        Info => "info",
        Success => "success",
        Error => "error",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailAction {
    pub text: String,
    pub url: String,
}

/// A mail built line by line.
///
/// Lines added before [`MailMessage::action`] form the introduction, lines
/// added after it the closing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailMessage {
    pub level: MailLevel,
    pub subject: String,
    pub greeting: Option<String>,
    pub intro_lines: Vec<String>,
    pub action: Option<MailAction>,
    pub outro_lines: Vec<String>,
    pub salutation: Option<String>,
}

impl Default for MailMessage {
    fn default() -> Self {
        Self::new()
    }
}

impl MailMessage {
    pub fn new() -> Self {
        Self {
            level: MailLevel::Info,
            subject: String::new(),
            greeting: None,
            intro_lines: Vec::new(),
            action: None,
            outro_lines: Vec::new(),
            salutation: None,
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    pub fn level(mut self, level: MailLevel) -> Self {
        self.level = level;
        self
    }

    pub fn success(self) -> Self {
        self.level(MailLevel::Success)
    }

    pub fn error(self) -> Self {
        self.level(MailLevel::Error)
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        if self.action.is_none() {
            self.intro_lines.push(line.into());
        } else {
            self.outro_lines.push(line.into());
        }
        self
    }

    pub fn line_if(self, condition: bool, line: impl FnOnce() -> String) -> Self {
        if condition { self.line(line()) } else { self }
    }

    pub fn action(mut self, text: impl Into<String>, url: impl Into<String>) -> Self {
        self.action = Some(MailAction {
            text: text.into(),
            url: url.into(),
        });
        self
    }

    pub fn salutation(mut self, salutation: impl Into<String>) -> Self {
        self.salutation = Some(salutation.into());
        self
    }

    /// Every line of body text, introduction first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.intro_lines.iter().chain(&self.outro_lines).map(String::as_str)
    }

    pub fn render_text(&self) -> String {
        let greeting = match (&self.greeting, self.level) {
            (Some(g), _) => g.as_str(),
            (None, MailLevel::Error) => "Whoops!",
            (None, _) => "Hello!",
        };

        let mut blocks = vec![greeting.to_owned()];
        blocks.extend(self.intro_lines.iter().cloned());
        if let Some(action) = &self.action {
            blocks.push(format!("{}: {}", action.text, action.url));
        }
        blocks.extend(self.outro_lines.iter().cloned());
        blocks.push(
            self.salutation
                .clone()
                .unwrap_or_else(|| "Regards,\nTradeERP".to_owned()),
        );
        blocks.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_split_around_the_action() {
        let mail = MailMessage::new()
            .subject("Certification Issued")
            .greeting("Hello Dana,")
            .line("A certification was recorded.")
            .action("View", "http://localhost/x")
            .line("Thanks for keeping records current.");

        assert_eq!(mail.intro_lines, vec!["A certification was recorded."]);
        assert_eq!(mail.outro_lines, vec!["Thanks for keeping records current."]);
        assert_eq!(
            mail.render_text(),
            "Hello Dana,\n\nA certification was recorded.\n\nView: http://localhost/x\n\n\
             Thanks for keeping records current.\n\nRegards,\nTradeERP"
        );
    }

    #[test]
    fn error_mail_defaults_its_greeting() {
        let mail = MailMessage::new().error().line_if(false, || "hidden".into());
        assert!(mail.render_text().starts_with("Whoops!"));
        assert_eq!(mail.lines().count(), 0);
    }
}
