//! Built-in `generateNotes` strategy producing a markdown changelog entry.

use std::io::Cursor;

use async_trait::async_trait;
use semrel_core::error::Result;
use semrel_core::plugin::{GenerateNotes, NotesContext, NotesStream, PluginOptions};
use serde::Deserialize;

use crate::conventional;

pub const NAME: &str = "release-notes";

#[derive(Debug, Clone, Default, Deserialize)]
struct Options {
    /// Heading text; defaults to the version.
    #[serde(default)]
    title: Option<String>,
}

/// Groups conventional commits into breaking changes, features and fixes.
#[derive(Debug, Clone, Default)]
pub struct ReleaseNotesGenerator {
    title: Option<String>,
}

impl ReleaseNotesGenerator {
    /// # Errors
    ///
    /// Returns an error if the options are malformed.
    pub fn from_options(options: &PluginOptions) -> Result<Self> {
        let options: Options = options.parse(NAME)?;
        Ok(Self {
            title: options.title,
        })
    }

    /// Renders the notes for `ctx`.
    pub fn render(&self, ctx: &NotesContext<'_>) -> String {
        let mut breaking = Vec::new();
        let mut features = Vec::new();
        let mut fixes = Vec::new();

        for commit in ctx.commits.iter().rev() {
            let Some(parsed) = conventional::parse(&commit.message) else {
                continue;
            };
            let scope = parsed
                .scope
                .as_ref()
                .map(|s| format!("**{}:** ", s))
                .unwrap_or_default();
            let line = format!("* {}{} ({})", scope, parsed.subject, commit.short_hash());

            if let Some(note) = &parsed.breaking {
                breaking.push(format!("* {}{}", scope, note));
            }
            match parsed.kind.as_str() {
                "feat" => features.push(line),
                "fix" | "perf" => fixes.push(line),
                _ => {}
            }
        }

        let title = self
            .title
            .clone()
            .unwrap_or_else(|| ctx.version.to_string());
        let mut out = format!("## {}\n", title);
        for (heading, lines) in [
            ("Breaking Changes", &breaking),
            ("Features", &features),
            ("Bug Fixes", &fixes),
        ] {
            if lines.is_empty() {
                continue;
            }
            out.push_str(&format!("\n### {}\n\n", heading));
            for line in lines {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

#[async_trait]
impl GenerateNotes for ReleaseNotesGenerator {
    async fn generate(&self, ctx: &NotesContext<'_>) -> Result<NotesStream> {
        let body = self.render(ctx);
        tracing::debug!(bytes = body.len(), "generated release notes");
        Ok(Box::pin(Cursor::new(body.into_bytes())))
    }
}
