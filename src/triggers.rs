//! Learned pattern → response rules.
//!
//! Each rule is a regular expression and a response template. Every channel
//! message is matched against the rules in the order they were learned; the
//! first pattern that matches at the start of the message wins, and its
//! template is rendered:
//!
//! - `${name}` becomes the text of the named capture group `name` (empty when
//!   the group did not participate in the match)
//! - `${nick}` becomes the sender, unless the pattern defines its own `nick`
//!   group
//! - any other `${...}` is left as written

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::db::{Database, TriggerRecord};
use crate::error::{BotError, BotResult};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}").expect("placeholder regex is valid")
});

/// Compile a stored pattern so it only matches at the start of the message.
pub fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\A(?:{pattern})"))
}

/// Render `template` against a successful match.
pub fn render(regex: &Regex, caps: &Captures<'_>, template: &str, sender: &str) -> String {
    PLACEHOLDER
        .replace_all(template, |ph: &Captures<'_>| {
            let name = &ph[1];
            if regex.capture_names().flatten().any(|n| n == name) {
                caps.name(name).map_or("", |m| m.as_str()).to_owned()
            } else if name == "nick" {
                sender.to_owned()
            } else {
                ph[0].to_owned()
            }
        })
        .into_owned()
}

/// Compiled patterns keyed by their source text. `None` marks a stored
/// pattern that does not compile.
type RegexCache = HashMap<String, Option<Regex>>;

/// The persisted rule set.
#[derive(Debug, Clone)]
pub struct TriggerStore {
    db: Database,
    compiled: Arc<Mutex<RegexCache>>,
}

impl TriggerStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            compiled: Arc::default(),
        }
    }

    /// Store a rule unless the identical pair already exists.
    ///
    /// Returns `true` if a rule was added.
    pub async fn learn(
        &self,
        pattern: &str,
        response: &str,
        learned_by: Option<&str>,
    ) -> BotResult<bool> {
        let regex = compile(pattern).map_err(|source| BotError::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        self.compiled.lock().insert(pattern.to_owned(), Some(regex));

        let inserted = self.db.triggers().insert(pattern, response, learned_by).await?;
        debug!(pattern, response, inserted, "Learn");
        Ok(inserted)
    }

    /// Delete every rule with this pattern. Returns how many were removed.
    pub async fn forget(&self, pattern: &str) -> BotResult<u64> {
        let removed = self.db.triggers().delete_by_pattern(pattern).await?;
        self.compiled.lock().remove(pattern);
        debug!(pattern, removed, "Forget");
        Ok(removed)
    }

    /// Delete every rule. Returns how many were removed.
    pub async fn purge(&self) -> BotResult<u64> {
        let removed = self.db.triggers().delete_all().await?;
        self.compiled.lock().clear();
        Ok(removed)
    }

    /// All rules, oldest first.
    pub async fn rules(&self) -> BotResult<Vec<TriggerRecord>> {
        Ok(self.db.triggers().list().await?)
    }

    /// Render the response of the first rule matching `message`.
    pub async fn match_and_respond(&self, message: &str, sender: &str) -> BotResult<Option<String>> {
        let rules = self.rules().await?;
        let mut compiled = self.compiled.lock();
        for rule in rules {
            let cached = compiled.entry(rule.pattern.clone()).or_insert_with(|| {
                compile(&rule.pattern)
                    .inspect_err(|e| {
                        warn!(id = rule.id, pattern = %rule.pattern, error = %e, "Skipping rule with invalid pattern");
                    })
                    .ok()
            });
            let Some(regex) = cached else {
                continue;
            };

            if let Some(caps) = regex.captures(message) {
                debug!(id = rule.id, pattern = %rule.pattern, "Trigger matched");
                return Ok(Some(render(regex, &caps, &rule.response, sender)));
            }
        }
        Ok(None)
    }

    #[cfg(test)]
    fn cached_patterns(&self) -> usize {
        self.compiled.lock().len()
    }
}
