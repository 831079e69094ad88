//! Flavor text.
//!
//! Every line the bot speaks in character comes from here, so a config file
//! can restyle the bot without touching code. Placeholders are written as
//! `{name}` and substituted with [`fill`].

use serde::Deserialize;

/// Configurable flavor text. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Messages {
    /// Greetings for users joining the channel (`{nick}`).
    pub greetings: Vec<String>,
    /// ACTION sent after joining a channel.
    pub announce_arrival: String,
    /// Attack lines (`{target}`).
    pub attacks: Vec<String>,
    /// Page title announcement (`{title}`).
    pub urltitle: String,
    pub learn: String,
    pub learn_superfluous: String,
    pub learn_deny: String,
    /// The trigger did not compile.
    pub learn_error: String,
    pub forget: String,
    pub forget_superfluous: String,
    pub eat: String,
    pub eat_inedible: String,
    pub spit: String,
    pub spit_superfluous: String,
    /// Stomach contents (`{victims}`).
    pub stomach: String,
    pub stomach_empty: String,
    pub vomit: String,
    pub vomit_superfluous: String,
    pub purge_commands: String,
    pub purge_commands_superfluous: String,
    /// One line of `list_commands` output (`{trigger}`, `{response}`).
    pub print_command: String,
    pub list_commands_empty: String,
    /// `{flag}`, `{user}`, `{flags}`
    pub flag_added: String,
    /// `{flag}`, `{user}`, `{flags}`
    pub flag_removed: String,
    pub unknown_flag: String,
    /// `{users}`
    pub whitelisted: String,
    pub config_reloaded: String,
    /// The config file could not be read or failed validation.
    pub config_reload_failed: String,
    pub deny_command: String,
    /// PART reason used by `move_channel`.
    pub switch_channel: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            greetings: vec!["doesn't know how to greet {nick}!".into()],
            announce_arrival: "enters the arena!".into(),
            attacks: vec!["doesn't have a valid attack for {target}!".into()],
            urltitle: "finds the URL title to be: \u{2}\"{title}\"".into(),
            learn: "has been trained by {nick}!".into(),
            learn_superfluous: "already knows that trick!".into(),
            learn_deny: "doesn't want to be trained by {nick}!".into(),
            learn_error: "tilts his head in confusion towards {nick}...".into(),
            forget: "forgot one of his tricks!".into(),
            forget_superfluous: "doesn't know that trick!".into(),
            eat: "gulps down {victim}!".into(),
            eat_inedible: "doesn't feel like eating {victim}!".into(),
            spit: "spits out {victim}!".into(),
            spit_superfluous: "hasn't eaten {victim} yet!".into(),
            stomach: "is digesting {victims}...".into(),
            stomach_empty: "isn't digesting anyone...".into(),
            vomit: "empties his stomach!".into(),
            vomit_superfluous: "hasn't eaten anything yet!".into(),
            purge_commands: "forgot all of his tricks!".into(),
            purge_commands_superfluous: "hasn't learned any tricks to forget!".into(),
            print_command: "{trigger} -> {response}".into(),
            list_commands_empty: "hasn't learned any tricks yet!".into(),
            flag_added: "successfully added {flag} to {user}, new flags: {flags}".into(),
            flag_removed: "successfully removed {flag} from {user}, new flags: {flags}".into(),
            unknown_flag: "doesn't know that flag!".into(),
            whitelisted: "will now listen to {users}!".into(),
            config_reloaded: "successfully reloaded his config!".into(),
            config_reload_failed: "couldn't make sense of his new config...".into(),
            deny_command: "won't listen to you!".into(),
            switch_channel: "Gotta go to fly with Hiccup...".into(),
        }
    }
}

/// Substitute `{key}` placeholders in `template`.
///
/// Unknown placeholders are left as written.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_owned(), |text, (key, value)| {
        text.replace(&format!("{{{key}}}"), value)
    })
}
