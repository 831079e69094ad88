//! Per-user permission flags.
//!
//! The alphabet is fixed: admin (`a`), whitelist (`w`) and ignore (`i`).
//! In memory a user's flags are a [`FlagSet`] bitset; on disk they are the
//! sorted letter string (`"aw"`). Usernames are folded with the server's
//! rfc1459 casemapping before every lookup so `Alice` and `alice` (or
//! `[Tooth]` and `{tooth}`) share one row.

use std::fmt;
use std::str::FromStr;

use irc_helper_proto::casemap;
use tracing::{debug, warn};

use crate::db::Database;
use crate::error::{BotError, BotResult};

/// A single capability flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    /// May run privileged private commands.
    Admin,
    /// May teach and forget triggers.
    Whitelist,
    /// Ignored by handlers, triggers and greetings.
    Ignore,
}

impl Flag {
    pub const ALL: [Flag; 3] = [Flag::Admin, Flag::Whitelist, Flag::Ignore];

    /// Storage letter.
    pub fn letter(self) -> char {
        match self {
            Flag::Admin => 'a',
            Flag::Whitelist => 'w',
            Flag::Ignore => 'i',
        }
    }

    /// Long name.
    pub fn name(self) -> &'static str {
        match self {
            Flag::Admin => "admin",
            Flag::Whitelist => "whitelist",
            Flag::Ignore => "ignore",
        }
    }

    fn from_letter(c: char) -> Option<Flag> {
        Flag::ALL.into_iter().find(|f| f.letter() == c)
    }

    fn bit(self) -> u8 {
        match self {
            Flag::Admin => 0b001,
            Flag::Whitelist => 0b010,
            Flag::Ignore => 0b100,
        }
    }
}

impl FromStr for Flag {
    type Err = BotError;

    /// Accepts the long name or the letter, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Flag::ALL
            .into_iter()
            .find(|f| f.name() == lower || (lower.len() == 1 && lower.starts_with(f.letter())))
            .ok_or_else(|| BotError::UnknownFlag(s.to_owned()))
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FlagSet(u8);

impl FlagSet {
    pub const EMPTY: FlagSet = FlagSet(0);

    pub fn contains(self, flag: Flag) -> bool {
        self.0 & flag.bit() != 0
    }

    #[must_use]
    pub fn with(self, flag: Flag) -> FlagSet {
        FlagSet(self.0 | flag.bit())
    }

    #[must_use]
    pub fn without(self, flag: Flag) -> FlagSet {
        FlagSet(self.0 & !flag.bit())
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Flag> {
        Flag::ALL.into_iter().filter(move |f| self.contains(*f))
    }

    /// Parse a stored letter string. Unknown letters are dropped.
    pub fn from_letters(letters: &str) -> FlagSet {
        letters.chars().fold(FlagSet::EMPTY, |set, c| match Flag::from_letter(c) {
            Some(flag) => set.with(flag),
            None => {
                warn!(letter = %c, "Ignoring unknown stored flag");
                set
            }
        })
    }
}

impl FromIterator<Flag> for FlagSet {
    fn from_iter<T: IntoIterator<Item = Flag>>(iter: T) -> Self {
        iter.into_iter().fold(FlagSet::EMPTY, FlagSet::with)
    }
}

impl fmt::Display for FlagSet {
    /// Sorted letter string, the storage form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut letters: Vec<char> = self.iter().map(Flag::letter).collect();
        letters.sort_unstable();
        letters.into_iter().try_for_each(|c| write!(f, "{c}"))
    }
}

/// Persisted username → flags mapping.
#[derive(Debug, Clone)]
pub struct PermissionRegistry {
    db: Database,
}

impl PermissionRegistry {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn fold(username: &str) -> String {
        casemap::fold(username.trim())
    }

    /// Union `flag` into the user's set, creating the row if absent.
    ///
    /// Returns the new set.
    pub async fn add_flag(&self, username: &str, flag: &str) -> BotResult<FlagSet> {
        let flag: Flag = flag.parse()?;
        let user = Self::fold(username);
        let flags = self.get_flags(&user).await?.with(flag);
        self.db.flags().set(&user, &flags.to_string()).await?;
        debug!(user = %user, %flag, flags = %flags, "Flag added");
        Ok(flags)
    }

    /// Remove `flag` from the user's set. No-op if it was not set.
    ///
    /// Returns the new set.
    pub async fn remove_flag(&self, username: &str, flag: &str) -> BotResult<FlagSet> {
        let flag: Flag = flag.parse()?;
        let user = Self::fold(username);
        let current = self.get_flags(&user).await?;
        if !current.contains(flag) {
            return Ok(current);
        }
        let flags = current.without(flag);
        self.db.flags().set(&user, &flags.to_string()).await?;
        debug!(user = %user, %flag, flags = %flags, "Flag removed");
        Ok(flags)
    }

    /// The user's flags, or the empty set.
    pub async fn get_flags(&self, username: &str) -> BotResult<FlagSet> {
        let stored = self.db.flags().get(&Self::fold(username)).await?;
        Ok(stored.map(|s| FlagSet::from_letters(&s)).unwrap_or_default())
    }

    pub async fn has_flag(&self, flag: Flag, username: &str) -> BotResult<bool> {
        Ok(self.get_flags(username).await?.contains(flag))
    }

    /// Give every configured admin the admin flag. Existing flags are kept.
    pub async fn grant_admins(&self, admins: &[String]) -> BotResult<()> {
        for admin in admins {
            self.add_flag(admin, Flag::Admin.name()).await?;
        }
        Ok(())
    }

    /// Whether the user holds any of `flags`.
    pub async fn has_any(&self, flags: &[Flag], username: &str) -> BotResult<bool> {
        let set = self.get_flags(username).await?;
        Ok(flags.iter().any(|f| set.contains(*f)))
    }
}
