//! The composition root.
//!
//! [`Bot`] owns the stores, the handler router and the connection, and runs
//! the receive, parse and dispatch cycle on the caller's task. Events are
//! processed strictly in arrival order; nothing is spawned.

use std::path::PathBuf;

use irc_helper_proto::{Event, RegistrationState, casemap};
use tracing::{Instrument, debug, info, trace, warn};

use crate::config::Config;
use crate::connection::{ConnectionManager, Transport};
use crate::db::Database;
use crate::error::{BotResult, ConnectionError};
use crate::handlers::{
    BotState, CommandRouter, Context, Handler, Outcome, Scope, pick_line, register_defaults,
};
use crate::permissions::{Flag, PermissionRegistry};
use crate::telemetry::spans;
use crate::title::{HttpTitleFetcher, TitleFetcher};
use crate::triggers::TriggerStore;

/// Greeting used when `[messages] greetings` is empty.
const FALLBACK_GREETING: &str = "doesn't know how to greet {nick}!";

/// A configured bot, optionally attached to a server.
pub struct Bot {
    config: Config,
    db: Database,
    triggers: TriggerStore,
    permissions: PermissionRegistry,
    titles: Box<dyn TitleFetcher>,
    router: CommandRouter,
    state: BotState,
    conn: Option<ConnectionManager>,
}

impl Bot {
    /// Open the database, grant the configured admins and register the
    /// built-in handlers.
    ///
    /// `config_path` is remembered for `reload_config`.
    pub async fn new(config: Config, config_path: Option<PathBuf>) -> BotResult<Self> {
        let db = Database::new(&config.database.path).await?;
        let triggers = TriggerStore::new(db.clone());
        let permissions = PermissionRegistry::new(db.clone());

        permissions.grant_admins(&config.bot.admins).await?;

        let mut router = CommandRouter::new();
        register_defaults(&mut router);

        Ok(Self {
            config,
            db,
            triggers,
            permissions,
            titles: Box::new(HttpTitleFetcher::new()),
            router,
            state: BotState {
                config_path,
                ..BotState::default()
            },
            conn: None,
        })
    }

    /// Replace the title fetcher.
    #[must_use]
    pub fn with_title_fetcher(mut self, titles: impl TitleFetcher + 'static) -> Self {
        self.titles = Box::new(titles);
        self
    }

    /// Register an additional handler after the built-in ones.
    pub fn register<H: Handler + 'static>(&mut self, handler: H, scope: Scope) {
        self.router.register(handler, scope);
    }

    pub fn triggers(&self) -> &TriggerStore {
        &self.triggers
    }

    /// Connection state, or `Closed` when detached.
    pub fn state(&self) -> RegistrationState {
        self.conn
            .as_ref()
            .map_or(RegistrationState::Closed, ConnectionManager::state)
    }

    /// Connect to the configured server over TCP and register.
    pub async fn connect(&mut self) -> BotResult<()> {
        let conn = ConnectionManager::connect(&self.config.connection, &self.config.handshake)
            .await?;
        self.start(conn).await
    }

    /// Register over an already-open stream.
    pub async fn connect_with<T: Transport + 'static>(&mut self, stream: T) -> BotResult<()> {
        let conn =
            ConnectionManager::with_stream(stream, &self.config.connection, &self.config.handshake);
        self.start(conn).await
    }

    async fn start(&mut self, conn: ConnectionManager) -> BotResult<()> {
        let session = &self.config.connection;
        let span = spans::session(&session.host, session.port, &session.nick);
        // Attach before registering so shutdown can QUIT from any point.
        let conn = self.conn.insert(conn);
        conn.handshake().instrument(span).await?;

        let channel = self.config.connection.channel.clone();
        self.context()?.join_and_announce(&channel).await
    }

    /// Borrow the handler context alongside the router.
    fn parts(&mut self) -> BotResult<(Context<'_>, &CommandRouter)> {
        let conn = self
            .conn
            .as_mut()
            .ok_or(ConnectionError::NotReady(RegistrationState::Closed))?;
        let ctx = Context {
            conn,
            triggers: &self.triggers,
            permissions: &self.permissions,
            titles: self.titles.as_ref(),
            config: &mut self.config,
            state: &mut self.state,
        };
        Ok((ctx, &self.router))
    }

    fn context(&mut self) -> BotResult<Context<'_>> {
        Ok(self.parts()?.0)
    }

    /// Process events until the server closes the connection or a handler
    /// requests termination.
    ///
    /// Non-fatal errors are logged and the loop continues.
    pub async fn run(&mut self) -> BotResult<()> {
        loop {
            let lines = self.context()?.conn.receive_next().await?;
            if lines.is_empty() {
                info!("Session ended by server");
                return Ok(());
            }

            for line in lines {
                match self.process_line(&line).await {
                    Ok(()) => {}
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => warn!(code = e.error_code(), error = %e, "Failed to process line"),
                }
                if self.state.shutdown_requested {
                    info!("Shutdown requested");
                    return Ok(());
                }
            }
        }
    }

    async fn process_line(&mut self, line: &str) -> BotResult<()> {
        let mut ctx = self.context()?;
        if ctx.conn.handle_ping(line).await? {
            return Ok(());
        }

        let event = Event::parse(line);
        if ctx.conn.is_self(&event) {
            trace!(command = %event.command, "Skipping own or server line");
            return Ok(());
        }

        let span = spans::event(&event.command, &event.sender);
        self.handle_event(&event).instrument(span).await
    }

    async fn handle_event(&mut self, event: &Event) -> BotResult<()> {
        if event.sender.is_empty() {
            return Ok(());
        }
        if self.permissions.has_flag(Flag::Ignore, &event.sender).await? {
            debug!(sender = %event.sender, "Ignoring flagged user");
            return Ok(());
        }

        if event.is_command("JOIN") {
            return self.greet(event).await;
        }
        if !event.is_privmsg() || event.message.is_empty() {
            return Ok(());
        }

        let (mut ctx, router) = self.parts()?;
        if router.dispatch(&mut ctx, event).await? == Outcome::Claimed {
            return Ok(());
        }

        let in_channel = ctx
            .conn
            .session()
            .current_channel
            .as_deref()
            .is_some_and(|c| casemap::eq(c, &event.recipient));
        if !in_channel {
            return Ok(());
        }
        if let Some(reply) = ctx.triggers.match_and_respond(&event.message, &event.sender).await? {
            ctx.conn.send(&reply, None).await?;
        }
        Ok(())
    }

    async fn greet(&mut self, event: &Event) -> BotResult<()> {
        let mut ctx = self.context()?;
        let joined = event.channel();
        let current = ctx.conn.session().current_channel.as_deref();
        if !current.is_some_and(|c| casemap::eq(c, joined)) {
            return Ok(());
        }
        let greeting = pick_line(
            &ctx.config.messages.greetings,
            FALLBACK_GREETING,
            "nick",
            &event.sender,
        );
        ctx.act(&greeting).await
    }

    /// Say goodbye and release the database. Safe to call more than once and
    /// on every exit path.
    pub async fn shutdown(&mut self) {
        if let Some(conn) = self.conn.as_mut() {
            conn.quit(&self.config.bot.farewell).await;
        }
        self.db.close().await;
        info!("Shut down");
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("nick", &self.config.connection.nick)
            .field("conn", &self.conn)
            .field("handlers", &self.router.len())
            .finish_non_exhaustive()
    }
}
