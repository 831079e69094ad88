//! The bot's single server connection.
//!
//! [`ConnectionManager`] owns the socket, the inbound line buffer and the
//! [`HandshakeMachine`]. It drives registration to `Ready`, answers liveness
//! probes and offers the send primitives handlers use. Everything runs on the
//! caller's task; no background reader exists.

use std::collections::VecDeque;

use bytes::BytesMut;
use irc_helper_proto::{
    Command, Event, HandshakeAction, HandshakeConfig, HandshakeMachine, LineCodec,
    NumericDetector, ProtocolError, ReadinessDetector, RegistrationState, SubstringDetector,
    pong_for,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, info, trace, warn};

use crate::config::{ConnectionConfig, Detection, HandshakeSettings};
use crate::error::{BotError, BotResult, ConnectionError};

/// Byte stream the connection runs over.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + Sync {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + Sync> Transport for T {}

const READ_CHUNK: usize = 4096;

/// Identity and channel bookkeeping for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub nickname: String,
    pub username: String,
    /// Channel joined after registration.
    pub base_channel: String,
    /// Channel currently joined, if any.
    pub current_channel: Option<String>,
    /// Set once registration completed.
    pub started: bool,
}

/// Owns the socket and the registration state.
pub struct ConnectionManager {
    host: String,
    port: u16,
    stream: Option<Box<dyn Transport>>,
    codec: LineCodec,
    read_buf: BytesMut,
    /// Lines decoded but not yet handed to the caller.
    pending: VecDeque<String>,
    machine: HandshakeMachine,
    session: Session,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("state", &self.machine.state())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Open a TCP connection to the configured server.
    pub async fn connect(
        conn: &ConnectionConfig,
        handshake: &HandshakeSettings,
    ) -> Result<Self, ConnectionError> {
        let addr = format!("{}:{}", conn.host, conn.port);
        let stream = TcpStream::connect((conn.host.as_str(), conn.port))
            .await
            .map_err(|source| ConnectionError::Connect {
                addr: addr.clone(),
                source,
            })?;
        stream.set_nodelay(true)?;
        info!(%addr, "Connected");
        Ok(Self::with_stream(stream, conn, handshake))
    }

    /// Wrap an already-open stream. The state starts at `Connecting`.
    pub fn with_stream<T: Transport + 'static>(
        stream: T,
        conn: &ConnectionConfig,
        handshake: &HandshakeSettings,
    ) -> Self {
        let detector: Box<dyn ReadinessDetector> = match handshake.detection {
            Detection::Substring => Box::new(SubstringDetector),
            Detection::Numeric => Box::new(NumericDetector),
        };
        Self {
            host: conn.host.clone(),
            port: conn.port,
            stream: Some(Box::new(stream)),
            codec: LineCodec::with_max_len(handshake.max_line_len),
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            pending: VecDeque::new(),
            machine: HandshakeMachine::new(
                HandshakeConfig::new(conn.nick.clone(), conn.user.clone()),
                detector,
            ),
            session: Session {
                nickname: conn.nick.clone(),
                username: conn.user.clone(),
                base_channel: conn.channel.clone(),
                current_channel: None,
                started: false,
            },
        }
    }

    pub fn state(&self) -> RegistrationState {
        self.machine.state()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_closed(&self) -> bool {
        self.machine.state() == RegistrationState::Closed
    }

    /// Whether the event originated from the bot itself or the server.
    pub fn is_self(&self, event: &Event) -> bool {
        event.is_from_any(&[
            self.session.nickname.as_str(),
            self.session.username.as_str(),
            self.host.as_str(),
        ])
    }

    /// Run the registration handshake until the server greeting completes.
    ///
    /// Lines that arrive after the end of the greeting in the same read are
    /// kept for the next [`receive_next`](Self::receive_next).
    pub async fn handshake(&mut self) -> Result<(), ConnectionError> {
        info!(nick = %self.session.nickname, "Registering");
        loop {
            let mut lines: VecDeque<String> = self.receive_next().await?.into();
            if lines.is_empty() {
                return Err(ConnectionError::ClosedDuringHandshake);
            }

            while let Some(line) = lines.pop_front() {
                let mut ready = false;
                for action in self.machine.feed(&line) {
                    match action {
                        HandshakeAction::Send(cmd) => self.write_command(&cmd).await?,
                        HandshakeAction::Ready => ready = true,
                    }
                }
                if ready {
                    self.session.started = true;
                    // Unprocessed lines go back in front of anything still buffered.
                    while let Some(rest) = lines.pop_back() {
                        self.pending.push_front(rest);
                    }
                    info!(nick = %self.session.nickname, "Registration complete");
                    return Ok(());
                }
            }
        }
    }

    /// Read until at least one complete line is available.
    ///
    /// Returns the complete lines in arrival order. Partial trailing data stays
    /// buffered. An empty list means the peer closed the connection; the state
    /// is then `Closed`.
    pub async fn receive_next(&mut self) -> Result<Vec<String>, ConnectionError> {
        if !self.pending.is_empty() {
            return Ok(self.pending.drain(..).collect());
        }

        loop {
            let mut lines = Vec::new();
            loop {
                match self.codec.decode(&mut self.read_buf) {
                    Ok(Some(line)) => {
                        trace!(line = %line, "<<");
                        lines.push(line);
                    }
                    Ok(None) => break,
                    Err(ProtocolError::MessageTooLong { actual, limit }) => {
                        warn!(actual, limit, "Dropping overlong line");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            if !lines.is_empty() {
                return Ok(lines);
            }

            let Some(stream) = self.stream.as_mut() else {
                return Ok(Vec::new());
            };
            self.read_buf.reserve(READ_CHUNK);
            let n = stream.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                if !self.read_buf.is_empty() {
                    debug!(bytes = self.read_buf.len(), "Discarding unterminated data at EOF");
                }
                info!("Server closed the connection");
                self.stream = None;
                self.machine.close();
                return Ok(Vec::new());
            }
        }
    }

    /// Answer `line` if it is a server PING. Returns whether it was one.
    pub async fn handle_ping(&mut self, line: &str) -> Result<bool, ConnectionError> {
        match pong_for(line) {
            Some(pong) => {
                self.write_command(&pong).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Join `channel` and make it the current channel.
    pub async fn join_channel(&mut self, channel: &str) -> Result<(), ConnectionError> {
        let state = self.machine.state();
        if state != RegistrationState::Ready {
            return Err(ConnectionError::NotReady(state));
        }
        self.write_command(&Command::Join(channel.to_owned())).await?;
        self.session.current_channel = Some(channel.to_owned());
        info!(%channel, "Joined channel");
        Ok(())
    }

    /// Part the current channel. No-op when not in one.
    pub async fn leave_channel(&mut self, reason: Option<&str>) -> Result<(), ConnectionError> {
        let Some(channel) = self.session.current_channel.take() else {
            return Ok(());
        };
        self.write_command(&Command::Part(channel.clone(), reason.map(str::to_owned)))
            .await?;
        info!(%channel, "Left channel");
        Ok(())
    }

    fn resolve_target<'a>(&'a self, target: Option<&'a str>) -> BotResult<&'a str> {
        target
            .or(self.session.current_channel.as_deref())
            .ok_or(BotError::NoTarget)
    }

    /// PRIVMSG `target`, or the current channel when `target` is `None`.
    pub async fn send(&mut self, text: &str, target: Option<&str>) -> BotResult<()> {
        let cmd = Command::privmsg(self.resolve_target(target)?, text);
        self.write_command(&cmd).await?;
        Ok(())
    }

    /// Like [`send`](Self::send), wrapped as a CTCP ACTION.
    pub async fn send_action(&mut self, text: &str, target: Option<&str>) -> BotResult<()> {
        let cmd = Command::action(self.resolve_target(target)?, text);
        self.write_command(&cmd).await?;
        Ok(())
    }

    /// Send QUIT and close the socket. Idempotent.
    pub async fn quit(&mut self, farewell: &str) {
        let Some(mut stream) = self.stream.take() else {
            self.machine.close();
            return;
        };

        let mut buf = BytesMut::new();
        let quit = Command::Quit(Some(farewell.to_owned()));
        let result = match self.codec.encode(&quit, &mut buf) {
            Ok(()) => stream.write_all(&buf).await,
            Err(e) => Err(std::io::Error::other(e)),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to send QUIT");
        }
        if let Err(e) = stream.shutdown().await {
            debug!(error = %e, "Socket shutdown failed");
        }

        self.machine.close();
        self.session.current_channel = None;
        info!("Disconnected");
    }

    async fn write_command(&mut self, cmd: &Command) -> Result<(), ConnectionError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(ConnectionError::NotReady(RegistrationState::Closed));
        };
        let mut buf = BytesMut::new();
        self.codec.encode(cmd, &mut buf)?;
        stream.write_all(&buf).await?;
        stream.flush().await?;
        debug!(command = cmd.name(), line = %cmd, ">>");
        Ok(())
    }
}
