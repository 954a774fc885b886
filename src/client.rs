use std::future::Future;
use std::io;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::Options;
use crate::context::{ConnectionStatus, Shutdown, State, SEND_BUFFER_SIZE};
use crate::error::Error;
use crate::event::{Event, EventKind};
use crate::event_handler::EventHandler;
use crate::message::{Message, Tags};
use crate::registry::Registry;
use crate::{receiver, sender};

/// State shared by the client handle, the send loop and the receive loop.
pub(crate) struct Session {
    pub(crate) options: Options,
    state: RwLock<State>,
    pub(crate) registry: Registry,
}

impl Session {
    pub(crate) fn new(options: Options) -> Self {
        Self {
            options,
            state: RwLock::new(State::default()),
            registry: Registry::new(),
        }
    }

    pub(crate) fn connected(&self) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.status == ConnectionStatus::Connected
    }

    fn begin_connecting(&self) -> Result<(), Error> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.status != ConnectionStatus::Disconnected {
            return Err(Error::AlreadyConnected);
        }

        state.status = ConnectionStatus::Connecting;
        state.cancel_dial = false;
        Ok(())
    }

    fn abort_connecting(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.status == ConnectionStatus::Connecting {
            state.status = ConnectionStatus::Disconnected;
            state.cancel_dial = false;
        }
    }

    /// Moves a successful dial to `Connected`, or back to `Disconnected` if
    /// [`Session::disconnect`] was called while dialing.
    fn finish_connecting(&self, outbound: mpsc::Sender<String>) -> Option<Shutdown> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.cancel_dial {
            state.status = ConnectionStatus::Disconnected;
            state.cancel_dial = false;
            return None;
        }

        Some(Self::install(&mut state, outbound))
    }

    /// Installs a fresh outbound queue and shutdown signal for a new session.
    pub(crate) fn mark_connected(&self, outbound: mpsc::Sender<String>) -> Shutdown {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        Self::install(&mut state, outbound)
    }

    fn install(state: &mut State, outbound: mpsc::Sender<String>) -> Shutdown {
        let shutdown = Shutdown::new();

        *state = State {
            status: ConnectionStatus::Connected,
            outbound: Some(outbound),
            shutdown: shutdown.clone(),
            cancel_dial: false,
        };

        shutdown
    }

    /// Ends whatever session is current. While dialing, the dial is
    /// cancelled instead.
    pub(crate) fn disconnect(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match state.status {
            ConnectionStatus::Connected => self.tear_down(&mut state),
            ConnectionStatus::Connecting => {
                debug!("disconnect requested while connecting to {}", self.options.address());
                state.cancel_dial = true;
            }
            ConnectionStatus::Disconnected => {}
        }
    }

    /// Ends the session owning `shutdown`. A loop left over from an earlier
    /// session only closes its own signal and leaves the current one alone.
    pub(crate) fn disconnect_session(&self, shutdown: &Shutdown) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.status == ConnectionStatus::Connected && state.shutdown.same_as(shutdown) {
            self.tear_down(&mut state);
        } else {
            shutdown.close();
        }
    }

    fn tear_down(&self, state: &mut State) {
        state.status = ConnectionStatus::Disconnected;
        state.outbound = None;
        if state.shutdown.close() {
            info!("disconnected from {}", self.options.address());
        }
    }

    /// Queues a line for the send loop. Never blocks: nothing is queued while
    /// disconnected, and a full queue drops the line.
    pub(crate) fn send(&self, command: Command) {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.status != ConnectionStatus::Connected {
            return;
        }

        let Some(outbound) = &state.outbound else {
            return;
        };

        match outbound.try_send(command.to_string()) {
            Ok(()) => {}
            Err(TrySendError::Full(line)) => warn!("send queue full; discarding message: {}", line),
            Err(TrySendError::Closed(line)) => debug!("send queue closed; discarding message: {}", line),
        }
    }

    async fn authenticate<R, W>(&self, nick: &str, pass: &str, reader: &mut BufReader<R>, writer: &mut W) -> Result<(), Error>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let login = format!("{}\r\n{}\r\n", Command::Pass(pass.to_string()), Command::Nick(nick.to_string()));
        if self.options.debug {
            debug!("< PASS ***");
            debug!("< {}", Command::Nick(nick.to_string()));
        }
        sender::write_line(writer, &login).await.map_err(Error::Write)?;

        let line = receiver::read_line(reader, self.options.read_timeout).await.map_err(Error::Read)?;
        if self.options.debug {
            debug!("> {}", line.trim_end());
        }

        let message = Message::parse(&line);
        if message.command != "001" {
            // Login failures arrive as a NOTICE, so listeners still get to see it
            self.dispatch(&message);
            return Err(Error::Handshake(line.trim_end().to_string()));
        }

        let cap_req = Command::cap_req();
        if self.options.debug {
            debug!("< {}", cap_req);
        }
        sender::write_line(writer, &format!("{}\r\n", cap_req)).await.map_err(Error::Write)?;

        info!("connected to {} as {}", self.options.address(), nick);
        Ok(())
    }
}

/// A client for one chat connection.
///
/// Cloning is cheap; every clone drives the same session, so a clone can
/// send and disconnect while another one is blocked in [`Client::connect`].
#[derive(Clone)]
pub struct Client {
    session: Arc<Session>,
}

impl Client {
    pub fn new(options: Options) -> Self {
        Self {
            session: Arc::new(Session::new(options)),
        }
    }

    pub fn options(&self) -> &Options {
        &self.session.options
    }

    /// Connects over TCP to the configured host and authenticates with
    /// `nick` and `pass` (an OAuth token).
    ///
    /// Runs listeners until the session ends, then returns the error that
    /// ended it.
    pub async fn connect(&self, nick: &str, pass: &str) -> Result<(), Error> {
        let address = self.session.options.address();
        info!("connecting to {}", address);
        self.connect_with(nick, pass, || TcpStream::connect(address)).await
    }

    /// Like [`Client::connect`], with `dial` opening the transport.
    pub async fn connect_with<F, Fut, S>(&self, nick: &str, pass: &str, dial: F) -> Result<(), Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = io::Result<S>>,
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        self.session.begin_connecting()?;

        let stream = match dial().await {
            Ok(stream) => stream,
            Err(err) => {
                self.session.abort_connecting();
                return Err(Error::Dial(err));
            }
        };

        let (outbound, queue) = mpsc::channel(SEND_BUFFER_SIZE);
        let Some(shutdown) = self.session.finish_connecting(outbound) else {
            info!("connect to {} cancelled by disconnect", self.session.options.address());
            return Err(Error::Dial(io::Error::new(io::ErrorKind::ConnectionAborted, "disconnected while connecting")));
        };

        let (reader, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);

        if let Err(err) = self.session.authenticate(nick, pass, &mut reader, &mut writer).await {
            self.session.disconnect_session(&shutdown);
            return Err(err);
        }

        for channel in &self.session.options.channels {
            self.join(channel);
        }

        tokio::spawn(sender::run(self.session.clone(), writer, queue, shutdown.clone()));

        Err(receiver::run(&self.session, reader, shutdown).await)
    }

    /// Ends the session. Only the first call after a connect has any effect.
    ///
    /// Called while a connect is still dialing, it makes that connect fail
    /// with a `ConnectionAborted` [`Error::Dial`] once the dial completes.
    pub fn disconnect(&self) {
        self.session.disconnect();
    }

    pub fn connected(&self) -> bool {
        self.session.connected()
    }

    pub fn say(&self, channel: &str, text: &str) {
        self.session.send(Command::privmsg(channel, text));
    }

    pub fn whisper(&self, user: &str, text: &str) {
        self.session.send(Command::whisper(user, text));
    }

    /// Joins `channel`, adding the `#` prefix if it is missing.
    pub fn join(&self, channel: &str) {
        self.session.send(Command::join(channel));
    }

    /// Parts `channel`, adding the `#` prefix if it is missing.
    pub fn part(&self, channel: &str) {
        self.session.send(Command::part(channel));
    }

    /// Registers `handler` for every event of `kind`.
    pub fn on<H: EventHandler + 'static>(&self, kind: EventKind, handler: H) {
        self.session.registry.register(kind, Arc::new(handler));
    }

    pub fn on_notice<F>(&self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on(EventKind::Notice, move |event: &Event| {
            if let Event::Notice { message } = event {
                callback(message);
            }
        });
    }

    pub fn on_user_state<F>(&self, callback: F)
    where
        F: Fn(&str, &Tags) + Send + Sync + 'static,
    {
        self.on(EventKind::UserState, move |event: &Event| {
            if let Event::UserState { channel, tags } = event {
                callback(channel, tags);
            }
        });
    }

    pub fn on_room_state<F>(&self, callback: F)
    where
        F: Fn(&str, &Tags) + Send + Sync + 'static,
    {
        self.on(EventKind::RoomState, move |event: &Event| {
            if let Event::RoomState { channel, tags } = event {
                callback(channel, tags);
            }
        });
    }

    /// Called when a user joins a channel, with the channel and the user.
    pub fn on_join<F>(&self, callback: F)
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.on(EventKind::Join, move |event: &Event| {
            if let Event::Join { channel, user } = event {
                callback(channel, user);
            }
        });
    }

    /// Called when a user parts a channel, with the channel and the user.
    pub fn on_part<F>(&self, callback: F)
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.on(EventKind::Part, move |event: &Event| {
            if let Event::Part { channel, user } = event {
                callback(channel, user);
            }
        });
    }

    /// Called with the sender, tags and text of a whisper to us.
    pub fn on_whisper<F>(&self, callback: F)
    where
        F: Fn(&str, &Tags, &str) + Send + Sync + 'static,
    {
        self.on(EventKind::Whisper, move |event: &Event| {
            if let Event::Whisper { user, tags, message } = event {
                callback(user, tags, message);
            }
        });
    }
}

/// Registration for the events carrying a channel, tags and a message.
macro_rules! channel_message_listener {
    ($($(#[$doc:meta])* $name:ident => $variant:ident;)*) => {
        impl Client {
            $(
                $(#[$doc])*
                pub fn $name<F>(&self, callback: F)
                where
                    F: Fn(&str, &Tags, &str) + Send + Sync + 'static,
                {
                    self.on(EventKind::$variant, move |event: &Event| {
                        if let Event::$variant { channel, tags, message } = event {
                            callback(channel, tags, message);
                        }
                    });
                }
            )*
        }
    };
}

channel_message_listener! {
    /// Called for `/me` messages.
    on_action => Action;
    /// Called when a user sends a message in a channel.
    on_chat => Chat;
    /// Called when a user resubscribes to a channel.
    on_resub => Resub;
    /// Called when a user gifts a subscription to another user.
    on_sub_gift => SubGift;
    /// Called when a user subscribes to a channel.
    on_subscription => Subscription;
    /// Called when a user cheers bits in a channel.
    on_cheer => Cheer;
}
