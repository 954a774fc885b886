use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use twirc::{Client, Error, Options};

/// The server end of a client connection.
struct Server<S> {
    lines: Lines<BufReader<ReadHalf<S>>>,
    writer: WriteHalf<S>,
}

impl<S: AsyncRead + AsyncWrite> Server<S> {
    fn new(stream: S) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn expect(&mut self, line: &str) {
        assert_eq!(self.lines.next_line().await.unwrap().as_deref(), Some(line));
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(format!("{}\r\n", line).as_bytes()).await.unwrap();
    }

    async fn handshake(&mut self) {
        self.expect("PASS oauth:secret").await;
        self.expect("NICK bot").await;
        self.send(":tmi.twitch.tv 001 bot :Welcome, GLHF!").await;
        self.expect("CAP REQ :twitch.tv/membership twitch.tv/commands twitch.tv/tags").await;
    }
}

fn options() -> Options {
    Options::builder().host("localhost").channel("foo").build().unwrap()
}

fn spawn_connect(client: &Client) -> (JoinHandle<Result<(), Error>>, Server<DuplexStream>) {
    let (local, remote) = tokio::io::duplex(4096);
    let client = client.clone();
    let session = tokio::spawn(async move {
        client
            .connect_with("bot", "oauth:secret", move || async move { Ok::<_, io::Error>(local) })
            .await
    });

    (session, Server::new(remote))
}

async fn start(client: &Client) -> (JoinHandle<Result<(), Error>>, Server<DuplexStream>) {
    let (session, mut server) = spawn_connect(client);
    server.handshake().await;
    server.expect("JOIN #foo").await;
    (session, server)
}

#[tokio::test]
async fn lifecycle() {
    let client = Client::new(options());
    assert!(!client.connected());

    let (session, mut server) = start(&client).await;
    assert!(client.connected());

    let second = client
        .connect_with("bot", "oauth:secret", || async { Err::<DuplexStream, _>(io::Error::other("never dialed")) })
        .await;
    assert!(matches!(second, Err(Error::AlreadyConnected)));
    assert!(client.connected());

    server.send("PING :tmi.twitch.tv").await;
    server.expect("PONG :tmi.twitch.tv").await;

    client.say("foo", "hi");
    server.expect("PRIVMSG #foo :hi").await;
    client.whisper("someone", "psst");
    server.expect("PRIVMSG #jtv :/w someone psst").await;
    client.join("#bar");
    server.expect("JOIN #bar").await;
    client.part("bar");
    server.expect("PART #bar").await;

    client.disconnect();
    let result = session.await.unwrap();
    assert!(matches!(result, Err(Error::Read(ref e)) if e.kind() == io::ErrorKind::ConnectionAborted));
    assert!(!client.connected());

    client.say("foo", "too late");
    assert_eq!(server.lines.next_line().await.unwrap(), None);
}

#[tokio::test]
async fn listeners_see_events_in_order() {
    let client = Client::new(options());
    let (events, mut seen) = mpsc::unbounded_channel();

    let tx = events.clone();
    client.on_chat(move |channel, _tags, message| tx.send(format!("chat {} {}", channel, message)).unwrap());
    let tx = events.clone();
    client.on_action(move |channel, _tags, message| tx.send(format!("action {} {}", channel, message)).unwrap());
    let tx = events.clone();
    client.on_cheer(move |channel, tags, message| tx.send(format!("cheer {} {} {}", channel, tags["bits"], message)).unwrap());
    let tx = events.clone();
    client.on_join(move |channel, user| tx.send(format!("join {} {}", channel, user)).unwrap());
    let tx = events.clone();
    client.on_whisper(move |user, _tags, message| tx.send(format!("whisper {} {}", user, message)).unwrap());
    let tx = events.clone();
    client.on_subscription(move |channel, tags, _message| tx.send(format!("sub {} {}", channel, tags["login"])).unwrap());

    let (session, mut server) = start(&client).await;

    server.send(":bar!bar@bar.tmi.twitch.tv JOIN #foo").await;
    server.send(":bar!bar@bar.tmi.twitch.tv PRIVMSG #foo :hello").await;
    server.send(":bar!bar@bar.tmi.twitch.tv PRIVMSG #foo :\u{1}ACTION waves\u{1}").await;
    server.send("@bits=100 :bar!bar@bar.tmi.twitch.tv PRIVMSG #foo :cheer100 nice").await;
    server.send("@msg-id=sub;login=bar :tmi.twitch.tv USERNOTICE #foo").await;
    server.send(":bar!bar@bar.tmi.twitch.tv WHISPER bot :psst").await;

    for expected in [
        "join #foo bar",
        "chat #foo hello",
        "action #foo waves",
        "cheer #foo 100 cheer100 nice",
        "sub #foo bar",
        "whisper bar psst",
    ] {
        assert_eq!(seen.recv().await.unwrap(), expected);
    }

    client.disconnect();
    session.await.unwrap().unwrap_err();
}

#[tokio::test]
async fn handshake_failure_reaches_notice_listeners() {
    let client = Client::new(options());
    let (notices, mut seen) = mpsc::unbounded_channel();
    client.on_notice(move |message| notices.send(message.to_string()).unwrap());

    let (session, mut server) = spawn_connect(&client);
    server.expect("PASS oauth:secret").await;
    server.expect("NICK bot").await;
    server.send(":tmi.twitch.tv NOTICE * :Login authentication failed").await;

    let result = session.await.unwrap();
    match result {
        Err(Error::Handshake(line)) => assert_eq!(line, ":tmi.twitch.tv NOTICE * :Login authentication failed"),
        other => panic!("expected handshake failure, got {:?}", other),
    }

    assert_eq!(seen.recv().await.unwrap(), "Login authentication failed");
    assert!(!client.connected());
}

#[tokio::test]
async fn dial_failure_then_reconnect() {
    let client = Client::new(options());

    let result = client
        .connect_with("bot", "oauth:secret", || async { Err::<DuplexStream, _>(io::Error::from(io::ErrorKind::ConnectionRefused)) })
        .await;
    assert!(matches!(result, Err(Error::Dial(ref e)) if e.kind() == io::ErrorKind::ConnectionRefused));
    assert!(!client.connected());

    let (session, _server) = start(&client).await;
    assert!(client.connected());
    client.disconnect();
    session.await.unwrap().unwrap_err();

    let (session, _server) = start(&client).await;
    assert!(client.connected());
    client.disconnect();
    session.await.unwrap().unwrap_err();
}

#[tokio::test]
async fn old_session_teardown_spares_reconnect() {
    let client = Client::new(options());

    let (local, remote) = tokio::io::duplex(4096);
    let old = client.connect_with("bot", "oauth:secret", move || async move { Ok::<_, io::Error>(local) });
    tokio::pin!(old);
    let mut old_server = Server::new(remote);

    tokio::select! {
        result = &mut old => panic!("session ended during handshake: {:?}", result),
        _ = async {
            old_server.handshake().await;
            old_server.expect("JOIN #foo").await;
        } => {}
    }

    client.disconnect();
    let (session, mut server) = start(&client).await;
    assert!(client.connected());

    // The old receive loop only sees its disconnect now, after the reconnect
    let result = old.await;
    assert!(matches!(result, Err(Error::Read(ref e)) if e.kind() == io::ErrorKind::ConnectionAborted));
    tokio::task::yield_now().await;
    assert!(client.connected());

    server.send("PING :tmi.twitch.tv").await;
    server.expect("PONG :tmi.twitch.tv").await;

    client.disconnect();
    session.await.unwrap().unwrap_err();
}

#[tokio::test]
async fn disconnect_while_dialing_cancels_connect() {
    let client = Client::new(options());

    let (local, _remote) = tokio::io::duplex(4096);
    let handle = client.clone();
    let result = client
        .connect_with("bot", "oauth:secret", move || async move {
            handle.disconnect();
            Ok::<_, io::Error>(local)
        })
        .await;
    assert!(matches!(result, Err(Error::Dial(ref e)) if e.kind() == io::ErrorKind::ConnectionAborted));
    assert!(!client.connected());

    let (session, _server) = start(&client).await;
    assert!(client.connected());
    client.disconnect();
    session.await.unwrap().unwrap_err();
}

#[tokio::test]
async fn silent_server_times_out() {
    let options = Options::builder()
        .host("localhost")
        .read_timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let client = Client::new(options);

    let (session, mut server) = spawn_connect(&client);
    server.handshake().await;

    let result = session.await.unwrap();
    assert!(matches!(result, Err(Error::Read(ref e)) if e.kind() == io::ErrorKind::TimedOut));
    assert!(!client.connected());
}

#[tokio::test]
async fn connects_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let options = Options::builder().host("127.0.0.1").port(port).channel("foo").build().unwrap();
    let client = Client::new(options);

    let connecting = client.clone();
    let session = tokio::spawn(async move { connecting.connect("bot", "oauth:secret").await });

    let (stream, _) = listener.accept().await.unwrap();
    let mut server = Server::new(stream);
    server.handshake().await;
    server.expect("JOIN #foo").await;
    assert!(client.connected());

    drop(server);

    let result = session.await.unwrap();
    assert!(matches!(result, Err(Error::Read(_))));
    assert!(!client.connected());
}
