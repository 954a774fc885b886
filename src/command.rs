use std::fmt;

/// Capabilities requested right after the welcome reply.
pub const CAPABILITIES: [&str; 3] = ["membership", "commands", "tags"];
pub const CAPABILITY_NAMESPACE: &str = "twitch.tv";

/// Pseudo-channel whispers are routed through.
pub const WHISPER_CHANNEL: &str = "#jtv";

/// An outbound line, without the trailing CRLF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pass(String),
    Nick(String),
    CapReq(Vec<String>),
    Join(String),
    Part(String),
    Privmsg(String, String),
    Pong(String),
}

impl Command {
    pub fn cap_req() -> Self {
        Command::CapReq(
            CAPABILITIES
                .iter()
                .map(|cap| format!("{}/{}", CAPABILITY_NAMESPACE, cap))
                .collect(),
        )
    }

    pub fn join(channel: &str) -> Self {
        Command::Join(channelize(channel))
    }

    pub fn part(channel: &str) -> Self {
        Command::Part(channelize(channel))
    }

    pub fn privmsg(channel: &str, text: &str) -> Self {
        Command::Privmsg(channelize(channel), text.to_string())
    }

    pub fn whisper(user: &str, text: &str) -> Self {
        Command::Privmsg(WHISPER_CHANNEL.to_string(), format!("/w {} {}", user, text))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Pass(pass) => write!(f, "PASS {}", pass),
            Command::Nick(nick) => write!(f, "NICK {}", nick),
            Command::CapReq(caps) => write!(f, "CAP REQ :{}", caps.join(" ")),
            Command::Join(channel) => write!(f, "JOIN {}", channel),
            Command::Part(channel) => write!(f, "PART {}", channel),
            Command::Privmsg(channel, text) => write!(f, "PRIVMSG {} :{}", channel, text),
            Command::Pong(payload) => write!(f, "PONG :{}", payload),
        }
    }
}

/// Prepends `#` unless the name already has it.
pub fn channelize(channel: &str) -> String {
    if channel.starts_with('#') {
        channel.to_string()
    } else {
        format!("#{}", channel)
    }
}

#[test]
fn command_fmt_cap_req() {
    assert_eq!(
        Command::cap_req().to_string(),
        "CAP REQ :twitch.tv/membership twitch.tv/commands twitch.tv/tags"
    );
}

#[test]
fn command_fmt_join_adds_prefix() {
    assert_eq!(Command::join("foo").to_string(), "JOIN #foo");
    assert_eq!(Command::join("#foo").to_string(), "JOIN #foo");
    assert_eq!(Command::part("foo").to_string(), "PART #foo");
}

#[test]
fn command_fmt_privmsg() {
    assert_eq!(Command::privmsg("foo", "hello there").to_string(), "PRIVMSG #foo :hello there");
}

#[test]
fn command_fmt_whisper() {
    assert_eq!(Command::whisper("someone", "psst").to_string(), "PRIVMSG #jtv :/w someone psst");
}

#[test]
fn command_fmt_login() {
    assert_eq!(Command::Pass("oauth:abc".to_string()).to_string(), "PASS oauth:abc");
    assert_eq!(Command::Nick("bot".to_string()).to_string(), "NICK bot");
    assert_eq!(Command::Pong("tmi.twitch.tv".to_string()).to_string(), "PONG :tmi.twitch.tv");
}
