use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("already connected")]
    AlreadyConnected,

    #[error("could not connect to server: {0}")]
    Dial(#[source] std::io::Error),

    #[error("unexpected server response: {0}")]
    Handshake(String),

    #[error("read from server failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("write to server failed: {0}")]
    Write(#[source] std::io::Error),
}

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("options builder is missing a host! Set it using `builder.host(...)`")]
    HostMissing,

    #[error("could not parse options: {0}")]
    Toml(#[from] toml::de::Error),
}
