use crate::message::Tags;

/// The kinds of event listeners can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Action,
    Chat,
    Resub,
    Notice,
    UserState,
    RoomState,
    SubGift,
    Subscription,
    Cheer,
    Join,
    Part,
    Whisper,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A `/me` message, with the CTCP framing removed.
    Action { channel: String, tags: Tags, message: String },
    Chat { channel: String, tags: Tags, message: String },
    Resub { channel: String, tags: Tags, message: String },
    Notice { message: String },
    UserState { channel: String, tags: Tags },
    RoomState { channel: String, tags: Tags },
    SubGift { channel: String, tags: Tags, message: String },
    Subscription { channel: String, tags: Tags, message: String },
    Cheer { channel: String, tags: Tags, message: String },
    Join { channel: String, user: String },
    Part { channel: String, user: String },
    Whisper { user: String, tags: Tags, message: String },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Action { .. } => EventKind::Action,
            Event::Chat { .. } => EventKind::Chat,
            Event::Resub { .. } => EventKind::Resub,
            Event::Notice { .. } => EventKind::Notice,
            Event::UserState { .. } => EventKind::UserState,
            Event::RoomState { .. } => EventKind::RoomState,
            Event::SubGift { .. } => EventKind::SubGift,
            Event::Subscription { .. } => EventKind::Subscription,
            Event::Cheer { .. } => EventKind::Cheer,
            Event::Join { .. } => EventKind::Join,
            Event::Part { .. } => EventKind::Part,
            Event::Whisper { .. } => EventKind::Whisper,
        }
    }
}
