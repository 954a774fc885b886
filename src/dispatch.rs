use crate::client::Session;
use crate::command::Command;
use crate::event::Event;
use crate::message::Message;

const ACTION_MARKER: &str = "\u{1}ACTION";

impl Session {
    /// Hands `message` to the listeners it is meant for, on the calling task.
    ///
    /// Listeners run in order and to completion before this returns; PINGs are
    /// answered through the outbound queue like any other line.
    pub(crate) fn dispatch(&self, message: &Message) {
        if message.command == "PING" {
            self.send(Command::Pong(message.param(0).to_string()));
            return;
        }

        if let Some(event) = classify(message) {
            self.registry.emit(&event);
        }
    }
}

/// The event a received message maps to, if any.
pub fn classify(message: &Message) -> Option<Event> {
    let channel = message.param(0).to_string();
    let tags = message.tags.clone();
    let body = message.param(1);

    let event = match message.command.as_str() {
        "PRIVMSG" => {
            if let Some(action) = body.strip_prefix(ACTION_MARKER) {
                Event::Action {
                    channel,
                    tags,
                    message: strip_action(action).to_string(),
                }
            } else if message.tags.contains_key("bits") {
                Event::Cheer {
                    channel,
                    tags,
                    message: body.to_string(),
                }
            } else {
                Event::Chat {
                    channel,
                    tags,
                    message: body.to_string(),
                }
            }
        }
        "JOIN" => Event::Join {
            channel,
            user: message.nick.clone(),
        },
        "PART" => Event::Part {
            channel,
            user: message.nick.clone(),
        },
        "NOTICE" => Event::Notice {
            message: body.to_string(),
        },
        "USERSTATE" => Event::UserState { channel, tags },
        "ROOMSTATE" => Event::RoomState { channel, tags },
        "USERNOTICE" => {
            let text = body.to_string();
            match message.tags.get("msg-id").map(String::as_str) {
                Some("resub") => Event::Resub { channel, tags, message: text },
                Some("sub") => Event::Subscription { channel, tags, message: text },
                Some("subgift") => Event::SubGift { channel, tags, message: text },
                _ => return None,
            }
        }
        "WHISPER" => Event::Whisper {
            user: message.nick.clone(),
            tags,
            message: body.to_string(),
        },
        _ => return None,
    };

    Some(event)
}

/// Strips the space after the marker and the closing `\x01`.
fn strip_action(action: &str) -> &str {
    let action = action.strip_prefix(' ').unwrap_or(action);
    action.strip_suffix('\u{1}').unwrap_or(action)
}
