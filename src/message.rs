use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

pub type Tags = HashMap<String, String>;

static LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:@(?P<tags>\S*) +)?(?::(?P<prefix>\S*) +)?(?P<command>[^ ]*)(?P<params>.*)$")
        .expect("line pattern is valid")
});

/// A received line split into its parts.
///
/// Parsing never fails: a line with no tags yields an empty tag map, a line
/// with no prefix yields an empty nick.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Message {
    pub tags: Tags,
    /// The `nick` of a `nick!user@host` prefix, or the whole prefix for a server.
    pub nick: String,
    pub command: String,
    pub params: Vec<String>,
}

impl Message {
    pub fn parse(line: &str) -> Message {
        let line = line.trim_end_matches(['\r', '\n']);

        let Some(caps) = LINE.captures(line) else {
            return Message::default();
        };

        let tags = caps.name("tags").map(|m| parse_tags(m.as_str())).unwrap_or_default();

        let nick = match caps.name("prefix").map(|m| m.as_str()) {
            Some(prefix) => prefix.split(['!', '@']).next().unwrap_or_default().to_string(),
            None => String::new(),
        };

        let command = caps.name("command").map(|m| m.as_str()).unwrap_or_default().to_string();

        let params = caps.name("params").map(|m| parse_params(m.as_str())).unwrap_or_default();

        Message {
            tags,
            nick,
            command,
            params,
        }
    }

    /// The parameter at `index`, or `""` when the line was short.
    pub fn param(&self, index: usize) -> &str {
        self.params.get(index).map(String::as_str).unwrap_or_default()
    }
}

fn parse_tags(raw: &str) -> Tags {
    raw.split(';')
        .filter(|tag| !tag.is_empty())
        .map(|tag| match tag.split_once('=') {
            Some((key, value)) => (key.to_string(), unescape_tag_value(value)),
            None => (tag.to_string(), String::new()),
        })
        .collect()
}

fn unescape_tag_value(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }

        match chars.next() {
            Some(':') => unescaped.push(';'),
            Some('s') => unescaped.push(' '),
            Some('r') => unescaped.push('\r'),
            Some('n') => unescaped.push('\n'),
            Some(other) => unescaped.push(other),
            // A lone trailing backslash is dropped
            None => {}
        }
    }

    unescaped
}

fn parse_params(mut rest: &str) -> Vec<String> {
    let mut params = Vec::new();

    loop {
        rest = rest.trim_start_matches(' ');

        if rest.is_empty() {
            break;
        }

        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing.to_string());
            break;
        }

        match rest.split_once(' ') {
            Some((param, remainder)) => {
                params.push(param.to_string());
                rest = remainder;
            }
            None => {
                params.push(rest.to_string());
                break;
            }
        }
    }

    params
}
