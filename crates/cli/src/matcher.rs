// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pattern matching from raw log lines to [`PlayerEvent`]s.
//!
//! Each grammar contributes an ordered list of rules. Rules are tried
//! join → leave → whitelist, and the first match wins. Captures use the
//! named groups `player` and (for the proxy grammar) `server`.

use std::sync::OnceLock;

use regex::Regex;

use crate::event::PlayerEvent;

/// Which server log dialect to recognize.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    /// Vanilla/Paper server `latest.log`.
    #[default]
    Standard,
    /// Velocity proxy log, where players are routed between backend servers.
    Velocity,
}

impl std::fmt::Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Velocity => f.write_str("velocity"),
        }
    }
}

impl std::str::FromStr for Grammar {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "velocity" => Ok(Self::Velocity),
            other => anyhow::bail!("invalid grammar: {other} (expected standard or velocity)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Join,
    Leave,
    WhitelistReject,
}

const NOT_WHITELISTED: &str = r"You are not white-listed on this server!";

fn rule_sources(grammar: Grammar) -> Vec<(Category, String)> {
    match grammar {
        Grammar::Standard => vec![
            (Category::Join, r"\[Server thread/INFO\]: (?P<player>\w+) joined the game".to_owned()),
            (Category::Leave, r"\[Server thread/INFO\]: (?P<player>\w+) left the game".to_owned()),
            (
                Category::WhitelistReject,
                format!(r"\[Server thread/INFO\]: (?P<player>\w+) was kicked due to: {NOT_WHITELISTED}"),
            ),
            // Rejection while the login is disconnected. Older servers print
            // the whole GameProfile, newer ones just the name.
            (
                Category::WhitelistReject,
                format!(
                    r"\[Server thread/INFO\]: Disconnecting (?:com\.mojang\.authlib\.GameProfile@\w+\[[^\]]*?name=)?(?P<player>\w+)[^(]*\([^)]*\): {NOT_WHITELISTED}"
                ),
            ),
        ],
        Grammar::Velocity => vec![
            (
                Category::Join,
                r"\[server connection\] (?P<player>\w+) -> (?P<server>[\w.-]+) has connected"
                    .to_owned(),
            ),
            (
                Category::Leave,
                r"\[server connection\] (?P<player>\w+) -> (?P<server>[\w.-]+) has disconnected"
                    .to_owned(),
            ),
            (
                Category::WhitelistReject,
                format!(
                    r"\[connected player\] (?P<player>\w+) \([^)]*\):? unable to connect to server (?P<server>[\w.-]+): {NOT_WHITELISTED}"
                ),
            ),
        ],
    }
}

struct Rule {
    category: Category,
    pattern: Regex,
}

/// Compiled rule set for one grammar.
pub struct Matcher {
    grammar: Grammar,
    rules: Vec<Rule>,
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("grammar", &self.grammar)
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl Matcher {
    pub fn new(grammar: Grammar) -> anyhow::Result<Self> {
        let rules = rule_sources(grammar)
            .into_iter()
            .map(|(category, src)| Ok(Rule { category, pattern: Regex::new(&src)? }))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { grammar, rules })
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// Classify one log line. Returns `None` when no rule matches.
    pub fn match_line(&self, line: &str) -> Option<PlayerEvent> {
        self.rules.iter().find_map(|rule| {
            let caps = rule.pattern.captures(line)?;
            let player = caps.name("player")?.as_str().to_owned();
            let server = caps.name("server").map(|m| m.as_str().to_owned());
            Some(match rule.category {
                Category::Join => PlayerEvent::Join { player, server },
                Category::Leave => PlayerEvent::Leave { player, server },
                Category::WhitelistReject => PlayerEvent::WhitelistReject { player, server },
            })
        })
    }
}

/// Classify `line` under `grammar` using a process-wide compiled matcher.
///
/// Fails only if the grammar's patterns do not compile; the failure is
/// cached and returned on every call.
pub fn match_line(line: &str, grammar: Grammar) -> anyhow::Result<Option<PlayerEvent>> {
    static STANDARD: OnceLock<Result<Matcher, String>> = OnceLock::new();
    static VELOCITY: OnceLock<Result<Matcher, String>> = OnceLock::new();

    let cell = match grammar {
        Grammar::Standard => &STANDARD,
        Grammar::Velocity => &VELOCITY,
    };
    match cell.get_or_init(|| Matcher::new(grammar).map_err(|e| format!("{e:#}"))) {
        Ok(matcher) => Ok(matcher.match_line(line)),
        Err(e) => anyhow::bail!("{grammar} patterns failed to compile: {e}"),
    }
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
