// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Utils to build shell command plans

use std::fmt::Display;
use std::ops::AddAssign;

/// Separates the sections of a plan
pub const MARKER: &str = "#";

/// An ordered list of shell command lines and comments.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    lines: Vec<String>,
}

/// Impl Display for [`CommandPlan`]. This provides `to_string()`.
impl Display for CommandPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for s in &self.lines {
            writeln!(f, "{s}")?;
        }
        Ok(())
    }
}

impl CommandPlan {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: Vec::with_capacity(8),
        }
    }
    #[must_use]
    pub fn from_string(string: String) -> Self {
        let mut plan = Self::new();
        plan.append(&string);
        plan
    }
    /// Add a comment line
    pub fn comment(&mut self, text: impl Display) {
        self.lines.push(format!("{MARKER} {text}"));
    }
    /// The command lines, without comments and markers
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .map(String::as_str)
            .filter(|l| !l.starts_with(MARKER))
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands().next().is_none()
    }
    fn append(&mut self, line: &str) {
        match self.lines.last() {
            Some(x) if x == MARKER && line == MARKER => {}
            _ => self.lines.push(line.to_owned()),
        }
    }
    fn merge(&mut self, other: &mut Self) {
        self.lines.append(&mut other.lines);
        self.lines.dedup_by(|a, b| a == b && a == MARKER);
    }
}

impl AddAssign<Self> for CommandPlan {
    fn add_assign(&mut self, mut rhs: Self) {
        self.merge(&mut rhs);
    }
}
impl AddAssign<String> for CommandPlan {
    fn add_assign(&mut self, rhs: String) {
        self.append(&rhs);
    }
}
impl AddAssign<&str> for CommandPlan {
    fn add_assign(&mut self, rhs: &str) {
        self.append(rhs);
    }
}

/// Renders a provisioning object into commands
pub trait Render {
    type Context; /* context passed to renderer */
    type Output; /* type of output produced */
    fn render(&self, ctx: &Self::Context) -> Self::Output;
}

/// Quote a word for a POSIX shell, leaving plain words untouched
#[must_use]
pub fn shell_word(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+".contains(c));
    if plain {
        word.to_owned()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_markers_are_deduped() {
        let mut plan = CommandPlan::new();
        plan += MARKER;
        plan += MARKER;
        plan += "ip netns add h1";
        let mut other = CommandPlan::from_string(MARKER.to_owned());
        other += MARKER;
        plan += other;
        plan += MARKER;
        assert_eq!(plan.to_string(), "#\nip netns add h1\n#\n");
        assert_eq!(plan.commands().collect::<Vec<_>>(), vec!["ip netns add h1"]);
    }

    #[test]
    fn test_comments_are_not_commands() {
        let mut plan = CommandPlan::new();
        plan.comment("bridge br1");
        assert!(plan.is_empty());
        assert_eq!(plan.to_string(), "# bridge br1\n");
    }

    #[test]
    fn test_shell_word() {
        assert_eq!(shell_word("/etc/faucet/faucet.yaml"), "/etc/faucet/faucet.yaml");
        assert_eq!(shell_word("my logs"), "'my logs'");
        assert_eq!(shell_word("it's"), r"'it'\''s'");
        assert_eq!(shell_word(""), "''");
    }
}
