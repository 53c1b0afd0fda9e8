//! Parsed view of the `server_name` directives in a server-block artifact.
//!
//! # Responsibilities
//! - Split artifact text into untouched lines and `server_name` directives
//! - Add an alias (and its `www.` variant) to every directive
//! - Remove exactly that pair again
//! - Re-render only the directives that changed
//!
//! # Design Decisions
//! - A directive is recognized only when it fits on one line and ends with `;`
//! - Untouched lines keep their original bytes, including `\r\n` endings
//! - Every name keeps the whitespace in front of it; added names get one space
//!   and go after the last name, so removing them restores the line exactly

use crate::domain::Fqdn;

const DIRECTIVE: &str = "server_name";

#[derive(Debug, Clone, PartialEq, Eq)]
struct ServerName {
    /// Whitespace in front of the name, exactly as read.
    separator: String,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ServerNameLine {
    indent: String,
    names: Vec<ServerName>,
    /// Whitespace between the last name and the `;`.
    before_semicolon: String,
    /// Whatever followed the `;`, line ending included.
    trailing: String,
}

impl ServerNameLine {
    fn parse(line: &str) -> Option<Self> {
        let (content, ending) = split_line_ending(line);
        let body = content.trim_start();
        let rest = body.strip_prefix(DIRECTIVE)?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }

        let semicolon = rest.rfind(';')?;
        let after = &rest[semicolon + 1..];
        if !after.trim().is_empty() {
            return None;
        }

        let mut names = Vec::new();
        let mut remaining = &rest[..semicolon];
        loop {
            let name_start = remaining
                .find(|c: char| !c.is_whitespace())
                .unwrap_or(remaining.len());
            if name_start == remaining.len() {
                break;
            }
            let name_len = remaining[name_start..]
                .find(char::is_whitespace)
                .unwrap_or(remaining.len() - name_start);
            names.push(ServerName {
                separator: remaining[..name_start].to_string(),
                name: remaining[name_start..name_start + name_len].to_string(),
            });
            remaining = &remaining[name_start + name_len..];
        }

        Some(Self {
            indent: content[..content.len() - body.len()].to_string(),
            names,
            before_semicolon: remaining.to_string(),
            trailing: format!("{after}{ending}"),
        })
    }

    fn render_into(&self, out: &mut String) {
        out.push_str(&self.indent);
        out.push_str(DIRECTIVE);
        for entry in &self.names {
            out.push_str(&entry.separator);
            out.push_str(&entry.name);
        }
        out.push_str(&self.before_semicolon);
        out.push(';');
        out.push_str(&self.trailing);
    }

    fn push(&mut self, name: String) {
        self.names.push(ServerName {
            separator: " ".to_string(),
            name,
        });
    }

    fn pair_position(&self, alias: &str, www: &str) -> Option<usize> {
        self.names
            .windows(2)
            .position(|pair| pair[0].name == alias && pair[1].name == www)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Verbatim(String),
    ServerName(ServerNameLine),
}

/// A server-block artifact with its `server_name` directives parsed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerNameDocument {
    lines: Vec<Line>,
}

impl ServerNameDocument {
    pub fn parse(text: &str) -> Self {
        let lines = text
            .split_inclusive('\n')
            .map(|line| match ServerNameLine::parse(line) {
                Some(directive) => Line::ServerName(directive),
                None => Line::Verbatim(line.to_string()),
            })
            .collect();
        Self { lines }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Verbatim(text) => out.push_str(text),
                Line::ServerName(directive) => directive.render_into(&mut out),
            }
        }
        out
    }

    fn directives(&self) -> impl Iterator<Item = &ServerNameLine> {
        self.lines.iter().filter_map(|line| match line {
            Line::ServerName(directive) => Some(directive),
            Line::Verbatim(_) => None,
        })
    }

    fn directives_mut(&mut self) -> impl Iterator<Item = &mut ServerNameLine> {
        self.lines.iter_mut().filter_map(|line| match line {
            Line::ServerName(directive) => Some(directive),
            Line::Verbatim(_) => None,
        })
    }

    /// Number of `server_name` directives found.
    pub fn directive_count(&self) -> usize {
        self.directives().count()
    }

    /// Every name listed by the first directive, in order.
    pub fn names(&self) -> Vec<String> {
        self.directives()
            .next()
            .map(|directive| directive.names.iter().map(|n| n.name.clone()).collect())
            .unwrap_or_default()
    }

    /// True if any directive lists `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.directives()
            .any(|directive| directive.names.iter().any(|n| n.name == name))
    }

    /// Append `alias www.alias` to every directive; returns how many changed.
    pub fn add_alias(&mut self, alias: &Fqdn) -> usize {
        let mut changed = 0;
        for directive in self.directives_mut() {
            directive.push(alias.to_string());
            directive.push(alias.www());
            changed += 1;
        }
        changed
    }

    /// Remove the `alias www.alias` pair from every directive that has it;
    /// returns how many changed.
    pub fn remove_alias(&mut self, alias: &Fqdn) -> usize {
        let www = alias.www();
        let mut changed = 0;
        for directive in self.directives_mut() {
            if let Some(pos) = directive.pair_position(alias.as_str(), &www) {
                directive.names.drain(pos..pos + 2);
                changed += 1;
            }
        }
        changed
    }

    /// Hostnames attached as aliases next to `primary` (their `www.` twins omitted).
    pub fn aliases_of(&self, primary: &str) -> Vec<String> {
        let names = self.names();
        let primary_www = format!("www.{primary}");
        let mut aliases = Vec::new();
        let mut iter = names.iter().peekable();
        while let Some(name) = iter.next() {
            if name == primary || *name == primary_www {
                continue;
            }
            if iter.peek().is_some_and(|next| **next == format!("www.{name}")) {
                iter.next();
            }
            aliases.push(name.clone());
        }
        aliases
    }
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}
