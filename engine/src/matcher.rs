//! Matcher primitives attached to automaton transitions.
//!
//! A matcher inspects the remaining argv, and on success returns the argv
//! left after consumption while appending the raw values it bound to the
//! [`ParseContext`]. Matchers never touch containers directly.

use std::collections::HashMap;

use argmatch_core::{ContainerId, Containers};

use crate::context::ParseContext;

/// Try order of transitions out of one state. Lower is tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Epsilon,
    SingleOption,
    OptionGroup,
    Positional,
    EndOfOptions,
}

/// Alias lookup shared by every option matcher of one automaton.
///
/// Maps each alias (`-f`, `--force`) to its container and whether that
/// container is boolean. Scanning argv needs to know about every declared
/// option, not only the one being matched, to step over foreign options
/// and their values.
#[derive(Debug, Clone, Default)]
pub struct OptionIndex {
    aliases: HashMap<String, (ContainerId, bool)>,
}

impl OptionIndex {
    pub fn from_containers(containers: &Containers) -> Self {
        let aliases = containers
            .aliases()
            .map(|(alias, id)| (alias.to_string(), (id, containers.get(id).is_bool())))
            .collect();
        Self { aliases }
    }

    pub fn lookup(&self, alias: &str) -> Option<(ContainerId, bool)> {
        self.aliases.get(alias).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Matcher {
    /// One positional argument.
    Positional(ContainerId),
    /// One option, wherever it sits among the leading option tokens.
    SingleOption(ContainerId),
    /// Any number of the owned options, in any order, at least one.
    OptionGroup(Vec<ContainerId>),
    /// `--` in a spec: from here on everything is positional.
    EndOfOptions,
    /// Consumes nothing. Only exists until the automaton is simplified.
    Epsilon,
}

impl Matcher {
    pub fn priority(&self) -> Priority {
        match self {
            Matcher::Epsilon => Priority::Epsilon,
            Matcher::SingleOption(_) => Priority::SingleOption,
            Matcher::OptionGroup(_) => Priority::OptionGroup,
            Matcher::Positional(_) => Priority::Positional,
            Matcher::EndOfOptions => Priority::EndOfOptions,
        }
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self, Matcher::Epsilon)
    }

    /// Attempts to match the head of `args`.
    ///
    /// Returns the remaining argv on success. Values bound along the way
    /// are only meaningful when the result is `Some`.
    pub fn matches(
        &self,
        args: &[String],
        ctx: &mut ParseContext,
        index: &OptionIndex,
    ) -> Option<Vec<String>> {
        match self {
            Matcher::Positional(id) => match_positional(*id, args, ctx),
            Matcher::SingleOption(id) => match_option(*id, args, ctx, index),
            Matcher::OptionGroup(ids) => match_group(ids, args, ctx, index),
            Matcher::EndOfOptions => {
                ctx.reject_options = true;
                Some(args.to_vec())
            }
            Matcher::Epsilon => Some(args.to_vec()),
        }
    }

    /// Display label, using `names` indexed by container id.
    pub fn label(&self, names: &[String]) -> String {
        let name = |id: &ContainerId| names.get(id.0).cloned().unwrap_or_else(|| id.to_string());
        match self {
            Matcher::Positional(id) | Matcher::SingleOption(id) => name(id),
            Matcher::OptionGroup(ids) => {
                let inner: Vec<String> = ids.iter().map(name).collect();
                format!("[{}]", inner.join(" "))
            }
            Matcher::EndOfOptions => "--".to_string(),
            Matcher::Epsilon => "*".to_string(),
        }
    }
}

fn is_option_shaped(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

fn match_positional(id: ContainerId, args: &[String], ctx: &mut ParseContext) -> Option<Vec<String>> {
    let head = args.first()?;
    if !ctx.reject_options && is_option_shaped(head) {
        return None;
    }
    ctx.push(id, head.as_str());
    Some(args[1..].to_vec())
}

/// Outcome of inspecting one argv token while looking for an option.
enum Scan {
    Matched(Vec<String>),
    /// Not the wanted option; step over this many tokens.
    Skip(usize),
    /// Cannot look further.
    Stop,
}

fn match_option(
    target: ContainerId,
    args: &[String],
    ctx: &mut ParseContext,
    index: &OptionIndex,
) -> Option<Vec<String>> {
    if ctx.reject_options {
        return None;
    }

    let mut idx = 0;
    while idx < args.len() {
        let arg = args[idx].as_str();
        let scan = match arg {
            "-" => Scan::Skip(1),
            "--" => Scan::Stop,
            _ if arg.starts_with("--") => scan_long(target, args, idx, ctx, index),
            _ if arg.starts_with('-') => scan_short(target, args, idx, ctx, index),
            _ => Scan::Stop,
        };
        match scan {
            Scan::Matched(rest) => return Some(rest),
            Scan::Skip(n) => idx += n,
            Scan::Stop => return None,
        }
    }
    None
}

fn scan_long(
    target: ContainerId,
    args: &[String],
    idx: usize,
    ctx: &mut ParseContext,
    index: &OptionIndex,
) -> Scan {
    let arg = args[idx].as_str();
    let (name, inline) = match arg.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (arg, None),
    };
    let Some((id, is_bool)) = index.lookup(name) else {
        return Scan::Stop;
    };

    if let Some(value) = inline {
        if id != target {
            return Scan::Skip(1);
        }
        ctx.push(target, value);
        return Scan::Matched(without(args, idx, 1));
    }

    if is_bool {
        if id != target {
            return Scan::Skip(1);
        }
        ctx.push(target, "true");
        return Scan::Matched(without(args, idx, 1));
    }

    if idx + 1 >= args.len() {
        return Scan::Stop;
    }
    if id != target {
        return Scan::Skip(2);
    }
    ctx.push(target, args[idx + 1].as_str());
    Scan::Matched(without(args, idx, 2))
}

fn scan_short(
    target: ContainerId,
    args: &[String],
    idx: usize,
    ctx: &mut ParseContext,
    index: &OptionIndex,
) -> Scan {
    let cluster = &args[idx][1..];

    if let Some((letters, value)) = cluster.split_once('=') {
        let Some((id, _)) = index.lookup(&format!("-{letters}")) else {
            return Scan::Stop;
        };
        if id != target {
            return Scan::Skip(1);
        }
        ctx.push(target, value);
        return Scan::Matched(without(args, idx, 1));
    }

    for (pos, letter) in cluster.char_indices() {
        let Some((id, is_bool)) = index.lookup(&format!("-{letter}")) else {
            return Scan::Stop;
        };
        let before = &cluster[..pos];
        let rest = &cluster[pos + letter.len_utf8()..];

        if is_bool {
            if id != target {
                continue;
            }
            ctx.push(target, "true");
            return Scan::Matched(replace_cluster(args, idx, 1, &format!("{before}{rest}")));
        }

        if rest.is_empty() {
            if idx + 1 >= args.len() {
                return Scan::Stop;
            }
            if id != target {
                return Scan::Skip(2);
            }
            ctx.push(target, args[idx + 1].as_str());
            return Scan::Matched(replace_cluster(args, idx, 2, before));
        }

        if id != target {
            return Scan::Skip(1);
        }
        ctx.push(target, rest);
        return Scan::Matched(replace_cluster(args, idx, 1, before));
    }

    // every letter was a boolean belonging to someone else
    Scan::Skip(1)
}

fn without(args: &[String], idx: usize, count: usize) -> Vec<String> {
    let mut rest = args.to_vec();
    rest.drain(idx..idx + count);
    rest
}

/// Removes `count` tokens at `idx`, leaving `-<letters>` behind when some
/// letters of the cluster are still unmatched.
fn replace_cluster(args: &[String], idx: usize, count: usize, letters: &str) -> Vec<String> {
    if letters.is_empty() {
        return without(args, idx, count);
    }
    let mut rest = args.to_vec();
    rest[idx] = format!("-{letters}");
    rest.drain(idx + 1..idx + count);
    rest
}

fn weight(args: &[String]) -> usize {
    args.iter().map(String::len).sum()
}

fn match_group(
    ids: &[ContainerId],
    args: &[String],
    ctx: &mut ParseContext,
    index: &OptionIndex,
) -> Option<Vec<String>> {
    if ctx.reject_options || args.is_empty() {
        return None;
    }

    let mut current = args.to_vec();
    let mut matched = false;
    'rounds: loop {
        let mut progressed = false;
        for &id in ids {
            let Some(next) = match_option(id, &current, ctx, index) else {
                continue;
            };
            matched = true;
            let stalled = weight(&next) >= weight(&current);
            current = next;
            if stalled {
                break 'rounds;
            }
            progressed = true;
        }
        if !progressed {
            break;
        }
    }

    matched.then_some(current)
}
