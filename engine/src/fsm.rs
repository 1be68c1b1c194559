//! The matching automaton.
//!
//! States live in an arena and refer to each other by [`StateId`], so the
//! cycles introduced by repetition and the targets shared between
//! alternatives need no reference counting. A compiled automaton is
//! prepared once (epsilon elimination, then a stable priority sort) and is
//! read-only afterwards; matching only ever allocates per-attempt
//! [`ParseContext`]s.

use std::collections::HashSet;
use std::fmt;
use std::ops::{Index, IndexMut};

use argmatch_core::Containers;
use tracing::{debug, trace};

use crate::context::ParseContext;
use crate::error::MatchError;
use crate::matcher::{Matcher, OptionIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub u32);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub matcher: Matcher,
    pub next: StateId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    /// Input may legally end here.
    pub terminal: bool,
    pub transitions: Vec<Transition>,
}

/// A usage spec compiled into a graph of matcher transitions.
#[derive(Debug, Clone)]
pub struct Automaton {
    states: Vec<State>,
    start: StateId,
    index: OptionIndex,
    /// Container names by id, for rendering.
    labels: Vec<String>,
}

impl Index<StateId> for Automaton {
    type Output = State;

    fn index(&self, id: StateId) -> &State {
        &self.states[id.0 as usize]
    }
}

impl IndexMut<StateId> for Automaton {
    fn index_mut(&mut self, id: StateId) -> &mut State {
        &mut self.states[id.0 as usize]
    }
}

impl Automaton {
    /// An automaton without states whose matchers will refer to
    /// `containers`.
    pub fn new(containers: &Containers) -> Self {
        Self {
            states: Vec::new(),
            start: StateId(0),
            index: OptionIndex::from_containers(containers),
            labels: containers.iter().map(|(_, c)| c.name.clone()).collect(),
        }
    }

    pub fn add_state(&mut self) -> StateId {
        let id = StateId(self.states.len() as u32);
        self.states.push(State::default());
        id
    }

    pub fn add_transition(&mut self, from: StateId, matcher: Matcher, next: StateId) {
        self[from].transitions.push(Transition { matcher, next });
    }

    /// Copies every outgoing transition of `from` onto `to`.
    pub fn copy_transitions(&mut self, from: StateId, to: StateId) {
        let copied = self[from].transitions.clone();
        self[to].transitions.extend(copied);
    }

    pub fn set_terminal(&mut self, id: StateId) {
        self[id].terminal = true;
    }

    pub fn set_start(&mut self, id: StateId) {
        self.start = id;
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Number of transitions across states reachable from the start.
    pub fn transition_count(&self) -> usize {
        self.reachable()
            .into_iter()
            .map(|id| self[id].transitions.len())
            .sum()
    }

    /// Eliminates epsilon transitions, then sorts transitions by priority.
    pub fn prepare(&mut self) {
        self.simplify();
        self.sort();
    }

    /// Replaces every epsilon transition by the transitions of its target.
    ///
    /// States are handled depth-first, children before parents, so most
    /// targets are already epsilon-free when spliced. A target reached
    /// through several epsilons is only spliced once per state, which keeps
    /// epsilon cycles from being expanded forever.
    pub fn simplify(&mut self) {
        let mut visited = vec![false; self.states.len()];
        self.simplify_from(self.start, &mut visited);
    }

    fn simplify_from(&mut self, id: StateId, visited: &mut [bool]) {
        if std::mem::replace(&mut visited[id.0 as usize], true) {
            return;
        }
        let targets: Vec<StateId> = self[id].transitions.iter().map(|t| t.next).collect();
        for next in targets {
            self.simplify_from(next, visited);
        }
        self.absorb_epsilons(id);
    }

    fn absorb_epsilons(&mut self, id: StateId) {
        let mut absorbed = HashSet::new();
        while let Some(pos) = self[id]
            .transitions
            .iter()
            .position(|t| t.matcher.is_epsilon())
        {
            let target = self[id].transitions.remove(pos).next;
            if !absorbed.insert(target) {
                continue;
            }
            if self[target].terminal {
                self[id].terminal = true;
            }
            for tr in self[target].transitions.clone() {
                if !self[id].transitions.contains(&tr) {
                    self[id].transitions.push(tr);
                }
            }
        }
    }

    /// Stable sort of every reachable state's transitions by priority.
    pub fn sort(&mut self) {
        for id in self.reachable() {
            self[id]
                .transitions
                .sort_by_key(|t| t.matcher.priority());
        }
    }

    /// State ids reachable from the start, in depth-first discovery order.
    fn reachable(&self) -> Vec<StateId> {
        if self.states.is_empty() {
            return Vec::new();
        }
        let mut seen = vec![false; self.states.len()];
        let mut order = Vec::new();
        let mut stack = vec![self.start];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.0 as usize], true) {
                continue;
            }
            order.push(id);
            for tr in self[id].transitions.iter().rev() {
                stack.push(tr.next);
            }
        }
        order
    }

    /// Matches `args` and returns the bindings of the first successful
    /// path, or `None` when no path consumes the whole argv.
    pub fn matches(&self, args: &[String]) -> Option<ParseContext> {
        if self.states.is_empty() {
            return None;
        }
        let mut ctx = ParseContext::new();
        self.apply(self.start, args, &mut ctx, 0).then_some(ctx)
    }

    fn apply(&self, id: StateId, args: &[String], ctx: &mut ParseContext, idle: usize) -> bool {
        let state = &self[id];
        if state.terminal && args.is_empty() {
            return true;
        }

        let mut rest = args;
        if !ctx.reject_options && rest.first().is_some_and(|a| a == "--") {
            ctx.reject_options = true;
            rest = &rest[1..];
        }

        for tr in &state.transitions {
            let mut child = ParseContext::with_reject_options(ctx.reject_options);
            let Some(remaining) = tr.matcher.matches(rest, &mut child, &self.index) else {
                continue;
            };
            trace!(from = %id, to = %tr.next, matcher = ?tr.matcher, remaining = remaining.len(), "transition matched");

            // A path may only stand still for so long: consuming nothing
            // more often than there are states means it is going in circles.
            let idle = if remaining.as_slice() == args { idle + 1 } else { 0 };
            if idle > self.states.len() {
                continue;
            }

            if self.apply(tr.next, &remaining, &mut child, idle) {
                ctx.merge(child);
                return true;
            }
        }
        false
    }

    /// Matches `args` and binds the matched values into `containers`.
    ///
    /// # Errors
    ///
    /// [`MatchError::IncorrectUsage`] when argv does not match, or
    /// [`MatchError::InvalidValue`] when a matched value does not convert
    /// to its container's type.
    pub fn parse(&self, args: &[String], containers: &mut Containers) -> Result<(), MatchError> {
        let Some(ctx) = self.matches(args) else {
            debug!(?args, "argv does not match usage");
            return Err(MatchError::IncorrectUsage);
        };
        finalize(&ctx, containers)
    }

    /// Graphviz rendering; terminal states get a double border.
    pub fn to_dot(&self) -> String {
        let mut lines = Vec::new();
        if !self.states.is_empty() {
            let mut visited = vec![false; self.states.len()];
            self.dot_lines(self.start, &mut visited, &mut lines);
        }
        format!("digraph G {{\n\trankdir=LR\n{}\n}}\n", lines.join("\n"))
    }

    fn dot_lines(&self, id: StateId, visited: &mut [bool], lines: &mut Vec<String>) {
        if std::mem::replace(&mut visited[id.0 as usize], true) {
            return;
        }
        for tr in &self[id].transitions {
            lines.push(format!(
                "\t{id} -> {} [label=\"{}\"]",
                tr.next,
                tr.matcher.label(&self.labels)
            ));
            self.dot_lines(tr.next, visited, lines);
        }
        if self[id].terminal {
            lines.push(format!("\t{id} [peripheries=2]"));
        }
    }

    /// One `FROM LABEL TO` line per reachable transition, sorted, with
    /// terminal states in parentheses.
    ///
    /// States are renumbered in depth-first discovery order from the start,
    /// so graphs of the same shape render identically whatever ids their
    /// states had.
    pub fn describe(&self) -> String {
        let order = self.reachable();
        let mut canonical = vec![0u32; self.states.len()];
        for (n, id) in order.iter().enumerate() {
            canonical[id.0 as usize] = n as u32;
        }
        let name = |id: StateId| {
            let renamed = StateId(canonical[id.0 as usize]);
            if self[id].terminal {
                format!("({renamed})")
            } else {
                renamed.to_string()
            }
        };
        let mut lines: Vec<String> = order
            .iter()
            .copied()
            .flat_map(|id| {
                self[id].transitions.iter().map(move |tr| {
                    format!("{} {} {}", name(id), tr.matcher.label(&self.labels), name(tr.next))
                })
            })
            .collect();
        lines.sort_by(|a, b| trim_parens(a).cmp(trim_parens(b)));
        lines.join("\n")
    }
}

fn trim_parens(line: &str) -> &str {
    line.trim_matches(|c| c == '(' || c == ')')
}

/// Applies matched raw values to their containers, in ascending id order.
///
/// Multi-valued containers are cleared first so that argv replaces any
/// default or environment-provided list instead of extending it.
pub fn finalize(ctx: &ParseContext, containers: &mut Containers) -> Result<(), MatchError> {
    for (&id, raw_values) in ctx.values() {
        let container = containers.get_mut(id);
        if container.supports_multiple() {
            container.value.clear();
            container.set_from_env = false;
        }
        for raw in raw_values {
            if let Err(source) = container.value.set(raw) {
                debug!(name = %container.name, raw = %raw, error = %source, "failed to apply value");
                return Err(MatchError::InvalidValue {
                    name: container.name.clone(),
                    source,
                });
            }
        }
        if let Some(set_by_user) = container.set_by_user.as_mut() {
            *set_by_user = true;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use argmatch_core::{Container, ContainerId, Value, ValueError};

    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// `-a` (bool), then positionals `ARG`, `B`, `C`.
    fn test_containers() -> Containers {
        let mut containers = Containers::new();
        containers
            .push(Container::option(&["-a"], Value::Bool(false)))
            .unwrap();
        for name in ["ARG", "B", "C"] {
            containers
                .push(Container::arg(name, Value::String(String::new())))
                .unwrap();
        }
        containers
    }

    fn test_matcher(name: &str) -> Matcher {
        match name {
            "*" => Matcher::Epsilon,
            "-a" => Matcher::SingleOption(ContainerId(0)),
            "ARG" => Matcher::Positional(ContainerId(1)),
            "B" => Matcher::Positional(ContainerId(2)),
            "C" => Matcher::Positional(ContainerId(3)),
            "--" => Matcher::EndOfOptions,
            "[-a]" => Matcher::OptionGroup(vec![ContainerId(0)]),
            other => panic!("unknown matcher {other:?}"),
        }
    }

    fn state_name(name: &str) -> (u32, bool) {
        let (name, terminal) = match name.strip_prefix('(') {
            Some(inner) => (inner.strip_suffix(')').expect("unbalanced state name"), true),
            None => (name, false),
        };
        let id = name
            .strip_prefix('S')
            .and_then(|n| n.parse().ok())
            .unwrap_or_else(|| panic!("state name must be S<n>, got {name:?}"));
        (id, terminal)
    }

    /// Builds an automaton from `FROM MATCHER TO` lines. `Sn` is
    /// `StateId(n)`, `(Sn)` marks it terminal, and the first line's `FROM`
    /// is the start state.
    fn mk_fsm(spec: &str) -> Automaton {
        let edges: Vec<(u32, bool, Matcher, u32, bool)> = spec
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|line| {
                let parts: Vec<&str> = line.split_whitespace().collect();
                assert_eq!(parts.len(), 3, "invalid line {line:?}: FROM MATCHER TO");
                let (from, from_term) = state_name(parts[0]);
                let (to, to_term) = state_name(parts[2]);
                (from, from_term, test_matcher(parts[1]), to, to_term)
            })
            .collect();

        let max = edges.iter().map(|e| e.0.max(e.3)).max().unwrap_or(0);
        let mut fsm = Automaton::new(&test_containers());
        for _ in 0..=max {
            fsm.add_state();
        }
        fsm.set_start(StateId(edges.first().map_or(0, |e| e.0)));
        for (from, from_term, matcher, to, to_term) in edges {
            if from_term {
                fsm.set_terminal(StateId(from));
            }
            if to_term {
                fsm.set_terminal(StateId(to));
            }
            fsm.add_transition(StateId(from), matcher, StateId(to));
        }
        fsm
    }

    fn fsm_str(spec: &str) -> String {
        mk_fsm(spec).describe()
    }

    #[test]
    fn test_simplify() {
        let cases = [
            (
                "
                S1 * S2
                S2 -a (S3)
                ",
                "S1 -a (S3)",
            ),
            (
                "
                S1 * S2
                S2 -a S3
                S3 * S2
                S3 * (S4)
                ",
                "
                S1 -a (S3)
                (S3) -a (S3)
                ",
            ),
            (
                "
                S1 -a S2
                S2 * (S3)
                S1 * (S3)
                ",
                "(S1) -a (S2)",
            ),
        ];

        for (input, simplified) in cases {
            let mut fsm = mk_fsm(input);
            fsm.prepare();
            assert_eq!(fsm.describe(), fsm_str(simplified), "input {input}");
        }
    }

    #[test]
    fn test_simplify_terminates_on_epsilon_cycle() {
        let mut fsm = mk_fsm(
            "
            S1 * S2
            S2 * S3
            S3 * S1
            S3 ARG (S4)
            ",
        );
        fsm.prepare();
        assert_eq!(fsm.describe(), "S0 ARG (S1)");
        assert!(fsm.matches(&args(&["x"])).is_some());
    }

    #[test]
    fn test_sort() {
        let mut fsm = mk_fsm(
            "
            S1 * S2
            S1 * S3
            S1 ARG S2
            S1 -- S2
            S1 [-a] S2
            S1 -a S3
            ",
        );
        fsm.prepare();
        let labels: Vec<String> = fsm[StateId(1)]
            .transitions
            .iter()
            .map(|t| t.matcher.label(&fsm.labels))
            .collect();
        assert_eq!(labels, vec!["-a", "[-a]", "ARG", "--"]);
    }

    #[test]
    fn test_apply_terminal_state_no_args() {
        let mut fsm = Automaton::new(&Containers::new());
        let s = fsm.add_state();
        fsm.set_terminal(s);
        assert_eq!(fsm.matches(&[]), Some(ParseContext::new()));
        assert_eq!(fsm.matches(&args(&["x"])), None);
    }

    #[test]
    fn test_apply_backtracks_with_fresh_contexts() {
        let mut fsm = mk_fsm(
            "
            S1 ARG S2
            S1 B S3
            S2 -a (S4)
            S3 C (S4)
            ",
        );
        fsm.prepare();

        let ctx = fsm.matches(&args(&["x", "y"])).unwrap();
        assert_eq!(ctx.get(ContainerId(1)), None);
        assert_eq!(ctx.get(ContainerId(2)), Some(&args(&["x"])[..]));
        assert_eq!(ctx.get(ContainerId(3)), Some(&args(&["y"])[..]));
    }

    #[test]
    fn test_apply_double_dash_rejects_options() {
        let mut fsm = mk_fsm(
            "
            S1 ARG S2
            S2 B (S3)
            ",
        );
        fsm.prepare();

        let ctx = fsm.matches(&args(&["1", "--", "-2"])).unwrap();
        assert_eq!(ctx.get(ContainerId(1)), Some(&args(&["1"])[..]));
        assert_eq!(ctx.get(ContainerId(2)), Some(&args(&["-2"])[..]));

        assert_eq!(fsm.matches(&args(&["1", "-2"])), None);
    }

    #[test]
    fn test_apply_idle_loop_terminates() {
        let mut fsm = mk_fsm(
            "
            S1 -- S1
            S1 ARG (S2)
            ",
        );
        fsm.prepare();

        assert_eq!(fsm.matches(&args(&["x", "y"])), None);

        let ctx = fsm.matches(&args(&["-x"])).unwrap();
        assert_eq!(ctx.get(ContainerId(1)), Some(&args(&["-x"])[..]));
        assert!(ctx.reject_options);
    }

    #[test]
    fn test_dot_output() {
        let mut fsm = mk_fsm(
            "
            S1 -a S2
            S2 ARG (S3)
            ",
        );
        fsm.prepare();
        assert_eq!(
            fsm.to_dot(),
            "digraph G {\n\trankdir=LR\n\tS1 -> S2 [label=\"-a\"]\n\tS2 -> S3 [label=\"ARG\"]\n\tS3 [peripheries=2]\n}\n"
        );
    }

    #[test]
    fn test_parse_binds_values() {
        let mut containers = Containers::new();
        let verbose = containers
            .push(Container::option(&["-v"], Value::Bool(false)).track_set_by_user())
            .unwrap();
        let files = containers
            .push(Container::arg("FILE", Value::Strings(vec!["default".into()])))
            .unwrap();
        containers.get_mut(files).set_from_env = true;

        let mut fsm = Automaton::new(&containers);
        let s0 = fsm.add_state();
        let s1 = fsm.add_state();
        let s2 = fsm.add_state();
        fsm.add_transition(s0, Matcher::SingleOption(verbose), s1);
        fsm.add_transition(s1, Matcher::Positional(files), s2);
        fsm.add_transition(s2, Matcher::Epsilon, s1);
        fsm.set_terminal(s2);
        fsm.prepare();

        fsm.parse(&args(&["-v", "a", "b"]), &mut containers).unwrap();
        assert_eq!(containers.get(verbose).value, Value::Bool(true));
        assert_eq!(containers.get(verbose).set_by_user, Some(true));
        assert_eq!(
            containers.get(files).value,
            Value::Strings(vec!["a".into(), "b".into()])
        );
        assert!(!containers.get(files).set_from_env);
        assert_eq!(containers.get(files).set_by_user, None);
    }

    #[test]
    fn test_parse_reports_incorrect_usage_and_bad_values() {
        let mut containers = Containers::new();
        let n = containers
            .push(Container::arg("N", Value::Int(0)))
            .unwrap();
        let mut fsm = Automaton::new(&containers);
        let s0 = fsm.add_state();
        let s1 = fsm.add_state();
        fsm.add_transition(s0, Matcher::Positional(n), s1);
        fsm.set_terminal(s1);
        fsm.prepare();

        assert_eq!(
            fsm.parse(&[], &mut containers),
            Err(MatchError::IncorrectUsage)
        );
        assert_eq!(
            fsm.parse(&args(&["ten"]), &mut containers),
            Err(MatchError::InvalidValue {
                name: "N".into(),
                source: ValueError::InvalidInt("ten".into()),
            })
        );
        assert_eq!(containers.get(n).value, Value::Int(0));
    }
}
