//! Recursive-descent compiler from usage-spec tokens to an [`Automaton`].
//!
//! Grammar:
//!
//! ```text
//! seq    := choice*              (at least one inside brackets)
//! choice := atom ('|' atom)*
//! atom   := (POSITIONAL | OPTIONS | option OPT_VALUE? | OPT_SEQ
//!            | '(' seq ')' | '[' seq ']') '...'?
//!         | '--'
//! ```
//!
//! Every fragment is a `(start, end)` pair of states. Sequencing copies a
//! fragment's start transitions onto the running end, choice and optional
//! groups are wired with epsilons, and `...` loops the end back to the start
//! with an epsilon. All epsilons disappear in [`Automaton::prepare`].

use argmatch_core::{ContainerId, Containers};
use tracing::debug;

use crate::error::ParseError;
use crate::fsm::{Automaton, StateId};
use crate::lexer::{Token, TokenKind, tokenize};
use crate::matcher::Matcher;

/// Compiles `spec` against the declared `containers`.
///
/// The returned automaton is already prepared for matching.
///
/// # Errors
///
/// Lexing errors, references to undeclared arguments or options, options
/// placed after `--`, unbalanced groups and trailing input are all reported
/// as a [`ParseError`] positioned in `spec`.
///
/// # Examples
///
/// ```
/// use argmatch_core::*;
/// use argmatch_engine::compile;
///
/// let decl = CommandDecl::new("cp")
///     .with_option(OptionDecl::boolean(&["-r"]))
///     .with_arg(ArgDecl::new("SRC", ValueType::Strings))
///     .with_arg(ArgDecl::new("DST", ValueType::String));
/// let containers = Containers::from_decl(&decl).unwrap();
///
/// let fsm = compile("[-r] SRC... DST", &containers).unwrap();
/// let argv: Vec<String> = ["-r", "a", "b", "dir"].iter().map(|s| s.to_string()).collect();
/// assert!(fsm.matches(&argv).is_some());
///
/// let err = compile("SRC FILE", &containers).unwrap_err();
/// assert_eq!(err.message, "Undeclared arg FILE");
/// assert_eq!(err.offset, 4);
/// ```
pub fn compile(spec: &str, containers: &Containers) -> Result<Automaton, ParseError> {
    let tokens = tokenize(spec)?;
    let mut compiler = Compiler {
        spec,
        tokens,
        pos: 0,
        containers,
        fsm: Automaton::new(containers),
        reject_options: false,
    };

    let (start, end) = compiler.seq(false)?;
    if let Some(token) = compiler.tokens.get(compiler.pos) {
        return Err(ParseError::compile(spec, "Unexpected input", token.offset));
    }

    let mut fsm = compiler.fsm;
    fsm.set_start(start);
    fsm.set_terminal(end);
    fsm.prepare();

    debug!(
        spec,
        states = fsm.state_count(),
        transitions = fsm.transition_count(),
        "compiled usage spec"
    );
    Ok(fsm)
}

struct Compiler<'a> {
    spec: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    containers: &'a Containers,
    fsm: Automaton,
    /// Set once `--` has been compiled; later options are an error.
    reject_options: bool,
}

type Fragment = (StateId, StateId);

impl Compiler<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn is(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn found(&mut self, kind: TokenKind) -> bool {
        if self.is(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.found(kind) {
            Ok(())
        } else {
            Err(self.error(format!("Was expecting {kind}")))
        }
    }

    /// An error at the current token, or at the end of the spec.
    fn error(&self, message: impl Into<String>) -> ParseError {
        let offset = self.peek().map_or(self.spec.len(), |t| t.offset);
        ParseError::compile(self.spec, message, offset)
    }

    /// An error at the token just consumed.
    fn error_back(&mut self, message: impl Into<String>) -> ParseError {
        self.pos -= 1;
        self.error(message)
    }

    fn can_atom(&self) -> bool {
        self.peek().is_some_and(|t| {
            matches!(
                t.kind,
                TokenKind::Positional
                    | TokenKind::Options
                    | TokenKind::ShortOpt
                    | TokenKind::LongOpt
                    | TokenKind::OptSeq
                    | TokenKind::OpenPar
                    | TokenKind::OpenSq
                    | TokenKind::DoubleDash
            )
        })
    }

    fn seq(&mut self, required: bool) -> Result<Fragment, ParseError> {
        let start = self.fsm.add_state();
        let mut end = start;

        if required {
            let (s, e) = self.choice()?;
            self.fsm.copy_transitions(s, end);
            end = e;
        }
        while self.can_atom() {
            let (s, e) = self.choice()?;
            self.fsm.copy_transitions(s, end);
            end = e;
        }
        Ok((start, end))
    }

    fn choice(&mut self) -> Result<Fragment, ParseError> {
        let start = self.fsm.add_state();
        let end = self.fsm.add_state();

        loop {
            let (s, e) = self.atom()?;
            self.fsm.add_transition(start, Matcher::Epsilon, s);
            self.fsm.add_transition(e, Matcher::Epsilon, end);
            if !self.found(TokenKind::Choice) {
                break;
            }
        }
        Ok((start, end))
    }

    fn atom(&mut self) -> Result<Fragment, ParseError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error("Unexpected end of input"));
        };
        self.pos += 1;

        let (start, end) = match token.kind {
            TokenKind::Positional => {
                let Some(id) = self.containers.arg(&token.text) else {
                    return Err(self.error_back(format!("Undeclared arg {}", token.text)));
                };
                self.single(Matcher::Positional(id))
            }
            TokenKind::Options => {
                self.check_options_allowed()?;
                let ids = self.containers.option_ids().to_vec();
                self.single(Matcher::OptionGroup(ids))
            }
            TokenKind::ShortOpt | TokenKind::LongOpt => {
                self.check_options_allowed()?;
                let Some(id) = self.containers.option(&token.text) else {
                    return Err(self.error_back(format!("Undeclared option {}", token.text)));
                };
                let fragment = self.single(Matcher::SingleOption(id));
                self.found(TokenKind::OptValue);
                fragment
            }
            TokenKind::OptSeq => {
                self.check_options_allowed()?;
                let mut ids: Vec<ContainerId> = Vec::new();
                for letter in token.text.chars() {
                    let alias = format!("-{letter}");
                    let Some(id) = self.containers.option(&alias) else {
                        return Err(self.error_back(format!("Undeclared option {alias}")));
                    };
                    ids.push(id);
                }
                self.single(Matcher::OptionGroup(ids))
            }
            TokenKind::OpenPar => {
                let fragment = self.seq(true)?;
                self.expect(TokenKind::ClosePar)?;
                fragment
            }
            TokenKind::OpenSq => {
                let (s, e) = self.seq(true)?;
                self.fsm.add_transition(s, Matcher::Epsilon, e);
                self.expect(TokenKind::CloseSq)?;
                (s, e)
            }
            TokenKind::DoubleDash => {
                self.reject_options = true;
                return Ok(self.single(Matcher::EndOfOptions));
            }
            _ => {
                return Err(self.error_back(
                    "Unexpected input: was expecting a positional argument, an option or a group",
                ));
            }
        };

        if self.found(TokenKind::Rep) {
            self.fsm.add_transition(end, Matcher::Epsilon, start);
        }
        Ok((start, end))
    }

    fn single(&mut self, matcher: Matcher) -> Fragment {
        let start = self.fsm.add_state();
        let end = self.fsm.add_state();
        self.fsm.add_transition(start, matcher, end);
        (start, end)
    }

    fn check_options_allowed(&mut self) -> Result<(), ParseError> {
        if self.reject_options {
            Err(self.error_back("No options after --"))
        } else {
            Ok(())
        }
    }
}
