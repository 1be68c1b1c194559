//! Usage-spec compiler and argv matcher.
//!
//! A usage spec such as `[-r] SRC... DST` is tokenized ([`tokenize`]),
//! compiled against a command's [`Containers`](argmatch_core::Containers)
//! into an [`Automaton`] ([`compile`]), and then matched against argument
//! vectors. Matching is a backtracking walk over the automaton: transitions
//! are tried in a fixed priority order (options before positionals before
//! `--`) and the first path that consumes the whole argv wins. Its bindings
//! are then applied to the containers.
//!
//! [`Command`] ties the steps together for a
//! [`CommandDecl`](argmatch_core::CommandDecl).
//!
//! # Spec syntax
//!
//! | Form | Meaning |
//! |------|---------|
//! | `SRC` | a declared positional argument |
//! | `-f`, `--force` | a declared option, optionally followed by `=<name>` |
//! | `-abc` | any of `-a`, `-b`, `-c`, in any order, at least one |
//! | `OPTIONS` | any declared option, in any order, at least one |
//! | `A B` | sequence |
//! | `A \| B` | choice |
//! | `[A]` | optional |
//! | `(A)` | grouping |
//! | `A...` | one or more |
//! | `--` | end of options: everything after is positional |

mod command;
mod compiler;
mod context;
mod error;
mod fsm;
mod lexer;
mod matcher;

pub use command::Command;
pub use compiler::compile;
pub use context::ParseContext;
pub use error::{Error, MatchError, ParseError, ParseErrorKind, Result};
pub use fsm::{Automaton, State, StateId, Transition, finalize};
pub use lexer::{Token, TokenKind, tokenize};
pub use matcher::{Matcher, OptionIndex, Priority};
