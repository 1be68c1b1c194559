//! Declaration layer for argmatch usage specs.
//!
//! This crate defines what a command accepts and where matched values end
//! up:
//!
//! - [`CommandDecl`]: a command with its usage spec, options and positional
//!   arguments. It can be loaded from YAML or JSON with
//!   [`CommandDecl::load`].
//! - [`OptionDecl`] / [`ArgDecl`]: a single option (with aliases) or
//!   positional argument, and its [`ValueType`].
//! - [`Containers`]: the runtime registry built from a declaration. Each
//!   [`Container`] is a named identity plus a typed [`Value`] sink,
//!   addressed by [`ContainerId`].
//!
//! Validation ([`validate_command`]) catches malformed aliases, duplicate
//! names and unparsable defaults.
//!
//! # Example
//!
//! ```
//! use argmatch_core::*;
//!
//! let decl = CommandDecl::new("cp")
//!     .with_spec("[-r] SRC DST")
//!     .with_option(OptionDecl::boolean(&["-r", "--recursive"]))
//!     .with_arg(ArgDecl::new("SRC", ValueType::String))
//!     .with_arg(ArgDecl::new("DST", ValueType::String));
//!
//! assert!(validate_command(&decl).is_empty());
//!
//! let mut containers = Containers::from_decl(&decl).unwrap();
//! let src = containers.arg("SRC").unwrap();
//! containers.get_mut(src).value.set("a.txt").unwrap();
//! assert_eq!(containers.get(src).value, Value::String("a.txt".into()));
//! ```

mod config;
mod container;
mod types;
mod validate;
mod value;

pub use config::ConfigError;
pub use container::{Container, ContainerId, ContainerKind, Containers};
pub use types::*;
pub use validate::{ValidationError, validate_command};
pub use value::{Value, ValueError, ValueType};
