//! Runtime containers that matched values are bound into.
//!
//! A [`Container`] is the live counterpart of an [`ArgDecl`] or
//! [`OptionDecl`]: an identity plus a typed [`Value`] sink. The matching
//! engine never creates containers. It looks them up by name while compiling
//! a usage spec and then refers to them only by [`ContainerId`].

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::types::{ArgDecl, CommandDecl, OptionDecl, longest_alias};
use crate::validate::{ValidationError, validate_command};
use crate::value::Value;

/// Stable handle of a container inside a [`Containers`] registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ContainerId(pub usize);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a container backs a positional argument or an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Arg,
    Option,
}

/// A declared argument or option together with its current value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Container {
    pub kind: ContainerKind,
    /// Argument name, or the canonical option alias.
    pub name: String,
    /// Option aliases. Empty for arguments.
    pub aliases: Vec<String>,
    pub value: Value,
    /// The current value came from the environment rather than argv.
    pub set_from_env: bool,
    /// `None` when nobody observes it; turned to `Some(true)` once argv
    /// binds a value here.
    pub set_by_user: Option<bool>,
}

impl Container {
    pub fn arg(name: &str, value: Value) -> Self {
        Self {
            kind: ContainerKind::Arg,
            name: name.to_string(),
            aliases: Vec::new(),
            value,
            set_from_env: false,
            set_by_user: None,
        }
    }

    pub fn option(aliases: &[&str], value: Value) -> Self {
        let aliases: Vec<String> = aliases.iter().map(|a| a.to_string()).collect();
        let name = longest_alias(&aliases).unwrap_or_default().to_string();
        Self {
            kind: ContainerKind::Option,
            name,
            aliases,
            value,
            set_from_env: false,
            set_by_user: None,
        }
    }

    /// Starts observing whether argv sets this container.
    pub fn track_set_by_user(mut self) -> Self {
        self.set_by_user = Some(false);
        self
    }

    pub fn is_bool(&self) -> bool {
        self.value.is_bool()
    }

    pub fn supports_multiple(&self) -> bool {
        self.value.is_multi_valued()
    }
}

/// Registry of all containers of one command.
///
/// # Examples
///
/// ```
/// use argmatch_core::*;
///
/// let decl = CommandDecl::new("cp")
///     .with_option(OptionDecl::boolean(&["-r", "--recursive"]))
///     .with_arg(ArgDecl::new("SRC", ValueType::String));
/// let containers = Containers::from_decl(&decl).unwrap();
///
/// let r = containers.option("--recursive").unwrap();
/// assert_eq!(containers.option("-r"), Some(r));
/// assert!(containers.get(r).is_bool());
/// assert!(containers.arg("SRC").is_some());
/// assert!(containers.arg("DST").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Containers {
    items: Vec<Container>,
    options: Vec<ContainerId>,
    args_by_name: HashMap<String, ContainerId>,
    options_by_alias: HashMap<String, ContainerId>,
}

impl Containers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a declaration and creates one container per option and
    /// argument, with declared defaults applied.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] reported by
    /// [`validate_command`].
    pub fn from_decl(decl: &CommandDecl) -> Result<Self, ValidationError> {
        if let Some(err) = validate_command(decl).into_iter().next() {
            return Err(err);
        }

        let mut containers = Self::new();
        for option in &decl.options {
            containers.push(option_container(option)?)?;
        }
        for arg in &decl.args {
            containers.push(arg_container(arg)?)?;
        }
        Ok(containers)
    }

    /// Adds a container, rejecting names already taken.
    pub fn push(&mut self, container: Container) -> Result<ContainerId, ValidationError> {
        let id = ContainerId(self.items.len());
        match container.kind {
            ContainerKind::Arg => {
                if self.args_by_name.contains_key(&container.name) {
                    return Err(ValidationError::DuplicateArg(container.name.clone()));
                }
                self.args_by_name.insert(container.name.clone(), id);
            }
            ContainerKind::Option => {
                if container.aliases.is_empty() {
                    return Err(ValidationError::MissingOptionName);
                }
                if let Some(dup) = container
                    .aliases
                    .iter()
                    .find(|a| self.options_by_alias.contains_key(a.as_str()))
                {
                    return Err(ValidationError::DuplicateOption(dup.clone()));
                }
                for alias in &container.aliases {
                    self.options_by_alias.insert(alias.clone(), id);
                }
                self.options.push(id);
            }
        }
        self.items.push(container);
        Ok(id)
    }

    /// Looks up a positional argument by name.
    pub fn arg(&self, name: &str) -> Option<ContainerId> {
        self.args_by_name.get(name).copied()
    }

    /// Looks up an option by any alias.
    pub fn option(&self, alias: &str) -> Option<ContainerId> {
        self.options_by_alias.get(alias).copied()
    }

    /// Option ids in declaration order.
    pub fn option_ids(&self) -> &[ContainerId] {
        &self.options
    }

    /// Every `(alias, id)` pair of every option.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, ContainerId)> {
        self.options_by_alias.iter().map(|(a, id)| (a.as_str(), *id))
    }

    /// # Panics
    ///
    /// Panics if `id` does not come from this registry.
    pub fn get(&self, id: ContainerId) -> &Container {
        &self.items[id.0]
    }

    /// # Panics
    ///
    /// Panics if `id` does not come from this registry.
    pub fn get_mut(&mut self, id: ContainerId) -> &mut Container {
        &mut self.items[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContainerId, &Container)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, c)| (ContainerId(i), c))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn option_container(decl: &OptionDecl) -> Result<Container, ValidationError> {
    let aliases: Vec<&str> = decl.names.iter().map(String::as_str).collect();
    let value = initial_value(decl.value_type, decl.default.as_deref(), decl.canonical_name())?;
    Ok(Container::option(&aliases, value))
}

fn arg_container(decl: &ArgDecl) -> Result<Container, ValidationError> {
    let value = initial_value(decl.value_type, decl.default.as_deref(), &decl.name)?;
    Ok(Container::arg(&decl.name, value))
}

fn initial_value(
    value_type: crate::ValueType,
    default: Option<&str>,
    owner: &str,
) -> Result<Value, ValidationError> {
    let mut value = Value::default_for(value_type);
    if let Some(raw) = default {
        value
            .set(raw)
            .map_err(|source| ValidationError::InvalidDefault {
                name: owner.to_string(),
                source,
            })?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use crate::ValueType;

    use super::*;

    #[test]
    fn test_from_decl_applies_defaults() {
        let decl = CommandDecl::new("tool")
            .with_option(OptionDecl::with_value(&["-n"], ValueType::Int).with_default("3"))
            .with_arg(ArgDecl::new("IN", ValueType::String).with_default("-"));
        let containers = Containers::from_decl(&decl).unwrap();

        let n = containers.option("-n").unwrap();
        assert_eq!(containers.get(n).value, Value::Int(3));
        let input = containers.arg("IN").unwrap();
        assert_eq!(containers.get(input).value, Value::String("-".into()));
    }

    #[test]
    fn test_option_name_matches_canonical_name() {
        let alias_sets: &[&[&str]] = &[
            &["-f", "--force"],
            &["--out", "-o"],
            &["--aa", "--bb"],
            &["-v"],
        ];
        for aliases in alias_sets {
            let container = Container::option(aliases, Value::Bool(false));
            let decl = OptionDecl::boolean(aliases);
            assert_eq!(container.name, decl.canonical_name(), "aliases {aliases:?}");
        }
        assert_eq!(Container::option(&["--aa", "--bb"], Value::Bool(false)).name, "--aa");
        assert_eq!(Container::option(&[], Value::Bool(false)).name, "");
    }

    #[test]
    fn test_option_ids_keep_declaration_order() {
        let decl = CommandDecl::new("tool")
            .with_option(OptionDecl::boolean(&["-b"]))
            .with_arg(ArgDecl::new("X", ValueType::String))
            .with_option(OptionDecl::boolean(&["-a"]));
        let containers = Containers::from_decl(&decl).unwrap();

        let names: Vec<&str> = containers
            .option_ids()
            .iter()
            .map(|id| containers.get(*id).name.as_str())
            .collect();
        assert_eq!(names, vec!["-b", "-a"]);
    }

    #[test]
    fn test_push_rejects_duplicate_alias() {
        let mut containers = Containers::new();
        containers
            .push(Container::option(&["-f", "--force"], Value::Bool(false)))
            .unwrap();
        let err = containers
            .push(Container::option(&["--force"], Value::Bool(false)))
            .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateOption("--force".to_string()));
    }

    #[test]
    fn test_option_container_uses_longest_alias_as_name() {
        let c = Container::option(&["-f", "--force"], Value::Bool(false));
        assert_eq!(c.name, "--force");
        assert_eq!(c.kind, ContainerKind::Option);
    }
}
