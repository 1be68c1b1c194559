//! Declaration types for commands, options and positional arguments.
//!
//! These types describe *what* a command accepts. They are plain data,
//! serializable with [`serde`] so that a whole command can be declared in a
//! YAML or JSON file. The usage spec string of a command refers to the
//! declarations by name: positional arguments by [`ArgDecl::name`] and
//! options by any of their [`OptionDecl::names`].

use serde::{Deserialize, Serialize};

use crate::value::ValueType;

/// Declaration of an option.
///
/// An option has one or more aliases (e.g. `-f` and `--force`), all of
/// which are interchangeable on the command line and in the usage spec.
///
/// # Examples
///
/// ```
/// use argmatch_core::{OptionDecl, ValueType};
///
/// let force = OptionDecl::boolean(&["-f", "--force"])
///     .with_description("Overwrite existing files");
/// assert_eq!(force.canonical_name(), "--force");
/// assert!(force.matches("-f"));
///
/// let output = OptionDecl::with_value(&["-o", "--output"], ValueType::String);
/// assert!(!output.is_bool());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDecl {
    /// Aliases, each including its leading dashes.
    pub names: Vec<String>,
    /// Type of value this option accepts.
    #[serde(default)]
    pub value_type: ValueType,
    /// Human readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Raw default, applied when the container is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl OptionDecl {
    /// Creates a boolean option.
    pub fn boolean(names: &[&str]) -> Self {
        Self::with_value(names, ValueType::Bool)
    }

    /// Creates an option taking a value of the given type.
    pub fn with_value(names: &[&str], value_type: ValueType) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            value_type,
            description: None,
            default: None,
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Sets the raw default value.
    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn is_bool(&self) -> bool {
        self.value_type == ValueType::Bool
    }

    /// Returns the canonical name: the longest alias, first one on ties.
    ///
    /// # Examples
    ///
    /// ```
    /// use argmatch_core::OptionDecl;
    ///
    /// assert_eq!(OptionDecl::boolean(&["-v", "--verbose"]).canonical_name(), "--verbose");
    /// assert_eq!(OptionDecl::boolean(&["-v"]).canonical_name(), "-v");
    /// ```
    pub fn canonical_name(&self) -> &str {
        longest_alias(&self.names).unwrap_or("unknown")
    }

    /// Checks whether `alias` is one of this option's names.
    pub fn matches(&self, alias: &str) -> bool {
        self.names.iter().any(|n| n == alias)
    }
}

/// Picks the longest alias, keeping the first one on ties.
pub(crate) fn longest_alias(names: &[String]) -> Option<&str> {
    names
        .iter()
        .fold(None::<&String>, |best, name| match best {
            Some(b) if b.len() >= name.len() => Some(b),
            _ => Some(name),
        })
        .map(String::as_str)
}

/// Declaration of a positional argument.
///
/// # Examples
///
/// ```
/// use argmatch_core::{ArgDecl, ValueType};
///
/// let src = ArgDecl::new("SRC", ValueType::String);
/// assert_eq!(src.name, "SRC");
///
/// let files = ArgDecl::new("FILE", ValueType::Strings);
/// assert!(files.value_type.is_multi_valued());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgDecl {
    /// Name used in the usage spec (e.g. `SRC`).
    pub name: String,
    /// Type of value expected.
    #[serde(default)]
    pub value_type: ValueType,
    /// Human readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Raw default, applied when the container is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ArgDecl {
    pub fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: name.to_string(),
            value_type,
            description: None,
            default: None,
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Sets the raw default value.
    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }
}

/// Complete declaration of a command.
///
/// Holds the usage spec together with every option and argument it may
/// reference. When `spec` is absent, [`effective_spec`] derives one from the
/// declarations.
///
/// [`effective_spec`]: CommandDecl::effective_spec
///
/// # Examples
///
/// ```
/// use argmatch_core::*;
///
/// let cmd = CommandDecl::new("cp")
///     .with_option(OptionDecl::boolean(&["-r", "--recursive"]))
///     .with_arg(ArgDecl::new("SRC", ValueType::String))
///     .with_arg(ArgDecl::new("DST", ValueType::String));
///
/// assert_eq!(cmd.effective_spec(), "[OPTIONS] SRC DST");
/// assert!(cmd.find_option("--recursive").is_some());
/// assert!(cmd.find_arg("DST").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandDecl {
    /// Command name, used in diagnostics.
    pub name: String,
    /// Usage spec string (e.g. `[-r] SRC... DST`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
    /// Short description of the command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared options, in declaration order.
    #[serde(default)]
    pub options: Vec<OptionDecl>,
    /// Declared positional arguments, in declaration order.
    #[serde(default)]
    pub args: Vec<ArgDecl>,
}

impl CommandDecl {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Sets the usage spec.
    pub fn with_spec(mut self, spec: &str) -> Self {
        self.spec = Some(spec.to_string());
        self
    }

    /// Adds an option.
    pub fn with_option(mut self, option: OptionDecl) -> Self {
        self.options.push(option);
        self
    }

    /// Adds a positional argument.
    pub fn with_arg(mut self, arg: ArgDecl) -> Self {
        self.args.push(arg);
        self
    }

    /// Returns the usage spec to compile.
    ///
    /// A declared spec is returned as is, even when blank. Without one, the
    /// spec is `[OPTIONS]` (when any option is declared) followed by every
    /// argument name in declaration order.
    pub fn effective_spec(&self) -> String {
        if let Some(spec) = &self.spec {
            return spec.clone();
        }

        let mut parts: Vec<&str> = Vec::with_capacity(self.args.len() + 1);
        if !self.options.is_empty() {
            parts.push("[OPTIONS]");
        }
        parts.extend(self.args.iter().map(|a| a.name.as_str()));
        parts.join(" ")
    }

    /// Finds an option by any of its aliases.
    pub fn find_option(&self, alias: &str) -> Option<&OptionDecl> {
        self.options.iter().find(|o| o.matches(alias))
    }

    /// Finds a positional argument by name.
    pub fn find_arg(&self, name: &str) -> Option<&ArgDecl> {
        self.args.iter().find(|a| a.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_decl_creation() {
        let opt = OptionDecl::boolean(&["-v", "--verbose"]).with_description("Verbose output");

        assert_eq!(opt.names, vec!["-v".to_string(), "--verbose".to_string()]);
        assert!(opt.is_bool());
        assert_eq!(opt.canonical_name(), "--verbose");
        assert_eq!(opt.description.as_deref(), Some("Verbose output"));
    }

    #[test]
    fn test_option_matches_alias() {
        let opt = OptionDecl::with_value(&["-o", "--output"], ValueType::String);

        assert!(opt.matches("-o"));
        assert!(opt.matches("--output"));
        assert!(!opt.matches("-x"));
    }

    #[test]
    fn test_effective_spec_without_options() {
        let cmd = CommandDecl::new("echo").with_arg(ArgDecl::new("TEXT", ValueType::Strings));
        assert_eq!(cmd.effective_spec(), "TEXT");
    }

    #[test]
    fn test_effective_spec_prefers_declared_spec() {
        let cmd = CommandDecl::new("rm")
            .with_spec("-f FILE...")
            .with_option(OptionDecl::boolean(&["-f"]))
            .with_arg(ArgDecl::new("FILE", ValueType::Strings));
        assert_eq!(cmd.effective_spec(), "-f FILE...");
    }

    #[test]
    fn test_command_decl_deserializes_with_defaults() {
        let json = r#"{
            "name": "tool",
            "options": [{ "names": ["-q"], "value_type": "bool" }],
            "args": [{ "name": "IN" }]
        }"#;
        let cmd: CommandDecl = serde_json::from_str(json).unwrap();

        assert_eq!(cmd.spec, None);
        assert!(cmd.options[0].is_bool());
        assert_eq!(cmd.args[0].value_type, ValueType::String);
    }
}
