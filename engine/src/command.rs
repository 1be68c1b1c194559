//! A declared command bundled with its compiled usage.

use argmatch_core::{CommandDecl, Containers, Value};

use crate::compiler::compile;
use crate::error::Result;
use crate::fsm::Automaton;

/// Declaration, containers and automaton of one command.
///
/// # Examples
///
/// ```
/// use argmatch_core::*;
/// use argmatch_engine::Command;
///
/// let decl = CommandDecl::new("cp")
///     .with_spec("[-r] SRC... DST")
///     .with_option(OptionDecl::boolean(&["-r", "--recursive"]))
///     .with_arg(ArgDecl::new("SRC", ValueType::Strings))
///     .with_arg(ArgDecl::new("DST", ValueType::String));
///
/// let mut cmd = Command::new(&decl).unwrap();
/// cmd.parse(["-r", "a", "b", "out"]).unwrap();
///
/// assert_eq!(cmd.value("--recursive"), Some(&Value::Bool(true)));
/// assert_eq!(
///     cmd.value("SRC"),
///     Some(&Value::Strings(vec!["a".into(), "b".into()]))
/// );
/// assert!(cmd.parse(["out"]).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Command {
    name: String,
    spec: String,
    containers: Containers,
    automaton: Automaton,
}

impl Command {
    /// Validates `decl` and compiles its effective spec.
    pub fn new(decl: &CommandDecl) -> Result<Self> {
        let containers = Containers::from_decl(decl)?;
        let spec = decl.effective_spec();
        let automaton = compile(&spec, &containers)?;
        Ok(Self {
            name: decl.name.clone(),
            spec,
            containers,
            automaton,
        })
    }

    /// Matches `args` (without the program name) and binds the values.
    pub fn parse<I, S>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        self.automaton.parse(&args, &mut self.containers)?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The spec actually compiled, after defaulting.
    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn containers(&self) -> &Containers {
        &self.containers
    }

    pub fn containers_mut(&mut self) -> &mut Containers {
        &mut self.containers
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// Current value of an argument by name, or of an option by any alias.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.containers
            .arg(name)
            .or_else(|| self.containers.option(name))
            .map(|id| &self.containers.get(id).value)
    }
}
