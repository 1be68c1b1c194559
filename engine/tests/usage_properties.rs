//! End-to-end behaviour of compiled usage specs.

use argmatch_core::{ArgDecl, CommandDecl, Containers, OptionDecl, Value, ValueType};
use argmatch_engine::{
    Automaton, Command, Error, MatchError, Matcher, ParseContext, Priority, compile, tokenize,
};

fn argv(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn decl() -> CommandDecl {
    CommandDecl::new("tool")
        .with_option(OptionDecl::boolean(&["-a"]))
        .with_option(OptionDecl::boolean(&["-b"]))
        .with_option(OptionDecl::boolean(&["-f", "--force"]))
        .with_option(OptionDecl::with_value(&["-o", "--out"], ValueType::String))
        .with_arg(ArgDecl::new("ARG", ValueType::Strings))
        .with_arg(ArgDecl::new("ARG1", ValueType::String))
        .with_arg(ArgDecl::new("ARG2", ValueType::String))
}

fn containers() -> Containers {
    Containers::from_decl(&decl()).unwrap()
}

fn bindings(spec: &str, args: &[&str]) -> Option<(Containers, ParseContext)> {
    let containers = containers();
    let fsm = compile(spec, &containers).unwrap();
    fsm.matches(&argv(args)).map(|ctx| (containers, ctx))
}

fn bound<'a>(containers: &Containers, ctx: &'a ParseContext, name: &str) -> Option<&'a [String]> {
    let id = containers.arg(name).or_else(|| containers.option(name))?;
    ctx.get(id)
}

fn reachable_transitions(fsm: &Automaton) -> Vec<Matcher> {
    let mut seen = vec![false; fsm.state_count()];
    let mut stack = vec![fsm.start()];
    let mut found = Vec::new();
    while let Some(id) = stack.pop() {
        if std::mem::replace(&mut seen[id.0 as usize], true) {
            continue;
        }
        for tr in &fsm[id].transitions {
            found.push(tr.matcher.clone());
            stack.push(tr.next);
        }
    }
    found
}

#[test]
fn test_no_epsilon_survives_prepare() {
    let specs = [
        "",
        "ARG1 ARG2",
        "[-a ARG]",
        "ARG...",
        "-a | -b",
        "[OPTIONS] [--] ARG...",
        "[-ab]... (ARG1 | -f ARG2)...",
        "[[[-a]]...]... [-o=<file>] -- ARG...",
    ];
    let containers = containers();
    for spec in specs {
        let fsm = compile(spec, &containers).unwrap();
        assert!(
            reachable_transitions(&fsm).iter().all(|m| !m.is_epsilon()),
            "{spec:?} left epsilons:\n{}",
            fsm.describe()
        );
    }
}

#[test]
fn test_simplify_is_confluent() {
    let containers = containers();
    let equivalent = [
        ("-a ARG1", "(-a) (ARG1)"),
        ("[-a] ARG1", "[(-a)] ((ARG1))"),
        ("ARG...", "(ARG)..."),
        ("[-a]", "[[-a]]"),
    ];
    for (left, right) in equivalent {
        let left_fsm = compile(left, &containers).unwrap();
        let right_fsm = compile(right, &containers).unwrap();
        assert_eq!(
            left_fsm.describe(),
            right_fsm.describe(),
            "{left:?} vs {right:?}"
        );
    }
}

#[test]
fn test_transition_order_on_mixed_state() {
    let fsm = compile("[-f | -ab | ARG1 | --] ARG2", &containers()).unwrap();
    let priorities: Vec<Priority> = fsm[fsm.start()]
        .transitions
        .iter()
        .map(|t| t.matcher.priority())
        .collect();
    let mut sorted = priorities.clone();
    sorted.sort();
    assert_eq!(priorities, sorted);
    assert_eq!(priorities.first(), Some(&Priority::SingleOption));
    assert_eq!(priorities.last(), Some(&Priority::EndOfOptions));
    assert!(priorities.contains(&Priority::OptionGroup));
    assert!(priorities.contains(&Priority::Positional));
}

#[test]
fn test_double_dash_makes_options_positional() {
    let (containers, ctx) = bindings("[-f] ARG...", &["-f", "--", "-a", "--force"]).unwrap();
    assert_eq!(bound(&containers, &ctx, "-f"), Some(&argv(&["true"])[..]));
    assert_eq!(
        bound(&containers, &ctx, "ARG"),
        Some(&argv(&["-a", "--force"])[..])
    );

    let (containers, ctx) = bindings("-- ARG...", &["-f", "x"]).unwrap();
    assert_eq!(bound(&containers, &ctx, "ARG"), Some(&argv(&["-f", "x"])[..]));

    assert!(bindings("[-f] ARG...", &["-f", "-a"]).is_none());
}

#[test]
fn test_option_group_with_unknown_option_terminates() {
    let decl = CommandDecl::new("tool")
        .with_option(OptionDecl::with_value(&["-g"], ValueType::String));
    let containers = Containers::from_decl(&decl).unwrap();

    let fsm = compile("OPTIONS", &containers).unwrap();
    assert!(fsm.matches(&argv(&["-x"])).is_none());
    assert!(fsm.matches(&argv(&["-gx", "-x"])).is_none());
}

#[test]
fn test_unknown_letter_in_cluster_rejects_repeated_options() {
    let containers = containers();
    let fsm = compile("[OPTIONS]... ARG", &containers).unwrap();
    assert!(fsm.matches(&argv(&["-fzq", "x"])).is_none());
    assert!(fsm.matches(&argv(&["x", "-fz"])).is_none());

    let (containers, ctx) = bindings("[OPTIONS]... ARG", &["-fa", "x"]).unwrap();
    assert_eq!(bound(&containers, &ctx, "-f"), Some(&argv(&["true"])[..]));
    assert_eq!(bound(&containers, &ctx, "-a"), Some(&argv(&["true"])[..]));
    assert_eq!(bound(&containers, &ctx, "ARG"), Some(&argv(&["x"])[..]));

    let fsm = compile("OPTIONS", &containers).unwrap();
    assert!(fsm.matches(&argv(&["-fx"])).is_none());
}

#[test]
fn test_round_trips() {
    let (containers, ctx) = bindings("ARG1 ARG2", &["a", "b"]).unwrap();
    assert_eq!(bound(&containers, &ctx, "ARG1"), Some(&argv(&["a"])[..]));
    assert_eq!(bound(&containers, &ctx, "ARG2"), Some(&argv(&["b"])[..]));

    assert!(bindings("-f ARG1", &["-f", "x", "y"]).is_none());
}

#[test]
fn test_optional_group() {
    let (_, ctx) = bindings("[-a ARG1]", &[]).unwrap();
    assert!(ctx.is_empty());

    let (containers, ctx) = bindings("[-a ARG1]", &["-a", "v"]).unwrap();
    assert_eq!(bound(&containers, &ctx, "ARG1"), Some(&argv(&["v"])[..]));
    assert_eq!(bound(&containers, &ctx, "-a"), Some(&argv(&["true"])[..]));

    assert!(bindings("[-a ARG1]", &["-a"]).is_none());
}

#[test]
fn test_repetition_accumulates() {
    let (containers, ctx) = bindings("ARG...", &["1", "2", "3"]).unwrap();
    assert_eq!(
        bound(&containers, &ctx, "ARG"),
        Some(&argv(&["1", "2", "3"])[..])
    );
}

#[test]
fn test_alternation_takes_second_branch() {
    let (containers, ctx) = bindings("-a | -b", &["-b"]).unwrap();
    assert_eq!(bound(&containers, &ctx, "-a"), None);
    assert_eq!(bound(&containers, &ctx, "-b"), Some(&argv(&["true"])[..]));
}

#[test]
fn test_lexer_error_offsets() {
    assert_eq!(tokenize("-").unwrap_err().offset, 1);
    assert_eq!(tokenize("=<").unwrap_err().offset, 2);
}

#[test]
fn test_options_may_appear_in_any_order() {
    let (containers, ctx) =
        bindings("[OPTIONS] ARG1", &["--out", "o.txt", "-fab", "in"]).unwrap();
    assert_eq!(bound(&containers, &ctx, "--out"), Some(&argv(&["o.txt"])[..]));
    assert_eq!(bound(&containers, &ctx, "-f"), Some(&argv(&["true"])[..]));
    assert_eq!(bound(&containers, &ctx, "-a"), Some(&argv(&["true"])[..]));
    assert_eq!(bound(&containers, &ctx, "-b"), Some(&argv(&["true"])[..]));
    assert_eq!(bound(&containers, &ctx, "ARG1"), Some(&argv(&["in"])[..]));
}

#[test]
fn test_command_binds_typed_values() {
    let decl = CommandDecl::new("head")
        .with_spec("[-n=<lines>] [-q] FILE...")
        .with_option(
            OptionDecl::with_value(&["-n", "--lines"], ValueType::Int).with_default("10"),
        )
        .with_option(OptionDecl::boolean(&["-q", "--quiet"]))
        .with_arg(ArgDecl::new("FILE", ValueType::Strings).with_default("-"));

    let mut cmd = Command::new(&decl).unwrap();
    cmd.parse(["-n", "5", "a.txt", "b.txt"]).unwrap();

    assert_eq!(cmd.value("--lines"), Some(&Value::Int(5)));
    assert_eq!(cmd.value("-q"), Some(&Value::Bool(false)));
    assert_eq!(
        cmd.value("FILE"),
        Some(&Value::Strings(vec!["a.txt".into(), "b.txt".into()]))
    );
}

#[test]
fn test_command_reports_errors() {
    let decl = CommandDecl::new("head")
        .with_spec("-n=<lines>")
        .with_option(OptionDecl::with_value(&["-n"], ValueType::Int));
    let mut cmd = Command::new(&decl).unwrap();

    assert!(matches!(
        cmd.parse(["-n", "many"]),
        Err(Error::Match(MatchError::InvalidValue { .. }))
    ));
    assert_eq!(
        cmd.parse(Vec::<String>::new()),
        Err(Error::Match(MatchError::IncorrectUsage))
    );

    let undeclared = CommandDecl::new("head").with_spec("FILE");
    assert!(matches!(Command::new(&undeclared), Err(Error::Parse(_))));

    let invalid = CommandDecl::new("head").with_option(OptionDecl::boolean(&["quiet"]));
    assert!(matches!(Command::new(&invalid), Err(Error::Validation(_))));
}

#[test]
fn test_default_spec_from_declaration() {
    let decl = CommandDecl::new("cp")
        .with_option(OptionDecl::boolean(&["-r"]))
        .with_arg(ArgDecl::new("SRC", ValueType::String))
        .with_arg(ArgDecl::new("DST", ValueType::String));
    let mut cmd = Command::new(&decl).unwrap();
    assert_eq!(cmd.spec(), "[OPTIONS] SRC DST");

    cmd.parse(["a", "-r", "b"]).unwrap_err();
    cmd.parse(["-r", "a", "b"]).unwrap();
    assert_eq!(cmd.value("-r"), Some(&Value::Bool(true)));
}

#[test]
fn test_automaton_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Automaton>();
    assert_send_sync::<Command>();

    let containers = containers();
    let fsm = std::sync::Arc::new(compile("ARG...", &containers).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let fsm = std::sync::Arc::clone(&fsm);
            std::thread::spawn(move || fsm.matches(&argv(&["x"; 3][..n % 3 + 1])).is_some())
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
