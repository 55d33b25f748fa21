// Integration tests for the Pyxc front end

use pyxc::lower::lower_item;
use pyxc::lower::printer::SexprPrinter;
use pyxc::{
    parse_str, DiagnosticKind, Lexer, ResolvedType, Session, SessionOptions, SourceLocation,
};

/// Run a session and print every accepted item
fn run_printed(source: &str, options: SessionOptions) -> (Session, Vec<String>) {
    let mut session = Session::from_source(source, options);
    let mut printed = Vec::new();
    session.run_with(|ast, env, item| {
        printed.push(lower_item(&mut SexprPrinter::new(), ast, env, item).expect("printable item"));
    });
    (session, printed)
}

fn sexprs(source: &str) -> Vec<String> {
    let (session, printed) = run_printed(source, SessionOptions::default());
    assert!(
        !session.had_error(),
        "unexpected diagnostics: {:?}",
        session.diagnostics()
    );
    printed
}

fn messages(session: &Session) -> Vec<String> {
    session
        .diagnostics()
        .iter()
        .map(|d| d.message.clone())
        .collect()
}

#[test]
fn test_function_definition() {
    let source = "def add(x: i32, y: i32) -> i32:\n    return x + y\n";

    assert_eq!(
        sexprs(source),
        vec!["(def add ((x i32) (y i32)) i32 (block (return (+ x y))))"]
    );
}

#[test]
fn test_program_with_several_items() {
    let source = r#"
extern def putchard(c: i32) -> i32

# squares below n
def squares(n: i32) -> void:
    for i in range(0, n, 1):
        print(i * i)

type Count = u64
count: Count = 0
"#;

    assert_eq!(
        sexprs(source),
        vec![
            "(extern putchard ((c i32)) i32)",
            "(def squares ((n i32)) void (block (for i 0 n 1 (block (print (* i i))))))",
            "(type Count u64)",
            "(let count Count 0)",
        ]
    );
}

#[test]
fn test_elif_desugars_to_nested_if() {
    let chained = "if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n";
    let nested = "if a:\n    x = 1\nelse:\n    if b:\n        x = 2\n    else:\n        x = 3\n";

    let expected = "(if a (block (= x 1)) (block (if b (block (= x 2)) (block (= x 3)))))";
    assert_eq!(sexprs(chained), vec![expected]);
    assert_eq!(sexprs(nested), vec![expected]);
}

#[test]
fn test_inline_elif_desugars_to_nested_if() {
    let chained = "if a: x = 1 elif b: x = 2 else: x = 3\n";
    let nested = "if a: x = 1 else: if b: x = 2 else: x = 3\n";

    let expected = "(if a (block (= x 1)) (block (if b (block (= x 2)) (block (= x 3)))))";
    assert_eq!(sexprs(chained), vec![expected]);
    assert_eq!(sexprs(nested), vec![expected]);
}

#[test]
fn test_inline_function_body() {
    assert_eq!(
        sexprs("def add(x: i32, y: i32) -> i32: return x + y\n"),
        vec!["(def add ((x i32) (y i32)) i32 (block (return (+ x y))))"]
    );
}

#[test]
fn test_precedence_in_printed_tree() {
    assert_eq!(
        sexprs("r = a or b and c == 1 + 2 * 3\n"),
        vec!["(= r (or a (and b (== c (+ 1 (* 2 3))))))"]
    );
    assert_eq!(sexprs("r = 10 - 4 - 3\n"), vec!["(= r (- (- 10 4) 3))"]);
}

#[test]
fn test_match_statement() {
    let source = "def classify(c: char) -> i32:\n    match c:\n        case 'a':\n            return 1\n        case -1: return 2\n        case _: return 0\n";

    assert_eq!(
        sexprs(source),
        vec![
            "(def classify ((c char)) i32 (block (match c (case 97 (block (return 1))) (case (- 1) (block (return 2))) (case _ (block (return 0))))))"
        ]
    );
}

#[test]
fn test_duplicate_wildcard_reported() {
    let source = "match x:\n    case 1: y = 1\n    case _: y = 2\n    case _: y = 3\nz: i32 = 1\n";
    let (session, printed) = run_printed(source, SessionOptions::interactive());

    assert_eq!(messages(&session), vec!["Duplicate wildcard case '_' in match"]);
    let diag = &session.diagnostics()[0];
    assert_eq!(diag.kind, DiagnosticKind::Semantic);
    assert_eq!(diag.location, SourceLocation::new(4, 10));

    // The match was dropped, the next line was still parsed
    assert_eq!(printed, vec!["(let z i32 1)"]);
}

#[test]
fn test_diagnostic_rendering() {
    let session = parse_str("def f(x i32) -> i32: return x\n");

    assert_eq!(
        session.emitter().output(),
        "Error (Line 1, Column 9): Expected ':' after parameter name, found identifier 'i32'\n\
         def f(x i32) -> i32: return x\n        ^~~~\n"
    );
}

#[test]
fn test_error_at_end_of_line_points_past_it() {
    let session = parse_str("while x > 0\n    x = x - 1\n");

    assert_eq!(
        session.emitter().output(),
        "Error (Line 1, Column 12): Expected ':' after while condition, found newline\n\
         while x > 0\n           ^~~~\n"
    );
}

#[test]
fn test_bad_dedent_interactive_recovers() {
    let source = "def f() -> i32:\n        x: i32 = 1\n    return x\ny: i32 = 2\n";
    let (session, printed) = run_printed(source, SessionOptions::interactive());

    assert_eq!(
        messages(&session),
        vec!["Dedent does not match any enclosing indentation level"]
    );
    let diag = &session.diagnostics()[0];
    assert_eq!(diag.kind, DiagnosticKind::Lexical);
    assert_eq!(diag.location, SourceLocation::new(3, 5));
    assert_eq!(printed, vec!["(let y i32 2)"]);
    assert!(session.symbols().globals.contains_key("y"));
}

#[test]
fn test_bad_dedent_file_mode_halts() {
    let source = "def f() -> i32:\n        x: i32 = 1\n    return x\ny: i32 = 2\n";
    let (session, printed) = run_printed(source, SessionOptions::default());

    assert_eq!(session.diagnostics().len(), 1);
    assert!(printed.is_empty());
    assert!(session.is_halted());
}

#[test]
fn test_file_mode_halts_on_semantic_error() {
    let source = "x: Missing = 1\ny: Missing2 = 2\n";
    let session = parse_str(source);

    assert_eq!(messages(&session), vec!["Unknown type alias: Missing"]);
    assert!(session.items().is_empty());
}

#[test]
fn test_default_aliases() {
    let session = parse_str("a: int\nb: char\nc: double\nd: size_t\n");

    assert!(!session.had_error());
    let globals = &session.symbols().globals;
    assert_eq!(globals["a"], ResolvedType::Int { bits: 32, signed: true });
    assert_eq!(globals["b"], ResolvedType::Int { bits: 8, signed: true });
    assert_eq!(globals["c"], ResolvedType::Float { bits: 64 });
    assert_eq!(globals["d"], ResolvedType::Int { bits: 64, signed: false });
}

#[test]
fn test_alias_redeclaration_replaces() {
    let session = parse_str("type int = i64\nx: int\n");

    assert_eq!(
        session.symbols().globals["x"],
        ResolvedType::Int { bits: 64, signed: true }
    );
}

#[test]
fn test_alias_cycle_reported_on_use() {
    let source = "type A = B\ntype B = A\nx: A\n";
    let (session, printed) = run_printed(source, SessionOptions::interactive());

    // Declaring the aliases is fine; using one fails
    assert_eq!(printed, vec!["(type A B)", "(type B A)"]);
    assert_eq!(messages(&session), vec!["Alias cycle detected at type: A"]);
    assert_eq!(session.diagnostics()[0].location, SourceLocation::new(3, 1));
}

#[test]
fn test_struct_by_value_recursion_rejected() {
    let session = parse_str("struct S:\n    next: S\n\ns: S\n");

    assert_eq!(messages(&session), vec!["Struct 'S' contains itself by value"]);
    assert!(session.env().layout_of("S").is_none());
}

#[test]
fn test_struct_pointer_recursion_accepted() {
    let source = "struct Node:\n    value: int\n    next: ptr[Node]\n\ndef value_of(n: Node) -> i32:\n    return n.value\n";
    let session = parse_str(source);

    assert!(!session.had_error(), "{:?}", session.diagnostics());
    let layout = session.env().layout_of("Node").expect("laid out");
    assert_eq!(layout.size, 16);
    assert_eq!(layout.field("next").map(|f| f.offset), Some(8));
}

#[test]
fn test_pointer_to_struct_holding_outer_by_value() {
    let declarations = "struct A:\n    b: ptr[B]\nstruct B:\n    a: A\n";

    for used in ["x: A\n", "x: B\n"] {
        let session = parse_str(&format!("{declarations}{used}"));
        assert!(!session.had_error(), "{used:?}: {:?}", session.diagnostics());
        assert_eq!(session.env().layout_of("A").map(|l| l.size), Some(8));
        assert_eq!(session.env().layout_of("B").map(|l| l.size), Some(8));
    }
}

#[test]
fn test_struct_name_taken_by_alias() {
    let source = "type P = i32\nstruct P:\n    x: int\nstruct int:\n    x: i32\n";
    let (session, printed) = run_printed(source, SessionOptions::interactive());

    assert_eq!(printed, vec!["(type P i32)"]);
    assert_eq!(
        messages(&session)[..2],
        [
            "Type 'P' is already defined as an alias",
            "Unexpected indentation, found indent",
        ]
    );
    assert_eq!(session.diagnostics()[0].location, SourceLocation::new(2, 8));
    assert!(messages(&session).contains(&"Type 'int' is already defined as an alias".to_string()));
    assert!(!session.env().has_struct("P"));
    assert!(!session.env().has_struct("int"));
}

#[test]
fn test_struct_declaration_errors() {
    let source = "struct P:\n    x: int\n    x: int\nstruct P:\n    y: int\nstruct P:\n    z: int\n";
    let (session, printed) = run_printed(source, SessionOptions::interactive());

    // The failed first declaration leaves the name free for the second;
    // the rejected third one leaves its field line behind, indented
    assert_eq!(printed, vec!["(struct P (y int))"]);
    assert_eq!(
        messages(&session),
        vec![
            "Duplicate field 'x' in struct 'P'",
            "Struct 'P' is already defined",
            "Unexpected indentation, found indent",
        ]
    );
    assert_eq!(session.diagnostics()[0].location, SourceLocation::new(3, 5));
    assert_eq!(session.diagnostics()[1].location, SourceLocation::new(6, 8));
}

#[test]
fn test_unknown_field() {
    let source = "struct P:\n    x: int\n\ndef f(p: P) -> i32:\n    return p.y\n";
    let session = parse_str(source);

    assert_eq!(messages(&session), vec!["Unknown field 'y' in struct 'P'"]);
    assert_eq!(session.diagnostics()[0].location, SourceLocation::new(5, 13));
}

#[test]
fn test_match_on_float_rejected() {
    let session = parse_str("x: f64 = 1.5\nmatch x:\n    case 1: print(x)\n");

    assert_eq!(
        messages(&session),
        vec!["Match scrutinee must be an integer, found f64"]
    );
}

#[test]
fn test_recursive_call_checks() {
    let source = "def fact(n: i32) -> i32:\n    if n < 2: return 1\n    return n * fact(n - 1)\n";
    let session = parse_str(source);

    assert!(!session.had_error(), "{:?}", session.diagnostics());
    let signature = &session.symbols().functions["fact"];
    assert_eq!(signature.return_type, ResolvedType::Int { bits: 32, signed: true });
}

#[test]
fn test_prompt_output() {
    let options = SessionOptions {
        prompt: ">> ".to_string(),
        ..SessionOptions::interactive()
    };
    let mut session = Session::from_source("x: i32 = 1\nx = = 2\n", options);
    session.run();

    assert_eq!(
        session.emitter().output(),
        ">> >> Error (Line 2, Column 5): Expected an expression, found '='\nx = = 2\n    ^~~~\n>> "
    );
}

#[test]
fn test_restart_keeps_sessions_independent() {
    let mut session = parse_str("struct P:\n    x: int\n");
    assert!(session.env().has_struct("P"));

    session.restart(Lexer::from_source("struct P:\n    y: int\n"));
    session.run();
    assert!(!session.had_error());
    assert!(session.env().struct_decl("P").and_then(|d| d.field("y")).is_some());
}

#[test]
fn test_tokenize_helper() {
    let tokens = pyxc::tokenize_str("if x:\n    y\n");
    let names: Vec<String> = tokens.iter().map(|t| t.kind.dump_name()).collect();

    assert_eq!(
        names,
        vec!["if", "identifier", ":", "eol", "indent", "identifier", "eol", "dedent", "eof"]
    );
}
