use ilc_core::model::{Registry, RegistryError};
use ilc_core::parse::{check_call, ParseError, Parser};

/// A function without markers parses fine, produces no records, and the
/// output is a byte-for-byte copy of the input.
#[test]
fn function_without_markers_passes_through() {
    let src = "int add(int x,int y){ return x+y; }\n";
    let result = Parser::new(src, "test.c").run().expect("parse");
    assert!(result.registry.is_empty());
    assert_eq!(result.text, src);
}

/// One marker in one function: record, hit count, line, and the exact
/// spliced check call.
#[test]
fn single_marker_is_recorded_and_spliced() {
    let src = "\
/* subtract y from x */
int minus (
    int x,
    int y
)
{
    int ret;

    ret = x - y;

    /* ILC: return value computed */
    return ret;
}
";
    let result = Parser::new(src, "test.c").run().expect("parse");

    let funcs = result.registry.functions();
    assert_eq!(funcs.len(), 1);
    assert_eq!(funcs[0].name, "minus");
    assert_eq!(funcs[0].hits, 1);
    assert_eq!(funcs[0].markers.len(), 1);
    assert_eq!(funcs[0].markers[0].line, 11);

    let call = check_call("test.c", "minus", 11);
    assert_eq!(call, "*/ __ilc_check( \"test.c:minus:11\" ); /*");
    assert!(result.text.contains(&call), "check call missing from output:\n{}", result.text);

    // Everything except the spliced call is the original text.
    assert_eq!(result.text.replace(&call, ""), src);
}

/// Markers at any block depth belong to the enclosing function, in source
/// order.
#[test]
fn nested_blocks_attribute_markers_to_the_function() {
    let src = "\
int walk(int n)
{
    if (n > 0) {
        while (n--) {
            /* ILC: inner loop */
        }
    }
    /* ILC: fallthrough */
    return n;
}
";
    let result = Parser::new(src, "walk.c").run().expect("parse");
    let func = result.registry.find("walk").expect("walk record");
    assert_eq!(func.hits, 2);
    let lines: Vec<u64> = func.markers.iter().map(|m| m.line).collect();
    assert_eq!(lines, vec![5, 8]);
}

/// Struct/union/typedef bodies are skipped: no records, no instrumentation,
/// and the statement after them parses independently.
#[test]
fn aggregate_bodies_are_skipped() {
    let src = "\
typedef struct {
    /* ILC: never recorded */
    int a;
    struct { int b; } inner;
} T;

int follows(void)
{
    /* ILC: reached */
    return 0;
}
";
    let result = Parser::new(src, "agg.c").run().expect("parse");
    let funcs = result.registry.functions();
    assert_eq!(funcs.len(), 1);
    assert_eq!(funcs[0].name, "follows");
    assert_eq!(funcs[0].markers[0].line, 9);
    assert_eq!(result.text.matches("__ilc_check").count(), 1);
}

/// A typedef with no following statement is a complete parse on its own.
#[test]
fn trailing_typedef_parses_cleanly() {
    let src = "typedef struct { int a; } T;\n";
    let result = Parser::new(src, "t.c").run().expect("parse");
    assert!(result.registry.is_empty());
    assert_eq!(result.text, src);
}

/// The last identifier before the parameter list names the function.
#[test]
fn last_identifier_wins_as_function_name() {
    let src = "\
static unsigned long helper(void)
{
    /* ILC: reached */
    return 0;
}
";
    let result = Parser::new(src, "h.c").run().expect("parse");
    assert!(result.registry.find("helper").is_some());
    assert!(result.registry.find("static").is_none());
}

/// K&R style parameter declarations between the parameter list and the brace
/// are tolerated.
#[test]
fn knr_declarations_are_tolerated() {
    let src = "\
int oldstyle(x, y)
int x;
int y;
{
    /* ILC: body */
    return x + y;
}
";
    let result = Parser::new(src, "k.c").run().expect("parse");
    let func = result.registry.find("oldstyle").expect("record");
    assert_eq!(func.markers[0].line, 5);
}

/// A marker at top level (outside any body) is ignored entirely.
#[test]
fn top_level_markers_are_ignored() {
    let src = "\
/* ILC: stray */
int f(void)
{
    /* ILC: counted */
}
";
    let result = Parser::new(src, "s.c").run().expect("parse");
    let func = result.registry.find("f").expect("record");
    assert_eq!(func.hits, 1);
    assert_eq!(func.markers[0].line, 4);
    // The stray marker produced no call.
    assert_eq!(result.text.matches("__ilc_check").count(), 1);
}

/// Prototypes and variable declarations produce nothing.
#[test]
fn prototypes_and_variables_produce_nothing() {
    let src = "\
int proto(int x);
int global_counter;
";
    let result = Parser::new(src, "p.c").run().expect("parse");
    assert!(result.registry.is_empty());
    assert_eq!(result.text, src);
}

/// End of input inside a parameter list is a syntax error naming end of
/// input and the line it happened on.
#[test]
fn eof_in_parameter_list_is_a_syntax_error() {
    let err = Parser::new("int func (", "test.c").run().unwrap_err();
    match err {
        ParseError::Syntax { ref file, line, ref found } => {
            assert_eq!(file, "test.c");
            assert_eq!(line, 1);
            assert!(found.contains("end of input"), "found = {found}");
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
    let rendered = err.to_string();
    assert!(rendered.contains("test.c"));
    assert!(rendered.contains("line 1"));
}

/// An unbalanced brace aborts the whole parse.
#[test]
fn unbalanced_brace_is_fatal() {
    let src = "\
int broken(void)
{
    if (1) {
        /* ILC: seen before the error */
    }
";
    let err = Parser::new(src, "b.c").run().unwrap_err();
    assert!(matches!(err, ParseError::Syntax { .. }));
}

/// A stray closing brace at top level is rejected rather than skipped.
#[test]
fn stray_close_brace_is_fatal() {
    let err = Parser::new("}\n", "c.c").run().unwrap_err();
    assert!(matches!(err, ParseError::Syntax { .. }));
}

/// End of input inside an aggregate body is fatal.
#[test]
fn eof_in_aggregate_body_is_fatal() {
    let err = Parser::new("struct s { int a;", "a.c").run().unwrap_err();
    assert!(matches!(err, ParseError::Syntax { .. }));
}

/// Registry exhaustion on the marker that overflows the cap aborts the parse
/// with the resource error, not a syntax error.
#[test]
fn registry_exhaustion_aborts_the_parse() {
    let src = "\
int f(void)
{
    /* ILC: one */
    /* ILC: two */
}
";
    let parser = Parser::with_registry(src, "f.c", Registry::with_limit(1));
    let err = parser.run().unwrap_err();
    match err {
        ParseError::Registry(RegistryError::LimitReached(1)) => {}
        other => panic!("expected limit error, got {other:?}"),
    }
}

/// Braces inside string and character literals do not affect block matching.
#[test]
fn quoted_braces_do_not_confuse_block_matching() {
    let src = "\
const char *fmt(void)
{
    char open = '{';
    /* ILC: between literals */
    return \"} } {\";
}
";
    let result = Parser::new(src, "q.c").run().expect("parse");
    let func = result.registry.find("fmt").expect("record");
    assert_eq!(func.markers[0].line, 4);
}

/// Two functions in one file, markers collected per function in order.
#[test]
fn markers_are_grouped_per_function() {
    let src = "\
int first(void)
{
    /* ILC: a */
}

int second(void)
{
    /* ILC: b */
    /* ILC: c */
}
";
    let result = Parser::new(src, "two.c").run().expect("parse");
    let funcs = result.registry.functions();
    assert_eq!(funcs.len(), 2);
    assert_eq!(funcs[0].name, "first");
    assert_eq!(funcs[0].hits, 1);
    assert_eq!(funcs[1].name, "second");
    assert_eq!(funcs[1].hits, 2);
    assert_eq!(result.registry.total_markers(), 3);
}
