// ABOUTME: Integration tests for layer parsing and expression lexing
// ABOUTME: Checks control tree shape, directive classification and aggregated syntax errors

use layercake::lexer::{lex_expression, LexemeKind, SyntaxConfig};
use layercake::parser::{parse_layer, NodeKind, Operator, ParsedLayer, SyntaxErrorKind, SyntaxReport};
use layercake::report::ReportStyle;

fn parse(text: &str) -> Result<ParsedLayer, SyntaxReport> {
    parse_layer("page", text, &SyntaxConfig::default(), &ReportStyle::default())
}

fn operators(layer: &ParsedLayer) -> Vec<Operator> {
    layer
        .placeholders()
        .filter_map(|placeholder| placeholder.directive.as_ref())
        .map(|directive| directive.operator)
        .collect()
}

#[test]
fn test_parse_mixed_layer() {
    let layer = parse("Dear {{=name}},{{if vip}} welcome back{{else}} hello{{end}}.{{# footer}}")
        .expect("valid layer");

    assert_eq!(layer.name, "page");
    assert_eq!(
        operators(&layer),
        vec![
            Operator::Insert,
            Operator::If,
            Operator::Else,
            Operator::End,
            Operator::Comment,
        ]
    );
    assert_eq!(layer.references(), vec!["name", "vip"]);
}

#[test]
fn test_directive_keywords_are_case_insensitive() {
    let layer = parse("{{IF a}}x{{Else}}y{{END}}").expect("valid layer");
    assert_eq!(
        operators(&layer),
        vec![Operator::If, Operator::Else, Operator::End]
    );
}

#[test]
fn test_implicit_insert() {
    let layer = parse("{{ user.name }}").expect("valid layer");
    let directive = layer
        .placeholders()
        .next()
        .and_then(|placeholder| placeholder.directive.as_ref())
        .expect("directive");

    assert_eq!(directive.operator, Operator::Insert);
    assert!(!directive.explicit);
    assert_eq!(layer.target_name(directive), Some("user"));
}

#[test]
fn test_control_tree_outline() {
    let layer = parse("a{{if x}}b{{else}}{{=c}}{{end}}").expect("valid layer");

    let expected = "\
text \"a\"
if x
  true:
    text \"b\"
  false:
    insert c
";
    assert_eq!(layer.tree.outline(&layer.arena), expected);
}

#[test]
fn test_nested_conditionals_build_nested_blocks() {
    let layer = parse("{{unless a}}{{if b}}x{{end}}{{end}}").expect("valid layer");
    let tree = &layer.tree;

    let outer: Vec<_> = tree.nodes_in(tree.root()).collect();
    assert_eq!(outer.len(), 1);
    let NodeKind::Conditional(ref unless) = outer[0].kind else {
        panic!("expected conditional, got {:?}", outer[0].kind);
    };
    assert!(unless.invert);

    // the body of an unless runs when its target is falsy
    let inner: Vec<_> = tree.nodes_in(unless.false_path).collect();
    assert_eq!(inner.len(), 1);
    assert!(matches!(inner[0].kind, NodeKind::Conditional(ref c) if !c.invert));
    assert_eq!(tree.nodes_in(unless.true_path).count(), 0);
}

#[test]
fn test_every_error_in_a_layer_is_reported() {
    let report = parse("{{= a..b}} {{= f(x}} {{end}} {{if y}}").expect_err("invalid layer");

    assert_eq!(report.layer(), "page");
    let kinds: Vec<SyntaxErrorKind> = report.errors().iter().map(|error| error.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SyntaxErrorKind::TwoDelimitersInRow,
            SyntaxErrorKind::UnbalancedBrackets,
            SyntaxErrorKind::BrokenControlSequence,
            SyntaxErrorKind::UnclosedOperators,
        ]
    );

    let delimiters = &report.errors()[0];
    assert_eq!(delimiters.placeholder.as_deref(), Some("{{= a..b}}"));
    assert_eq!(delimiters.position, Some(6));
}

#[test]
fn test_two_else_in_a_row() {
    let report = parse("{{if a}}1{{else}}2{{else}}3{{end}}").expect_err("invalid layer");
    assert!(report.contains(SyntaxErrorKind::TwoElseInRow));
    assert_eq!(report.len(), 1);
}

#[test]
fn test_report_rendering() {
    let report = parse("{{if a}}").expect_err("unclosed");
    let text = report.to_string();

    assert!(text.starts_with("[layercake render]: 1 error found"));
    assert!(text.contains("Layer: \"page\""));
    assert!(text.contains("Error: Unclosed operators"));
    assert!(text.contains("{{if a}}"));
}

#[test]
fn test_custom_escape_character() {
    let syntax = SyntaxConfig {
        escape: '~',
        ..SyntaxConfig::default()
    };
    let layer = parse_layer("page", "{{= 'it~'s'}}", &syntax, &ReportStyle::default())
        .expect("valid layer");
    let placeholder = layer.placeholders().next().expect("placeholder");
    assert_eq!(layer.arena.get(placeholder.roots[1]).value, "it's");
}

#[test]
fn test_lex_expression_structure() {
    let (arena, expression) = lex_expression("= orders[2].lines(^1, 'x').total # sum", '\\');

    assert!(expression.issues.is_empty(), "{:?}", expression.issues);
    assert_eq!(expression.roots.len(), 2);
    assert_eq!(expression.comment.as_deref(), Some(" sum"));

    let orders = expression.roots[1];
    assert_eq!(arena.expression(orders), "orders[2].lines(^1, 'x').total");

    let kinds: Vec<LexemeKind> = std::iter::successors(Some(orders), |id| arena.get(*id).child)
        .map(|id| arena.get(id).kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            LexemeKind::Plain,
            LexemeKind::ArrayElement,
            LexemeKind::Function,
            LexemeKind::Plain,
        ]
    );
}

#[test]
fn test_blank_lines_and_unicode_blanks_separate_lexemes() {
    let (arena, expression) = lex_expression("if\u{00A0}flag\n", '\\');
    assert!(expression.issues.is_empty());
    let values: Vec<String> = expression
        .roots
        .iter()
        .map(|id| arena.expression(*id))
        .collect();
    assert_eq!(values, vec!["if", "flag"]);
}
