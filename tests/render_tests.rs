// ABOUTME: Integration tests for the layer render engine
// ABOUTME: Covers insertion, conditionals, cycles, missing layers, fast mode and getters

use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use layercake::engine::{
    render, FnGetter, Getter, GetterCall, GetterSet, LayerKey, RenderError, RenderOptions,
    Rendered, Renderer,
};
use layercake::parser::SyntaxErrorKind;

mod common;
use common::{exact, CountingGetter, LayerSetBuilder};

async fn render_text(builder: LayerSetBuilder) -> Result<String, RenderError> {
    let source = builder.build();
    let options = RenderOptions::default();
    render(None, &source, &options, &GetterSet::None)
        .await
        .map(Rendered::into_text)
}

#[tokio::test]
async fn test_hello_world() {
    let result = render_text(
        LayerSetBuilder::new()
            .layer("start", "Hello, {{=name}}!")
            .layer("name", "World"),
    )
    .await
    .unwrap();

    assert_eq!(result, "Hello, World!");
}

#[tokio::test]
async fn test_implicit_insert_and_nested_layers() {
    let result = render_text(
        LayerSetBuilder::new()
            .layer("start", "<{{header}}>")
            .layer("header", "{{title}} - {{ subtitle }}")
            .layer("title", "Report")
            .layer("subtitle", "Q3"),
    )
    .await
    .unwrap();

    assert_eq!(result, "<Report - Q3>");
}

#[tokio::test]
async fn test_if_else_follows_truthiness() {
    let template = "{{if flag}}Yes{{else}}No{{end}}";

    let truthy = render_text(
        LayerSetBuilder::new()
            .layer("start", template)
            .layer("flag", "x"),
    )
    .await
    .unwrap();
    assert_eq!(truthy, "Yes");

    let falsy = render_text(
        LayerSetBuilder::new()
            .layer("start", template)
            .layer("flag", ""),
    )
    .await
    .unwrap();
    assert_eq!(falsy, "No");

    for (value, expected) in [
        (json!(0), "No"),
        (json!(false), "No"),
        (json!(null), "No"),
        (json!(1), "Yes"),
        (json!(true), "Yes"),
        (json!([]), "Yes"),
        (json!("0"), "Yes"),
    ] {
        let result = render_text(
            LayerSetBuilder::new()
                .layer("start", template)
                .value("flag", value.clone()),
        )
        .await
        .unwrap();
        assert_eq!(result, expected, "flag = {}", value);
    }
}

#[tokio::test]
async fn test_unless_is_negated_if() {
    let absent = render_text(LayerSetBuilder::new().layer("start", "{{unless flag}}No flag{{end}}"))
        .await
        .unwrap();
    assert_eq!(absent, "No flag");

    for flag in ["", "set"] {
        let with_if = render_text(
            LayerSetBuilder::new()
                .layer("start", "{{if flag}}A{{else}}B{{end}}")
                .layer("flag", flag),
        )
        .await
        .unwrap();
        let with_unless = render_text(
            LayerSetBuilder::new()
                .layer("start", "{{unless flag}}B{{else}}A{{end}}")
                .layer("flag", flag),
        )
        .await
        .unwrap();
        assert_eq!(with_if, with_unless);
    }
}

#[tokio::test]
async fn test_nested_conditionals() {
    let template = "{{if a}}A{{if b}}B{{else}}b{{end}}{{else}}{{if b}}x{{end}}-{{end}}.";
    let cases = [
        ("1", "1", "AB."),
        ("1", "", "Ab."),
        ("", "1", "x-."),
        ("", "", "-."),
    ];

    for (a, b, expected) in cases {
        let result = render_text(
            LayerSetBuilder::new()
                .layer("start", template)
                .layer("a", a)
                .layer("b", b),
        )
        .await
        .unwrap();
        assert_eq!(result, expected, "a = {:?}, b = {:?}", a, b);
    }
}

#[tokio::test]
async fn test_conditional_target_is_rendered_before_testing() {
    // `flag` renders to an empty string because `inner` is missing
    let result = render_text(
        LayerSetBuilder::new()
            .layer("start", "{{if flag}}shown{{else}}hidden{{end}}")
            .layer("flag", "{{=inner}}"),
    )
    .await
    .unwrap();

    assert_eq!(result, "hidden");
}

#[tokio::test]
async fn test_cyclic_dependence_names_the_chain() {
    let error = render_text(
        LayerSetBuilder::new()
            .layer("start", "{{=a}}")
            .layer("a", "{{=start}}"),
    )
    .await
    .unwrap_err();

    match error {
        RenderError::CyclicDependence { ref chain } => {
            assert_eq!(chain, &["start", "a", "start"]);
        }
        other => panic!("expected cyclic dependence, got {:?}", other),
    }
    assert!(error.to_string().contains("start -> a -> start"));
}

#[tokio::test]
async fn test_cycle_detected_from_either_side() {
    for entry in ["a", "b"] {
        let source = LayerSetBuilder::new()
            .layer("a", "{{=b}}")
            .layer("b", "{{=a}}")
            .build();
        let options = RenderOptions::default().with_entry_point(entry);
        let error = render(None, &source, &options, &GetterSet::None)
            .await
            .unwrap_err();

        match error {
            RenderError::CyclicDependence { chain } => {
                assert!(chain.contains(&"a".to_string()));
                assert!(chain.contains(&"b".to_string()));
                assert_eq!(chain.first(), Some(&entry.to_string()));
            }
            other => panic!("expected cyclic dependence, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_repeated_inserts_are_not_cycles() {
    let result = render_text(
        LayerSetBuilder::new()
            .layer("start", "{{=a}}{{=a}}{{=b}}")
            .layer("a", "a")
            .layer("b", "[{{=a}}]"),
    )
    .await
    .unwrap();

    assert_eq!(result, "aa[a]");
}

#[tokio::test]
async fn test_broken_control_sequence_is_reported() {
    let error = render_text(LayerSetBuilder::new().layer("start", "{{if a}}{{end}}{{else}}"))
        .await
        .unwrap_err();

    match error {
        RenderError::Syntax(ref report) => {
            assert!(report.contains(SyntaxErrorKind::BrokenControlSequence));
            assert_eq!(report.layer(), "start");
        }
        ref other => panic!("expected syntax report, got {:?}", other),
    }
    assert!(error.to_string().contains("{{else}}"));
}

#[tokio::test]
async fn test_delimiter_after_operator_is_rejected() {
    for template in [
        "[{{= .name}}]",
        "[{{= [name]}}]",
        "[{{= (name)}}]",
        "[{{if .name}}yes{{end}}]",
    ] {
        let error = render_text(
            LayerSetBuilder::new()
                .layer("start", template)
                .layer("name", "X")
                .layer("if", "IFLAYER"),
        )
        .await
        .unwrap_err();

        match error {
            RenderError::Syntax(ref report) => {
                assert!(
                    report.contains(SyntaxErrorKind::DelimiterWithoutLexeme),
                    "{} gave {}",
                    template,
                    report
                );
                assert!(!report.contains(SyntaxErrorKind::BrokenControlSequence));
            }
            ref other => panic!("{} gave {:?}", template, other),
        }
    }
}

#[tokio::test]
async fn test_empty_insert_has_too_few_parts() {
    let error = render_text(LayerSetBuilder::new().layer("start", "{{= }}"))
        .await
        .unwrap_err();

    match error {
        RenderError::TooFewParts { layer, excerpt } => {
            assert_eq!(layer, "start");
            assert!(excerpt.contains("placeholder: \"{{= }}\""));
        }
        other => panic!("expected too few parts, got {:?}", other),
    }
}

#[tokio::test]
async fn test_extra_tokens_are_too_many_parts() {
    for template in [
        "{{= a b}}",
        "{{a b}}",
        "{{if a}}{{else x}}{{end}}",
        "{{if a b}}{{end}}",
    ] {
        let error = render_text(LayerSetBuilder::new().layer("start", template))
            .await
            .unwrap_err();
        assert!(
            matches!(error, RenderError::TooManyParts { .. }),
            "{} gave {:?}",
            template,
            error
        );
    }
}

#[tokio::test]
async fn test_arity_is_checked_in_hidden_branches() {
    let error = render_text(LayerSetBuilder::new().layer("start", "{{if off}}{{= a b}}{{end}}"))
        .await
        .unwrap_err();
    assert!(matches!(error, RenderError::TooManyParts { .. }));
}

#[tokio::test]
async fn test_missing_layer_uses_substitute() {
    let source = LayerSetBuilder::new()
        .layer("start", "[{{=nothing}}]")
        .build();

    let plain = render(None, &source, &RenderOptions::default(), &GetterSet::None)
        .await
        .unwrap();
    assert_eq!(plain.to_text(), "[]");

    let options = RenderOptions::default().with_missing(json!("?"));
    let substituted = render(None, &source, &options, &GetterSet::None)
        .await
        .unwrap();
    assert_eq!(substituted.to_text(), "[?]");
}

#[tokio::test]
async fn test_missing_entry_point_is_an_error() {
    let source = LayerSetBuilder::new().layer("other", "x").build();
    let error = render(None, &source, &RenderOptions::default(), &GetterSet::None)
        .await
        .unwrap_err();
    assert!(matches!(error, RenderError::MissingEntryPoint { .. }));
}

#[tokio::test]
async fn test_data_leaves_are_inserted_as_text() {
    let result = render_text(
        LayerSetBuilder::new()
            .layer("start", "{{count}} {{ratio}} {{on}} {{list}} {{nothing}}|")
            .value("count", json!(3))
            .value("ratio", json!(0.5))
            .value("on", json!(true))
            .value("list", json!([1, 2]))
            .value("nothing", Value::Null),
    )
    .await
    .unwrap();

    assert_eq!(result, "3 0.5 true [1,2] |");
}

#[tokio::test]
async fn test_pass_through_entry_point() {
    let source = LayerSetBuilder::new()
        .value("start", json!({"users": 2}))
        .build();
    let rendered = render(None, &source, &RenderOptions::default(), &GetterSet::None)
        .await
        .unwrap();
    assert_eq!(rendered, Rendered::Data(json!({"users": 2})));
}

#[tokio::test]
async fn test_inline_template_and_entry_override() {
    let source = LayerSetBuilder::new()
        .layer("main", "unused")
        .layer("who", "you")
        .build();
    let options = RenderOptions::default().with_entry_point("main");

    let rendered = render(Some("Hi {{who}}"), &source, &options, &GetterSet::None)
        .await
        .unwrap();
    assert_eq!(rendered.to_text(), "Hi you");
}

#[tokio::test]
async fn test_custom_placeholder_tags() {
    let source = LayerSetBuilder::new()
        .layer("start", "<%= name %> and {{name}}")
        .layer("name", "Ada")
        .build();
    let options = RenderOptions::default().with_tags("<%", "%>");

    let rendered = render(None, &source, &options, &GetterSet::None)
        .await
        .unwrap();
    assert_eq!(rendered.to_text(), "Ada and {{name}}");
}

#[tokio::test]
async fn test_pattern_keys() {
    let source = LayerSetBuilder::new()
        .layer("start", "{{=greeting_en}} / {{=greeting_fr}}")
        .pattern("^greeting_", "Hello")
        .build_source();
    let rendered = render(None, &source, &RenderOptions::default(), &GetterSet::None)
        .await
        .unwrap();
    assert_eq!(rendered.to_text(), "Hello / Hello");
}

#[tokio::test]
async fn test_idempotent_render() {
    let source = LayerSetBuilder::new()
        .layer("start", "{{if a}}{{=b}}{{end}}-{{=b}}")
        .layer("a", "1")
        .layer("b", "bee")
        .build();
    let options = RenderOptions::default();
    let renderer = Renderer::new(&source, &options);

    let first = renderer.render().await.unwrap();
    let second = renderer.render().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_text(), "bee-bee");
}

#[tokio::test]
async fn test_fast_mode_skips_repeated_getter_calls() {
    let source = LayerSetBuilder::new()
        .layer("start", "{{=a}}{{=a}}{{if a}}!{{end}}")
        .layer("a", "x")
        .build();

    let (getter, calls) = CountingGetter::new();
    let getters = GetterSet::default().with(exact("a"), getter);

    let slow = render(None, &source, &RenderOptions::default(), &getters)
        .await
        .unwrap();
    assert_eq!(slow.to_text(), "xx!");
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    calls.store(0, Ordering::SeqCst);
    let options = RenderOptions::default().with_fast_mode(true);
    let fast = render(None, &source, &options, &getters).await.unwrap();
    assert_eq!(fast.to_text(), "xx!");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

struct DelayedGetter;

#[async_trait]
impl Getter for DelayedGetter {
    async fn get(&self, call: GetterCall<'_>) -> anyhow::Result<String> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(format!("{} {{{{=suffix}}}}", call.value.to_uppercase()))
    }
}

#[tokio::test]
async fn test_async_getter_output_is_parsed() {
    let source = LayerSetBuilder::new()
        .layer("start", "[{{=title}}]")
        .layer("title", "report")
        .layer("suffix", "v2")
        .build();
    let getters = GetterSet::default().with(exact("title"), DelayedGetter);

    let rendered = render(None, &source, &RenderOptions::default(), &getters)
        .await
        .unwrap();
    assert_eq!(rendered.to_text(), "[REPORT v2]");
}

#[tokio::test]
async fn test_getter_sees_matched_key_and_context() {
    let source = LayerSetBuilder::new()
        .layer("start", "{{=t_one}}")
        .pattern("^t_", "body")
        .build_source();
    let getters = GetterSet::default().with(
        LayerKey::pattern("^t_").unwrap(),
        FnGetter::new(|call: GetterCall<'_>| {
            Ok(format!(
                "{}|{}|{}|{}",
                call.key, call.name, call.value, call.options.entry_point
            ))
        }),
    );

    let rendered = render(None, &source, &RenderOptions::default(), &getters)
        .await
        .unwrap();
    assert_eq!(rendered.to_text(), "/^t_/|t_one|body|start");
}

#[tokio::test]
async fn test_getter_is_skipped_for_missing_and_data_layers() {
    let source = LayerSetBuilder::new()
        .layer("start", "{{=missing}}{{=count}}")
        .value("count", json!(7))
        .build();
    let (getter, calls) = CountingGetter::new();
    let getters = GetterSet::single(getter);

    let rendered = render(None, &source, &RenderOptions::default(), &getters)
        .await
        .unwrap();
    assert_eq!(rendered.to_text(), "7");
    // only the entry point itself went through the getter
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_getter_failure() {
    let source = LayerSetBuilder::new()
        .layer("start", "{{=remote}}")
        .layer("remote", "x")
        .build();
    let getters = GetterSet::default().with(
        exact("remote"),
        FnGetter::new(|_call: GetterCall<'_>| Err(anyhow::anyhow!("connection refused"))),
    );

    let error = render(None, &source, &RenderOptions::default(), &getters)
        .await
        .unwrap_err();
    match error {
        RenderError::Getter { ref name, .. } => assert_eq!(name, "remote"),
        ref other => panic!("expected getter error, got {:?}", other),
    }
    assert!(error.to_string().contains("connection refused"));
}

#[tokio::test]
async fn test_invalid_options_are_rejected() {
    let source = LayerSetBuilder::new().layer("start", "x").build();
    let options = RenderOptions::default().with_tags("{{", "");
    let error = render(None, &source, &options, &GetterSet::None)
        .await
        .unwrap_err();
    assert!(matches!(error, RenderError::Config(_)));
}
