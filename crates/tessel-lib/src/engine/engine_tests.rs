use std::sync::{Arc, Mutex};

use indoc::indoc;

use crate::definition::{
    AbsorbRule, Confirm, ContentMap, NodeDefinition, NodeId, Pattern, TokenDescriptor, TokenMode,
};
use crate::engine::{FuelLimits, PrintTracer, Verbosity};
use crate::error::{Error, ParseErrorKind};
use crate::parser::Parser;
use crate::test_utils::{ROOT, html, parse, path};
use crate::tree::{Content, ContextId, ParseTree, Value};
use tessel_core::Colors;

const A: NodeId = NodeId::new(1);
const B: NodeId = NodeId::new(2);

fn texts(tree: &ParseTree, id: ContextId) -> Vec<String> {
    tree.context(id)
        .content()
        .iter()
        .map(|entry| match entry {
            Content::Text(s) => s.clone(),
            Content::Node(id) => id.to_string(),
        })
        .collect()
}

fn parens(rule: Option<AbsorbRule>) -> Vec<NodeDefinition> {
    let mut paren = NodeDefinition::new(A)
        .label("Paren")
        .starts_with("(")
        .ends_with(")")
        .recognizes([A]);
    if let Some(rule) = rule {
        paren = paren.absorbs(A, rule);
    }
    vec![NodeDefinition::new(ROOT).label("Root").recognizes([A]), paren]
}

#[test]
fn empty_input_yields_bare_root() {
    let tree = path::parser().parse("").unwrap();
    assert_eq!(tree.len(), 1);
    assert!(tree.root().content().is_empty());
    assert_eq!(tree.root().label(), "Path");
}

#[test]
fn text_only_input_is_one_fragment() {
    let tree = path::parser().parse("/plain/route").unwrap();
    assert_eq!(texts(&tree, ContextId::ROOT), ["/plain/route"]);
}

#[test]
fn default_tokens_are_kept_as_content() {
    let tree = parse(parens(None), "x(a(b)c)y").unwrap();

    assert_eq!(texts(&tree, ContextId::ROOT), ["x", "#1", "y"]);
    assert_eq!(texts(&tree, ContextId::new(1)), ["(a", "#2", "c)"]);
    assert_eq!(texts(&tree, ContextId::new(2)), ["(b)"]);
}

#[test]
fn self_join_flattens_nested_groups() {
    let tree = parse(parens(Some(AbsorbRule::Join)), "x(a(b)c)y").unwrap();

    assert_eq!(texts(&tree, ContextId::new(1)), ["(a(b)c)"]);
    assert_eq!(tree.root().children().count(), 1);
}

#[test]
fn route_params_and_wildcards() {
    let tree = path::parser()
        .parse("/test/:name1-:name2(a(?:test(inside))b)/*(d)/test/*/:ending")
        .unwrap();
    let data = |n: usize| tree.context(ContextId::new(n)).data();

    assert_eq!(
        texts(&tree, ContextId::ROOT),
        ["/test/", "#1", "-", "#2", "/", "#6", "/test/", "#8", "/", "#9"]
    );
    assert_eq!(tree.context(ContextId::new(1)).node_id(), path::PARAM);
    assert_eq!(tree.context(ContextId::new(2)).node_id(), path::PARAM);
    assert_eq!(data(1).str("key"), Some("name1"));
    assert_eq!(data(2).str("key"), Some("name2"));
    assert_eq!(data(2).str("regex"), Some("a(?:test(inside))b"));
    assert_eq!(data(6).str("regex"), Some("d"));
    assert!(data(8).is_empty());
    assert_eq!(data(9).str("key"), Some("ending"));
    assert!(tree.context(ContextId::new(2)).content().is_empty());
}

#[test]
fn earliest_match_wins_and_end_token_breaks_ties() {
    const ITEM: NodeId = NodeId::new(2);
    // `;` closes A and also starts ITEM; the end token is tried first.
    let tree = parse(
        vec![
            NodeDefinition::new(ROOT).recognizes([A, ITEM]),
            NodeDefinition::new(A)
                .starts_with(TokenDescriptor::new("{").omit())
                .ends_with(TokenDescriptor::new(";").omit())
                .recognizes([ITEM]),
            NodeDefinition::new(ITEM)
                .starts_with(TokenDescriptor::new(";").omit())
                .ends_with(TokenDescriptor::new("!").omit()),
        ],
        "{a;b!",
    )
    .unwrap();

    assert_eq!(tree.len(), 2);
    assert_eq!(texts(&tree, ContextId::ROOT), ["#1", "b!"]);
    assert_eq!(texts(&tree, ContextId::new(1)), ["a"]);
}

#[test]
fn ejected_start_token_stays_with_parent() {
    let tree = parse(
        vec![
            NodeDefinition::new(ROOT).recognizes([A]),
            NodeDefinition::new(A)
                .label("Mention")
                .starts_with(TokenDescriptor::new("@").eject())
                .ends_with(TokenDescriptor::new(Pattern::regex(r"\W")).eject())
                .closes_at_eof(true),
        ],
        "hi @bob!",
    )
    .unwrap();

    assert_eq!(texts(&tree, ContextId::ROOT), ["hi @", "#1", "!"]);
    let mention = tree.context(ContextId::new(1));
    assert_eq!(texts(&tree, mention.id()), ["bob"]);
    assert_eq!(mention.start().offset, 4);
    assert_eq!(mention.end().offset, 7);
}

#[test]
fn default_delimiters_round_trip() {
    for source in ["x(a(b)c)y", "()", "a\n(é(\n)ü)", "plain", ""] {
        let tree = parse(parens(None), source).unwrap();
        assert_eq!(tree.root().text(), source);
    }
}

#[test]
fn omitted_delimiters_are_the_only_loss() {
    let tree = parse(
        vec![
            NodeDefinition::new(ROOT).recognizes([A]),
            NodeDefinition::new(A)
                .starts_with(TokenDescriptor::new("{").omit())
                .ends_with(TokenDescriptor::new("}").omit())
                .recognizes([A]),
        ],
        "a{b{c}d}e{}",
    )
    .unwrap();

    assert_eq!(tree.root().text(), "abcde");
}

#[test]
fn ejected_delimiters_move_but_stay() {
    let source = "hi @bob, @al";
    let tree = parse(
        vec![
            NodeDefinition::new(ROOT).recognizes([A]),
            NodeDefinition::new(A)
                .starts_with(TokenDescriptor::new("@").eject())
                .ends_with(TokenDescriptor::new(Pattern::regex(r"[ ,]")).eject())
                .closes_at_eof(true),
        ],
        source,
    )
    .unwrap();

    assert_eq!(texts(&tree, ContextId::ROOT), ["hi @", "#1", ", @", "#2"]);
    assert_eq!(tree.root().text(), source);
}

#[test]
fn route_text_drops_only_lifted_and_omitted_parts() {
    let tree = path::parser().parse("/users/:id/files/*").unwrap();

    // `:id` is shifted into `key`; `*` is omitted.
    assert_eq!(tree.root().text(), "/users//files/");
    assert_eq!(tree.context(ContextId::new(1)).data().str("key"), Some("id"));
}

#[test]
fn zero_width_end_token_closes_at_eof() {
    let tree = parse(
        vec![
            NodeDefinition::new(ROOT).recognizes([A]),
            NodeDefinition::new(A)
                .starts_with(TokenDescriptor::new("#").omit())
                .ends_with(TokenDescriptor::new(Pattern::regex(r"(?m)$")).omit()),
        ],
        "#a\n#b\n#",
    )
    .unwrap();

    assert_eq!(texts(&tree, ContextId::ROOT), ["#1", "\n", "#2", "\n", "#3"]);
    assert_eq!(texts(&tree, ContextId::new(2)), ["b"]);
    assert!(tree.context(ContextId::new(3)).content().is_empty());
}

#[test]
fn unterminated_context_is_a_block_error() {
    let err = parse(parens(None), "((a)").unwrap_err();
    let err = err.as_parse().unwrap();

    assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
    assert!(err.block);
    assert_eq!(err.span.range(), 0..4);
    insta::assert_snapshot!(err.to_string(), @r#"error at 1:1: unexpected end of input while parsing "Paren[1]" (#1)"#);
}

#[test]
fn exec_fuel_is_bounded() {
    let parser = Parser::register(parens(None), ROOT)
        .unwrap()
        .limits(FuelLimits::new().exec_fuel(3));

    assert!(parser.parse("()").is_ok());
    assert_eq!(
        parser.parse("()()()").unwrap_err(),
        Error::ExecFuelExhausted(3)
    );
}

#[test]
fn limits_are_off_by_default() {
    let parser = Parser::register(parens(None), ROOT).unwrap();
    assert_eq!(parser.get_limits(), FuelLimits::default());
    assert_eq!(parser.get_limits().get_exec_fuel(), None);
    assert_eq!(parser.get_limits().get_recursion_limit(), None);

    let deep = format!("{}{}", "(".repeat(2000), ")".repeat(2000));
    let tree = parser.parse(&deep).unwrap();
    assert_eq!(tree.len(), 2001);
    assert_eq!(tree.context(ContextId::new(2000)).level(), 2000);
}

#[test]
fn nesting_is_bounded() {
    let parser = Parser::register(parens(None), ROOT)
        .unwrap()
        .limits(FuelLimits::new().recursion_limit(3));

    assert!(parser.parse("(())").is_ok());
    assert_eq!(
        parser.parse("((()))").unwrap_err(),
        Error::RecursionLimitExceeded(3)
    );
}

#[test]
fn unknown_recognized_id() {
    let err = parse(
        vec![NodeDefinition::new(ROOT).label("Root").recognizes([NodeId::new(9)])],
        "x",
    )
    .unwrap_err();
    let err = err.as_parse().unwrap();

    assert_eq!(err.kind, ParseErrorKind::UnknownNode);
    insta::assert_snapshot!(err.to_string(), @r#"error at 1:1: "Root[0]" recognizes node id 9, which is not registered"#);
}

#[test]
fn dynamic_end_token_follows_captured_quote() {
    let tree = parse(
        vec![
            NodeDefinition::new(ROOT).recognizes([A]),
            NodeDefinition::new(A)
                .starts_with(TokenDescriptor::new(Pattern::regex(r#"(?<q>["'])"#)).omit())
                .ends_with(
                    TokenDescriptor::new(Pattern::dynamic(|data| {
                        Pattern::literal(data.str("q").unwrap_or("\""))
                    }))
                    .omit(),
                ),
        ],
        r#"'a"b' "c'd""#,
    )
    .unwrap();

    assert_eq!(texts(&tree, ContextId::new(1)), [r#"a"b"#]);
    assert_eq!(texts(&tree, ContextId::new(2)), ["c'd"]);
    assert_eq!(texts(&tree, ContextId::ROOT), ["#1", " ", "#2"]);
}

#[test]
fn escaped_quotes_do_not_close() {
    let tree = html::parser()
        .parse(r#"<a title="say \"hi\"" href="x">go</a>"#)
        .unwrap();
    let tag = tree.root().children().next().unwrap();
    let attrs: Vec<(String, String)> = tag
        .children()
        .filter(|n| n.node_id() == html::ATTRIBUTE)
        .map(|n| {
            let data = n.data();
            (
                data.str("key").unwrap_or_default().to_string(),
                data.str("value").unwrap_or_default().to_string(),
            )
        })
        .collect();

    assert_eq!(
        attrs,
        [
            ("title".to_string(), r#"say \"hi\""#.to_string()),
            ("href".to_string(), "x".to_string()),
        ]
    );
}

#[test]
fn void_tags_take_no_inner_content() {
    let tree = html::parser().parse("<p>a<br>b<img src=\"i\"/>c</p>").unwrap();
    let inner = tree.context(ContextId::new(2));

    assert_eq!(inner.label(), "Inner");
    let shape = texts(&tree, inner.id());
    assert_eq!(shape, ["a", "#3", "b", "#4", "c"]);
    assert_eq!(tree.context(ContextId::new(3)).data().bool("void"), Some(true));
    assert!(tree.context(ContextId::new(4)).data().is_set("void"));
}

#[test]
fn mismatched_closing_tag() {
    let source = "<b>x</i>";
    let err = html::parser().parse(source).unwrap_err();
    let err = err.as_parse().unwrap();

    assert_eq!(err.kind, ParseErrorKind::Mismatch);
    assert!(err.block);
    assert_eq!(err.span.range(), 0..8);
    assert_eq!(err.related.len(), 1);
    assert_eq!(err.related[0].0.range(), 4..8);
    insta::assert_snapshot!(err.to_string(), @"error at 1:1: expected </b>, found </i>");
}

#[test]
fn confirm_can_reject_or_change_mode() {
    let definitions = vec![
        NodeDefinition::new(ROOT).recognizes([A]),
        NodeDefinition::new(A)
            .label("Var")
            .starts_with(TokenDescriptor::new(Pattern::regex(r"\$(?<name>\w+)")).confirm(
                |_, m| {
                    Ok(match m.capture("name") {
                        Some("no") => Confirm::Reject,
                        Some("raw") => Confirm::AcceptAs(TokenMode::Omit),
                        _ => Confirm::Accept,
                    })
                },
            ))
            .ends_with(TokenDescriptor::new(";").omit()),
    ];
    let parser = Parser::register(definitions, ROOT).unwrap();
    let mut tracer = PrintTracer::new(Verbosity::Default, Colors::OFF);
    let tree = parser.parse_traced("$no;$yes;$raw;", &mut tracer).unwrap();

    assert_eq!(texts(&tree, ContextId::ROOT), ["$no;", "#1", "#2"]);
    assert_eq!(texts(&tree, ContextId::new(1)), ["$yes"]);
    assert!(tree.context(ContextId::new(2)).content().is_empty());
    assert_eq!(tree.context(ContextId::new(2)).data().str("name"), Some("raw"));
    assert_eq!(tracer.lines()[0], r"! /\$(?<name>\w+)/ at 0");
}

#[test]
fn rejection_only_skips_the_rejecting_type() {
    // Both types open on `<`; A always declines, so B takes it.
    let tree = parse(
        vec![
            NodeDefinition::new(ROOT).recognizes([A, B]),
            NodeDefinition::new(A)
                .starts_with(TokenDescriptor::new("<").omit().confirm(|_, _| Ok(Confirm::Reject)))
                .ends_with(TokenDescriptor::new(">").omit()),
            NodeDefinition::new(B)
                .starts_with(TokenDescriptor::new("<").omit())
                .ends_with(TokenDescriptor::new(">").omit()),
        ],
        "<x>",
    )
    .unwrap();

    assert_eq!(tree.root().children().count(), 1);
    assert_eq!(tree.context(ContextId::new(1)).node_id(), B);
    assert_eq!(texts(&tree, ContextId::new(1)), ["x"]);
}

#[test]
fn rejected_end_token_leaves_delimiter_to_children() {
    // `;` ends A unless `x` follows, in which case it opens B.
    let tree = parse(
        vec![
            NodeDefinition::new(ROOT).recognizes([A]),
            NodeDefinition::new(A)
                .starts_with(TokenDescriptor::new("[").omit())
                .ends_with(TokenDescriptor::new(";").omit().confirm(|cx, _| {
                    Ok(if cx.rest().starts_with(";x") {
                        Confirm::Reject
                    } else {
                        Confirm::Accept
                    })
                }))
                .recognizes([B]),
            NodeDefinition::new(B)
                .starts_with(TokenDescriptor::new(";").omit())
                .ends_with(TokenDescriptor::new("x").omit()),
        ],
        "[a;xb;c",
    )
    .unwrap();

    assert_eq!(texts(&tree, ContextId::ROOT), ["#1", "c"]);
    assert_eq!(texts(&tree, ContextId::new(1)), ["a", "#2", "b"]);
    assert_eq!(tree.context(ContextId::new(2)).node_id(), B);
}

#[test]
fn confirm_advance_is_not_undone() {
    // The hook swallows the `!` after `<`.
    let tree = parse(
        vec![
            NodeDefinition::new(ROOT).recognizes([A]),
            NodeDefinition::new(A)
                .starts_with(TokenDescriptor::new("<").omit().confirm(|cx, _| {
                    cx.advance(2);
                    Ok(Confirm::Accept)
                }))
                .ends_with(TokenDescriptor::new(">").omit()),
        ],
        "<!x>y",
    )
    .unwrap();

    assert_eq!(texts(&tree, ContextId::new(1)), ["x"]);
    assert_eq!(texts(&tree, ContextId::ROOT), ["#1", "y"]);
}

#[test]
fn end_confirm_rejection_keeps_scanning() {
    // Only a `)` followed by `;` closes.
    let tree = parse(
        vec![
            NodeDefinition::new(ROOT).recognizes([A]),
            NodeDefinition::new(A)
                .starts_with(TokenDescriptor::new("(").omit())
                .ends_with(TokenDescriptor::new(")").omit().confirm(|cx, _| {
                    Ok(if cx.rest().starts_with(");") {
                        Confirm::Accept
                    } else {
                        Confirm::Reject
                    })
                })),
        ],
        "(a)b);c",
    )
    .unwrap();

    assert_eq!(texts(&tree, ContextId::new(1)), ["a)b"]);
    assert_eq!(texts(&tree, ContextId::ROOT), ["#1", ";c"]);
}

#[test]
fn lifecycle_hook_order() {
    let events = Arc::new(Mutex::new(Vec::<String>::new()));
    let log = |name: &'static str| {
        let events = Arc::clone(&events);
        move |id: ContextId| events.lock().unwrap().push(format!("{name} {id}"))
    };

    let (before, after, root_pop) = (log("before"), log("after"), log("pop"));
    let (start, end, pop) = (log("start"), log("end"), log("pop"));
    let definitions = vec![
        NodeDefinition::new(ROOT)
            .recognizes([A])
            .on_before_child_parse(move |_, child| Ok(before(child)))
            .on_after_child_parse(move |_, child| Ok(after(child)))
            .on_pop(move |cx| Ok(root_pop(cx.id()))),
        NodeDefinition::new(A)
            .starts_with("{")
            .ends_with("}")
            .on_match_start(move |cx, _| Ok(start(cx.id())))
            .on_match_end(move |cx, _| Ok(end(cx.id())))
            .on_pop(move |cx| Ok(pop(cx.id()))),
    ];
    parse(definitions, "{}").unwrap();

    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        ["before #1", "start #1", "end #1", "pop #1", "after #1", "pop #0"]
    );
}

#[test]
fn append_hook_rewrites_and_vetoes() {
    let tree = parse(
        vec![
            NodeDefinition::new(ROOT)
                .recognizes([A])
                .on_append_content(|_, text| {
                    Ok((!text.trim().is_empty()).then(|| text.to_uppercase()))
                }),
            NodeDefinition::new(A)
                .starts_with(TokenDescriptor::new("{").omit())
                .ends_with(TokenDescriptor::new("}").omit()),
        ],
        "a {b} {c}",
    )
    .unwrap();

    assert_eq!(texts(&tree, ContextId::ROOT), ["A ", "#1", "#2"]);
    assert_eq!(texts(&tree, ContextId::new(1)), ["b"]);
}

#[test]
fn hook_error_is_positioned_at_cursor() {
    let err = parse(
        vec![
            NodeDefinition::new(ROOT).recognizes([A]),
            NodeDefinition::new(A)
                .starts_with("<")
                .ends_with(">")
                .on_match_start(|cx, _| Err(cx.error("no tags here"))),
        ],
        "ab<c>",
    )
    .unwrap_err();
    let err = err.as_parse().unwrap();

    assert_eq!(err.kind, ParseErrorKind::Hook);
    insta::assert_snapshot!(err.to_string(), @"error at 1:4: no tags here");
}

#[test]
fn bad_token_is_reported_at_its_source_offset() {
    let err = parse(
        vec![NodeDefinition::new(ROOT).label("Root").skip("_").bad("x")],
        "__ax",
    )
    .unwrap_err();
    let err = err.as_parse().unwrap();

    assert_eq!(err.kind, ParseErrorKind::BadToken);
    assert_eq!(err.span.range(), 3..4);
    insta::assert_snapshot!(err.to_string(), @r#"error at 1:4: the token "x" is not allowed in "Root[0]""#);
}

#[test]
fn skip_strips_and_good_is_required() {
    let definitions = || {
        vec![
            NodeDefinition::new(ROOT).recognizes([A]),
            NodeDefinition::new(A)
                .label("Num")
                .starts_with(TokenDescriptor::new("[").omit())
                .ends_with(TokenDescriptor::new("]").omit())
                .skip(Pattern::regex(r"\s+"))
                .good(Pattern::regex(r"^\d+$")),
        ]
    };

    let tree = parse(definitions(), "[ 1 2 ]").unwrap();
    assert_eq!(texts(&tree, ContextId::new(1)), ["12"]);

    let tree = parse(definitions(), "[   ]").unwrap();
    assert!(tree.context(ContextId::new(1)).content().is_empty());

    let err = parse(definitions(), "[1a]").unwrap_err();
    let err = err.as_parse().unwrap();
    assert_eq!(err.kind, ParseErrorKind::GoodTokenMissing);
    insta::assert_snapshot!(err.to_string(), @r#"error at 1:2: the text "1a" contains no token allowed in "Num[1]""#);
}

#[test]
fn delimiters_bypass_guards() {
    let tree = parse(
        vec![
            NodeDefinition::new(ROOT).recognizes([A]).bad(Pattern::regex("[()]")),
            NodeDefinition::new(A).starts_with("(").ends_with(")").bad("("),
        ],
        "a(b)c",
    )
    .unwrap();

    assert_eq!(texts(&tree, ContextId::new(1)), ["(b)"]);
}

fn absorbing(rule: AbsorbRule) -> ParseTree {
    parse(
        vec![
            NodeDefinition::new(ROOT).absorbs(A, rule),
            NodeDefinition::new(A)
                .starts_with(TokenDescriptor::new("[").omit())
                .ends_with(TokenDescriptor::new("]").omit())
                .recognizes([B]),
            NodeDefinition::new(B).starts_with("<").ends_with(">"),
        ],
        "a[b<c>d]e",
    )
    .unwrap()
}

#[test]
fn absorb_append_splices_and_reparents() {
    let tree = absorbing(AbsorbRule::Append);

    assert_eq!(texts(&tree, ContextId::ROOT), ["ab", "#2", "de"]);
    assert_eq!(tree.context(ContextId::new(2)).parent(), Some(ContextId::ROOT));
}

#[test]
fn absorb_copy_and_join_into_fields() {
    let tree = absorbing(AbsorbRule::CopyTo("items".into()));
    assert_eq!(texts(&tree, ContextId::ROOT), ["ae"]);
    assert_eq!(
        tree.root().data().array("items").unwrap(),
        [
            Value::from("b"),
            Value::Node(ContextId::new(2)),
            Value::from("d")
        ]
    );

    let tree = absorbing(AbsorbRule::JoinTo("text".into()));
    assert_eq!(texts(&tree, ContextId::ROOT), ["ae"]);
    assert_eq!(tree.root().data().str("text"), Some("b<c>d"));
}

#[test]
fn content_mappings_run_in_order() {
    let tree = parse(
        vec![
            NodeDefinition::new(ROOT).recognizes([A]),
            NodeDefinition::new(A)
                .starts_with(TokenDescriptor::new("[").omit())
                .ends_with(TokenDescriptor::new("]").omit())
                .recognizes([B])
                .map_content("first", ContentMap::First)
                .map_content("last", ContentMap::Last)
                .map_content("joined", ContentMap::Join)
                .map_content("popped", ContentMap::Pop)
                .map_content(
                    "count",
                    ContentMap::custom(|content| Some(Value::Int(content.len() as i64))),
                )
                .map_content("missing", ContentMap::custom(|_| None)),
            NodeDefinition::new(B).starts_with("<").ends_with(">"),
        ],
        "[x<y>z]",
    )
    .unwrap();

    let data = tree.context(ContextId::new(1)).data();
    assert_eq!(data.str("first"), Some("x"));
    assert_eq!(data.str("last"), Some("z"));
    assert_eq!(data.str("joined"), Some("x<y>z"));
    assert_eq!(data.str("popped"), Some("z"));
    assert_eq!(data.int("count"), Some(2));
    assert!(data.get("missing").is_none());
    assert_eq!(texts(&tree, ContextId::new(1)), ["x", "#2"]);
}

#[test]
fn join_clear_empties_content() {
    let tree = parse(
        vec![
            NodeDefinition::new(ROOT).recognizes([A]),
            NodeDefinition::new(A)
                .starts_with("{")
                .ends_with("}")
                .map_content("raw", ContentMap::JoinClear),
        ],
        "{a}",
    )
    .unwrap();

    let ctx = tree.context(ContextId::new(1));
    assert_eq!(ctx.data().str("raw"), Some("{a}"));
    assert!(ctx.content().is_empty());
}

#[test]
fn init_data_is_fresh_per_context() {
    let tree = parse(
        vec![
            NodeDefinition::new(ROOT).recognizes([A]),
            NodeDefinition::new(A)
                .starts_with("{")
                .ends_with("}")
                .init_data(|| crate::CustomData::new().with("seen", 0i64))
                .on_match_end(|cx, _| {
                    let seen = cx.data().int("seen").unwrap_or_default();
                    cx.data_mut().set("seen", seen + 1);
                    Ok(())
                }),
        ],
        "{}{}",
    )
    .unwrap();

    assert_eq!(tree.context(ContextId::new(1)).data().int("seen"), Some(1));
    assert_eq!(tree.context(ContextId::new(2)).data().int("seen"), Some(1));
}

#[test]
fn hooks_can_steer_icons() {
    let tree = parse(
        vec![
            NodeDefinition::new(ROOT).recognizes([A]),
            NodeDefinition::new(A)
                .icon("○")
                .starts_with("{")
                .ends_with("}")
                .on_pop(|cx| {
                    if cx.content().len() > 1 {
                        cx.set_icon("●");
                    }
                    Ok(())
                })
                .recognizes([A]),
        ],
        "{}{{}}",
    )
    .unwrap();

    let icons: Vec<&str> = tree.root().children().map(|n| n.icon()).collect();
    assert_eq!(icons, ["○", "●"]);
}

#[test]
fn parses_are_isolated() {
    let parser = html::parser();
    let first = parser.parse("<i>a</i>").unwrap();
    let second = parser.parse("<i>a</i>").unwrap();
    assert_eq!(first.root().to_tree(), second.root().to_tree());
}

#[test]
fn parser_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Parser>();

    let parser = Arc::new(path::parser());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let parser = Arc::clone(&parser);
            std::thread::spawn(move || {
                let tree = parser.parse(&format!("/:p{i}")).unwrap();
                tree.context(ContextId::new(1)).data().str("key").map(str::to_string)
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Some(format!("p{i}")));
    }
}

#[test]
fn trace_default_verbosity() {
    let mut tracer = PrintTracer::new(Verbosity::Default, Colors::OFF);
    path::parser().parse_traced("/:a(b)", &mut tracer).unwrap();

    insta::assert_snapshot!(tracer.dump(), @r#"
    "/"
    + Param#1 @1:2
      "a"
      + Regex#2 @1:4
        "b"
      ^ Regex#2 -> Param#1.regex
      - Regex#2
    - Param#1
    "#);
}

#[test]
fn trace_verbose_shows_candidates() {
    let mut tracer = PrintTracer::new(Verbosity::Verbose, Colors::OFF);
    path::parser().parse_traced(":a", &mut tracer).unwrap();

    // The first candidate matches at the cursor, so the wildcard is never searched.
    insta::assert_snapshot!(tracer.dump(), @r#"
    @ 1:1
    ? Param[1] /:/ -> 0
    + Param#1 @1:1
      @ 1:2
      ? end /[/\-]/ -> none
      ? Regex[2] /\(/ -> none
      "a"
    $ Param#1
    - Param#1
    "#);
}

#[test]
fn registration_errors() {
    let duplicate = Parser::register(
        [
            NodeDefinition::new(ROOT).label("Root"),
            NodeDefinition::new(ROOT).label("Other"),
        ],
        ROOT,
    )
    .unwrap_err();
    insta::assert_snapshot!(duplicate.to_string(), @r#"node id 0 is used by both "Root" and "Other""#);

    let missing = Parser::register([NodeDefinition::new(A)], ROOT).unwrap_err();
    assert_eq!(missing, Error::MissingRoot(ROOT));

    let bad_regex = Parser::register(
        [NodeDefinition::new(ROOT).skip(Pattern::regex("[a-"))],
        ROOT,
    )
    .unwrap_err();
    assert!(matches!(bad_regex, Error::Pattern { .. }));

    let dynamic_guard = Parser::register(
        [NodeDefinition::new(ROOT).bad(Pattern::dynamic(|_| Pattern::literal("x")))],
        ROOT,
    )
    .unwrap_err();
    assert!(matches!(dynamic_guard, Error::Pattern { .. }));
}

#[test]
fn registered_definitions_are_inspectable() {
    let parser = path::parser();
    assert_eq!(parser.root(), ROOT);
    assert_eq!(parser.get(path::PARAM).map(|d| d.label_str()), Some("Param"));
    assert!(parser.get(NodeId::new(42)).is_none());

    let labels: Vec<&str> = parser.definitions().map(|d| d.label_str()).collect();
    assert_eq!(labels, ["Path", "Param", "Regex", "Paren", "Wildcard"]);
}

#[test]
fn multiline_positions() {
    let source = indoc! {"
        first
        :second
    "};
    let tree = path::parser().parse(source).unwrap();
    let param = tree.context(ContextId::new(1));

    assert_eq!(param.start().row, 2);
    assert_eq!(param.start().column, 1);
    assert_eq!(param.data().str("key"), Some("second\n"));
}
