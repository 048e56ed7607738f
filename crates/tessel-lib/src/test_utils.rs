//! Grammars shared by the unit tests.

use crate::definition::{
    AbsorbRule, ContentMap, HoistRule, NodeDefinition, NodeId, Pattern,
    TokenDescriptor,
};
use crate::error::ParseErrorKind;
use crate::parser::Parser;
use crate::tree::ParseTree;

pub const ROOT: NodeId = NodeId::new(0);

/// Route-pattern grammar: `:name` parameters and `*` wildcards, each with an
/// optional parenthesized regex.
pub mod path {
    use super::*;

    pub const PARAM: NodeId = NodeId::new(1);
    pub const REGEX: NodeId = NodeId::new(2);
    pub const PAREN: NodeId = NodeId::new(3);
    pub const WILDCARD: NodeId = NodeId::new(4);

    pub fn definitions() -> Vec<NodeDefinition> {
        vec![
            NodeDefinition::new(ROOT)
                .label("Path")
                .recognizes([PARAM, WILDCARD]),
            NodeDefinition::new(PARAM)
                .label("Param")
                .starts_with(TokenDescriptor::new(":").omit())
                .ends_with(TokenDescriptor::new(Pattern::regex(r"[/\-]")).eject())
                .pops_after(REGEX)
                .hoist(HoistRule::new(REGEX, "regex").levels(1).text().remove_from_content())
                .map_content("key", ContentMap::Shift)
                .closes_at_eof(true),
            NodeDefinition::new(REGEX)
                .label("Regex")
                .starts_with(TokenDescriptor::new("(").omit())
                .ends_with(TokenDescriptor::new(")").omit())
                .absorbs(PAREN, AbsorbRule::Join),
            NodeDefinition::new(PAREN)
                .label("Paren")
                .starts_with("(")
                .ends_with(")")
                .absorbs(PAREN, AbsorbRule::Join),
            NodeDefinition::new(WILDCARD)
                .label("Wildcard")
                .starts_with(TokenDescriptor::new("*").omit())
                .ends_with(TokenDescriptor::new(Pattern::regex(r"[^*(]")).eject())
                .pops_after(REGEX)
                .hoist(HoistRule::new(REGEX, "regex").levels(1).text().remove_from_content())
                .closes_at_eof(true),
        ]
    }

    pub fn parser() -> Parser {
        Parser::register(definitions(), ROOT).unwrap()
    }
}

/// A small HTML-ish grammar exercising captures, dynamic end tokens, escape
/// handling and hooks.
pub mod html {
    use super::*;

    pub const TAG: NodeId = NodeId::new(1);
    pub const ATTRIBUTE: NodeId = NodeId::new(2);
    pub const VALUE: NodeId = NodeId::new(3);
    pub const INNER: NodeId = NodeId::new(4);

    const VOID_TAGS: &[&str] = &["img", "br", "input", "meta", "hr", "link"];

    pub fn definitions() -> Vec<NodeDefinition> {
        vec![
            NodeDefinition::new(ROOT).label("Document").recognizes([TAG]),
            NodeDefinition::new(TAG)
                .label("Tag")
                .starts_with(TokenDescriptor::new(Pattern::regex(r"<(?<tag>[\w:.\-]+)")).omit())
                .ends_with(
                    TokenDescriptor::new(Pattern::dynamic(|data| {
                        if data.bool("void") == Some(true) {
                            Pattern::regex(r"/?>")
                        } else {
                            Pattern::regex(r"(?:/>|</(?<endTag>[\w:.\-]+)\s*>)")
                        }
                    }))
                    .omit(),
                )
                .skip(Pattern::regex(r"\s"))
                .recognizes([ATTRIBUTE, INNER])
                .on_match_start(|cx, m| {
                    if let Some(tag) = m.capture("tag")
                        && VOID_TAGS.contains(&tag)
                    {
                        cx.data_mut().set("void", true);
                        cx.disable_child(INNER);
                    }
                    Ok(())
                })
                .on_after_child_parse(|cx, child| {
                    if cx.node(child).map(|n| n.node_id()) == Some(INNER) {
                        cx.clear_recognizes();
                    }
                    Ok(())
                })
                .on_match_end(|cx, m| {
                    let Some(closing) = m.capture("endTag") else {
                        return Ok(());
                    };
                    let opening = cx.data().str("tag").unwrap_or_default();
                    if closing == opening {
                        return Ok(());
                    }
                    let message = format!("expected </{opening}>, found </{closing}>");
                    Err(cx
                        .error_block(message)
                        .with_kind(ParseErrorKind::Mismatch)
                        .with_related(cx.span(m.range.clone()), "closing tag"))
                }),
            NodeDefinition::new(ATTRIBUTE)
                .label("Attribute")
                .starts_with(TokenDescriptor::new(Pattern::regex(r"(?<key>[\w:.\-]+)")).omit())
                .ends_with(TokenDescriptor::new(Pattern::regex(r"[\s/>]")).eject())
                .pops_after(VALUE)
                .hoist(HoistRule::new(VALUE, "value").levels(1).text().remove_from_content()),
            NodeDefinition::new(VALUE)
                .label("Value")
                .starts_with(TokenDescriptor::new("=\"").omit())
                .ends_with(TokenDescriptor::new("\"").omit().escape_aware()),
            NodeDefinition::new(INNER)
                .label("Inner")
                .starts_with(TokenDescriptor::new(">").omit())
                .ends_with(TokenDescriptor::new("</").eject())
                .recognizes([TAG]),
        ]
    }

    pub fn parser() -> Parser {
        Parser::register(definitions(), ROOT).unwrap()
    }
}

/// Register `definitions` with [`ROOT`] as root and parse `source`.
pub fn parse(definitions: Vec<NodeDefinition>, source: &str) -> crate::Result<ParseTree> {
    Parser::register(definitions, ROOT)?.parse(source)
}
