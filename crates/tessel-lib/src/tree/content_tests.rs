use super::{Content, ContentList, ContextId, CustomData, Value};

fn node(n: usize) -> ContextId {
    ContextId::new(n)
}

fn list(entries: &[Content]) -> ContentList {
    entries.iter().cloned().collect()
}

#[test]
fn push_text_coalesces() {
    let mut content = ContentList::new();
    content.push_text("ab");
    content.push_text("");
    content.push_text("cd");
    content.push_node(node(1));
    content.push_text("ef");

    assert_eq!(content.len(), 3);
    assert_eq!(content.first(), Some(&Content::from("abcd")));
    assert_eq!(content.last(), Some(&Content::from("ef")));
    assert_eq!(content.texts().collect::<Vec<_>>(), ["abcd", "ef"]);
}

#[test]
fn remove_node_merges_neighbours() {
    let mut content = list(&["a".into(), node(1).into(), "b".into()]);

    assert!(content.remove_node(node(1)));
    assert!(!content.remove_node(node(1)));
    assert_eq!(content.as_slice(), [Content::from("ab")]);
}

#[test]
fn remove_out_of_range() {
    let mut content = list(&["a".into()]);
    assert_eq!(content.remove(3), None);
    assert_eq!(content.len(), 1);
}

#[test]
fn splice_coalesces_both_seams() {
    let mut content = list(&["(".into(), node(4).into(), ")".into()]);
    let index = content.position_of(node(4)).unwrap();

    content.splice(index, [Content::from("x"), node(5).into(), "y".into()]);

    assert_eq!(
        content.as_slice(),
        [Content::from("(x"), node(5).into(), "y)".into()]
    );
}

#[test]
fn splice_empty_merges_neighbours() {
    let mut content = list(&["a".into(), node(2).into(), "b".into()]);
    content.splice(1, Vec::<Content>::new());
    assert_eq!(content.as_slice(), [Content::from("ab")]);
}

#[test]
fn shift_and_pop() {
    let mut content = list(&["key".into(), node(1).into(), "tail".into()]);

    assert_eq!(content.shift(), Some(Content::from("key")));
    assert_eq!(content.pop(), Some(Content::from("tail")));
    assert_eq!(content.nodes().collect::<Vec<_>>(), [node(1)]);

    content.clear();
    assert!(content.is_empty());
    assert_eq!(content.shift(), None);
}

#[test]
fn custom_data_push_wraps_scalars() {
    let mut data = CustomData::new();
    data.push("items", "a");
    data.set("single", "x");
    data.push("single", "y");
    data.set("empty", Value::Null);
    data.push("empty", 1i64);

    assert_eq!(data.array("items"), Some(&[Value::from("a")][..]));
    assert_eq!(
        data.array("single"),
        Some(&[Value::from("x"), Value::from("y")][..])
    );
    assert_eq!(data.array("empty"), Some(&[Value::Int(1)][..]));
}

#[test]
fn custom_data_is_set_ignores_null() {
    let data = CustomData::new().with("a", Value::Null).with("b", false);

    assert!(!data.is_set("a"));
    assert!(data.is_set("b"));
    assert!(!data.is_set("c"));
    assert_eq!(data.bool("b"), Some(false));
}

#[test]
fn custom_data_keeps_insertion_order() {
    let mut data: CustomData = [("z", 1i64), ("a", 2)].into_iter().collect();
    data.set("m", 3i64);
    data.remove("a");

    let keys: Vec<&str> = data.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, ["z", "m"]);
}

#[test]
fn value_serializes_nodes_as_references() {
    let value = Value::Array(vec![Value::from("a"), Value::Node(node(3)), Value::Null]);
    let json = serde_json::to_string(&value).unwrap();
    insta::assert_snapshot!(json, @r#"["a",{"$node":3},null]"#);
}
