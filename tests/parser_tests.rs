use tomldec::{parse, parse_with_options, ErrorKind, ParseOptions, Value, ValueType};

fn structure_error(input: &str) -> String {
    let err = parse(input).unwrap_err();
    assert!(
        matches!(err.kind(), ErrorKind::Structure(_)),
        "{input:?} gave {err:?}"
    );
    err.message()
}

#[test]
fn test_duplicate_definitions_always_fail() {
    let cases = [
        "a = 1\na = 2",
        "[t]\nx = 1\n[t]",
        "[t]\n[t]",
        "a = 1\n[a]",
        "[[t]]\n[t]",
        "[t]\n[[t]]",
        "a = {}\n[a]",
        "a = [1]\n[[a]]",
        "[t]\nx.y = 1\nx.y = 2",
        "[t.x]\n[t]\nx = 1",
    ];
    for input in cases {
        structure_error(input);
    }
}

#[test]
fn test_duplicate_message_names_key() {
    assert_eq!(
        structure_error("[a]\nb = 1\n[a]"),
        "Key 'a' has already been defined."
    );
    assert_eq!(
        structure_error("a.b = 1\na.b = 2"),
        "Key 'a.b' has already been defined."
    );
}

#[test]
fn test_implicit_table_can_be_declared_once() {
    let doc = parse("a.b.c = 1\n[a.b]\nd = 2").unwrap();
    let b = doc.table().get_path(&["a", "b"]).and_then(Value::as_table).unwrap();
    assert_eq!(b.get("c"), Some(&Value::Integer(1)));
    assert_eq!(b.get("d"), Some(&Value::Integer(2)));

    structure_error("a.b.c = 1\n[a.b]\n[a.b]");

    let doc = parse("[x.y.z]\n[x]\nk = true\n[x.y]").unwrap();
    assert!(doc.meta().is_defined(&["x", "y"]));
    structure_error("[x.y.z]\n[x.y]\n[x.y]");
}

#[test]
fn test_value_cannot_become_table() {
    let msg = structure_error("a = 1\na.b = 2");
    assert!(msg.contains("'a'"), "{msg}");
    assert!(msg.contains("integer"), "{msg}");
    structure_error("a = \"s\"\n[a.b]");
}

#[test]
fn test_inline_tables_are_sealed() {
    structure_error("t = { a = 1 }\nt.b = 2");
    structure_error("t = { a = 1 }\n[t.sub]");
    assert!(parse("t = { a = 1, b = { c = 2 } }").is_ok());
    assert!(parse("t = { a = 1,\n b = 2 }").is_err());
}

#[test]
fn test_array_of_tables_context() {
    let input = r#"
[[fruit]]
name = "apple"
[fruit.physical]
color = "red"
[[fruit.variety]]
name = "red delicious"

[[fruit]]
name = "banana"
[fruit.physical]
color = "yellow"
"#;
    let doc = parse(input).unwrap();
    let fruit = doc.table().get("fruit").and_then(Value::as_array_of_tables).unwrap();
    assert_eq!(fruit.len(), 2);
    assert_eq!(
        fruit[1].get_path(&["physical", "color"]),
        Some(&Value::from("yellow"))
    );
    assert!(fruit[1].get("variety").is_none());

    structure_error("[[fruit]]\n[fruit.physical]\n[fruit.physical]");
}

#[test]
fn test_keys_resolve_against_context() {
    let doc = parse("top = 0\n[a]\nb.c = 1\n\"quoted key\" = 2\n'raw.key' = 3").unwrap();
    let meta = doc.meta();
    assert!(meta.is_defined(&["a", "b", "c"]));
    assert!(meta.is_defined(&["a", "quoted key"]));
    assert!(meta.is_defined(&["a", "raw.key"]));
    assert!(!meta.is_defined(&["b", "c"]));
}

#[test]
fn test_strings() {
    let input = r#"
basic = "tab\there \u00e9"
literal = 'C:\Users\nodejs'
multi = """
Roses are red
Violets are blue"""
folded = """\
    The quick brown \
    fox."""
raw = '''
first line
second'''
"#;
    let doc = parse(input).unwrap();
    let get = |k: &str| doc.table().get(k).and_then(Value::as_str).unwrap().to_string();
    assert_eq!(get("basic"), "tab\there é");
    assert_eq!(get("literal"), "C:\\Users\\nodejs");
    assert_eq!(get("multi"), "Roses are red\nViolets are blue");
    assert_eq!(get("folded"), "The quick brown fox.");
    assert_eq!(get("raw"), "first line\nsecond");

    let err = parse("s = \"bad \\q escape\"").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Literal(_)));
    assert!(parse("s = \"\\uD800\"").is_err());
}

#[test]
fn test_extended_dialect() {
    let input = "esc = \"\\x41\\e\"\nat = 1979-05-27T07:32";
    assert!(parse(input).is_err());
    let doc = parse_with_options(input, ParseOptions::new().extended(true)).unwrap();
    assert_eq!(doc.table().get("esc").and_then(Value::as_str), Some("A\u{1b}"));
    assert_eq!(doc.meta().type_of(&["at"]), Some(ValueType::Datetime));
}

#[test]
fn test_datetimes() {
    let doc = parse(
        "odt = 1979-05-27T00:32:00.999999-07:00\nspace = 1979-05-27 07:32:00Z\nld = 1979-05-27\nlt = 00:32:00.5",
    )
    .unwrap();
    for key in ["odt", "space", "ld", "lt"] {
        assert_eq!(doc.meta().type_name(&[key]), Some("Datetime"), "{key}");
    }
    assert!(parse("d = 1979-5-27").is_err());
    assert!(parse("t = 7:32:00").is_err());
}

#[test]
fn test_arrays_skip_comments() {
    let doc = parse("a = [\n  1, # one\n  2, # two\n]\nempty = []").unwrap();
    assert_eq!(
        doc.table().get("a"),
        Some(&Value::Array(vec![Value::Integer(1), Value::Integer(2)]))
    );
    assert_eq!(doc.table().get("empty"), Some(&Value::Array(Vec::new())));
}

#[test]
fn test_errors_carry_position_and_last_key() {
    let err = parse("a = 1\n[b]\nc = 2\nd = 99999999999999999999").unwrap_err();
    assert_eq!(err.position().map(|p| p.line), Some(4));
    assert_eq!(err.last_key().map(ToString::to_string), Some("b.d".to_string()));
    assert!(err.to_string().starts_with("toml: line 4 (last key \"b.d\"): "));
    assert!(err.usage().is_some());

    let excerpt = err.with_position();
    assert!(excerpt.contains("c = 2"), "{excerpt}");
    assert!(excerpt.contains('^'), "{excerpt}");
}

#[test]
fn test_encoding_problems() {
    assert!(parse("a = 1\0").is_err());
    assert!(tomldec::from_slice::<tomldec::Table>(b"a = \"\xfe\"").is_err());
    let table: tomldec::Table = tomldec::from_slice(b"\xef\xbb\xbfa = 1").unwrap();
    assert_eq!(table.get("a"), Some(&Value::Integer(1)));
}

#[test]
fn test_unterminated_constructs() {
    for input in ["a = \"open", "[table", "a = [1, 2", "a = { b = 1", "a ="] {
        assert!(parse(input).is_err(), "{input:?} should fail");
    }
}
