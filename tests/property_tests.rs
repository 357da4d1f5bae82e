//! Property-based tests for the guarantees that must hold for every input:
//! encoding round trips, key registration, and integer literal rules.

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use tomldec::{from_str, parse, to_string, Table, Value};

fn roundtrip<T: Serialize + for<'de> Deserialize<'de> + PartialEq + std::fmt::Debug>(
    value: &T,
) -> bool {
    match to_string(value) {
        Ok(serialized) => match from_str::<T>(&serialized) {
            Ok(deserialized) => *value == deserialized,
            Err(e) => {
                eprintln!("Deserialize failed: {}", e);
                eprintln!("Serialized was: {}", serialized);
                false
            }
        },
        Err(e) => {
            eprintln!("Serialize failed: {}", e);
            false
        }
    }
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[ -~\t\né€]{0,12}".prop_map(Value::String),
        any::<i64>().prop_map(Value::Integer),
        any::<f64>()
            .prop_filter("nan never equals itself", |f| !f.is_nan())
            .prop_map(Value::Float),
        any::<bool>().prop_map(Value::Boolean),
    ]
}

fn key() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,8}|[a-z .\"]{1,6}"
}

fn table(depth: u32) -> BoxedStrategy<Table> {
    let value = if depth == 0 {
        leaf().boxed()
    } else {
        prop_oneof![
            6 => leaf(),
            1 => prop::collection::vec(leaf(), 0..4).prop_map(Value::Array),
            1 => prop::collection::vec(table(0).prop_map(Value::Table), 1..3).prop_map(Value::Array),
            2 => table(depth - 1).prop_map(Value::Table),
            1 => prop::collection::vec(table(depth - 1), 1..3).prop_map(Value::ArrayOfTables),
        ]
        .boxed()
    };
    prop::collection::btree_map(key(), value, 0..5)
        .prop_map(|entries| {
            let mut table = Table::new();
            for (k, v) in entries {
                table.insert(k, v);
            }
            table
        })
        .boxed()
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Record {
    id: i64,
    name: String,
    flags: Vec<bool>,
    ratio: Option<f64>,
}

proptest! {
    #[test]
    fn prop_encoded_tree_parses_back(tree in table(2)) {
        let text = to_string(&tree).unwrap();
        match parse(&text) {
            Ok(doc) => {
                prop_assert_eq!(doc.table(), &tree);
            }
            Err(e) => {
                prop_assert!(false, "failed to parse:\n{}\n{}", text, e);
            }
        }
    }

    #[test]
    fn prop_round_trip_law(tree in table(2)) {
        let first = parse(&to_string(&tree).unwrap()).unwrap();
        let second = parse(&to_string(first.table()).unwrap()).unwrap();
        prop_assert_eq!(first.table(), second.table());
    }

    #[test]
    fn prop_defined_iff_listed(tree in table(2)) {
        let doc = parse(&to_string(&tree).unwrap()).unwrap();
        let meta = doc.meta();
        for key in meta.keys() {
            let path: Vec<&str> = key.segments().iter().map(String::as_str).collect();
            prop_assert!(meta.is_defined(&path));
        }
        prop_assert!(!meta.is_defined(&["no such key", "anywhere"]));
    }

    #[test]
    fn prop_underscored_integers(n in any::<i64>(), every in 1usize..4) {
        let digits = n.unsigned_abs().to_string();
        let mut text = String::new();
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && i % every == 0 {
                text.push('_');
            }
            text.push(c);
        }
        let sign = if n < 0 { "-" } else { "" };
        let doc = parse(&format!("n = {sign}{text}")).unwrap();
        prop_assert_eq!(doc.table().get("n"), Some(&Value::Integer(n)));
    }

    #[test]
    fn prop_i32(n in any::<i32>()) {
        prop_assert!(roundtrip(&std::collections::BTreeMap::from([("n".to_string(), n)])));
    }

    #[test]
    fn prop_record(
        id in any::<i64>(),
        name in "\\PC{0,16}",
        flags in prop::collection::vec(any::<bool>(), 0..6),
        ratio in proptest::option::of(-1.0e6f64..1.0e6),
    ) {
        let record = Record { id, name, flags, ratio };
        prop_assert!(roundtrip(&record));
    }

    #[test]
    fn prop_records_as_array_of_tables(ids in prop::collection::vec(any::<i64>(), 1..5)) {
        let records: Vec<Record> = ids
            .into_iter()
            .map(|id| Record { id, name: id.to_string(), flags: vec![], ratio: None })
            .collect();
        prop_assert!(roundtrip(&std::collections::BTreeMap::from([("record".to_string(), records)])));
    }
}
