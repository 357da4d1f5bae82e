use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tomldec::{
    decode, from_str, to_string, Custom, Datetime, Decoder, ErrorKind, FromToml, NumberString,
    Primitive, Text, Value,
};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Owner {
    name: String,
    dob: Datetime,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Database {
    enabled: bool,
    ports: Vec<u16>,
    data: Vec<Vec<Value>>,
    temp_targets: BTreeMap<String, f64>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Server {
    ip: String,
    role: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Config {
    title: String,
    owner: Owner,
    database: Database,
    servers: BTreeMap<String, Server>,
}

const EXAMPLE: &str = r#"
# This is a TOML document

title = "TOML Example"

[owner]
name = "Tom Preston-Werner"
dob = 1979-05-27T07:32:00-08:00

[database]
enabled = true
ports = [ 8000, 8001, 8002 ]
data = [ ["delta", "phi"], [3.14] ]
temp_targets = { cpu = 79.5, case = 72.0 }

[servers]

[servers.alpha]
ip = "10.0.0.1"
role = "frontend"

[servers.beta]
ip = "10.0.0.2"
role = "backend"
"#;

#[test]
fn test_example_document() {
    let (config, meta) = decode::<Config>(EXAMPLE).unwrap();
    assert_eq!(config.title, "TOML Example");
    assert_eq!(config.owner.dob.to_string(), "1979-05-27T07:32:00-08:00");
    assert_eq!(config.database.ports, vec![8000, 8001, 8002]);
    assert_eq!(config.database.data[0], vec![Value::from("delta"), Value::from("phi")]);
    assert_eq!(config.database.temp_targets["cpu"], 79.5);
    assert_eq!(config.servers["beta"].role, "backend");
    assert!(meta.undecoded().is_empty());
}

#[test]
fn test_example_round_trips_through_encoder() {
    let config: Config = from_str(EXAMPLE).unwrap();
    let text = to_string(&config).unwrap();
    let back: Config = from_str(&text).unwrap();
    assert_eq!(config, back);
}

#[test]
fn test_literal_rules() {
    #[derive(Deserialize)]
    struct N {
        n: i64,
    }
    assert_eq!(from_str::<N>("n = 1_2_3_4").unwrap().n, 1234);
    assert_eq!(from_str::<N>("n = 0xDEAD_beef").unwrap().n, 0xdead_beef);
    assert_eq!(from_str::<N>("n = +99").unwrap().n, 99);

    for bad in ["n = _123", "n = 123_", "n = 1__2", "n = 012"] {
        assert!(tomldec::parse(bad).is_err(), "{bad:?} should fail");
    }
    for bad in ["f = 1.e2", "f = .5", "f = 1.", "f = 1e_2"] {
        assert!(tomldec::parse(bad).is_err(), "{bad:?} should fail");
    }
}

#[test]
fn test_integer_widths() {
    #[derive(Deserialize, Debug, PartialEq)]
    struct Widths {
        #[serde(rename = "U8")]
        u8_field: u8,
        #[serde(rename = "I")]
        i: i64,
    }

    let w: Widths = from_str("U8 = 1\nI = -1").unwrap();
    assert_eq!(w, Widths { u8_field: 1, i: -1 });

    #[derive(Deserialize, Debug)]
    struct Small {
        #[allow(dead_code)]
        value: u8,
    }
    let err = from_str::<Small>("value = 500").unwrap_err();
    assert!(err.is_range());
    assert!(matches!(err.kind(), ErrorKind::Range { value, target } if value == "500" && target == "u8"));
    assert!(err.usage().is_some());

    let err = from_str::<Small>("value = -1").unwrap_err();
    assert!(err.is_range());
}

#[test]
fn test_type_mismatch_names_both_sides() {
    #[derive(Deserialize, Debug)]
    struct Port {
        #[allow(dead_code)]
        port: u16,
    }
    let err = from_str::<Port>("\n\nport = \"80\"").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));
    assert_eq!(err.position().map(|p| p.line), Some(3));
    assert_eq!(err.last_key().map(ToString::to_string), Some("port".to_string()));
    assert!(err.to_string().starts_with("toml: line 3 (last key \"port\"): "));
    assert!(err.with_position().contains('^'));
}

#[test]
fn test_case_insensitive_fields() {
    #[derive(Deserialize, Debug, PartialEq)]
    struct Fields {
        #[serde(rename = "Key1")]
        key1: String,
        #[serde(rename = "Key3")]
        key3: String,
    }

    let (fields, meta) =
        decode::<Fields>("key1 = \"a\"\nkey2 = \"b\"\nkey3 = \"c\"").unwrap();
    assert_eq!(fields.key1, "a");
    assert_eq!(fields.key3, "c");
    let undecoded: Vec<String> = meta.undecoded().iter().map(ToString::to_string).collect();
    assert_eq!(undecoded, vec!["key2"]);
}

#[test]
fn test_exact_case_takes_precedence() {
    #[derive(Deserialize, Debug)]
    struct Named {
        #[serde(rename = "Name")]
        name: String,
    }

    let named: Named = from_str("name = \"folded\"\nName = \"exact\"").unwrap();
    assert_eq!(named.name, "exact");
    let named: Named = from_str("Name = \"exact\"\nNAME = \"folded\"").unwrap();
    assert_eq!(named.name, "exact");
    let named: Named = from_str("NAME = \"folded\"").unwrap();
    assert_eq!(named.name, "folded");
}

#[test]
fn test_open_destination_does_not_mark_children() {
    #[derive(Deserialize)]
    struct Plugin {
        name: String,
        settings: Value,
    }

    let input = "name = \"x\"\n[settings]\nlevel = 3\nmode = \"fast\"";
    let (plugin, meta) = decode::<Plugin>(input).unwrap();
    assert_eq!(plugin.name, "x");
    assert_eq!(plugin.settings.as_table().map(|t| t.len()), Some(2));
    assert!(meta.is_decoded(&["settings"]));
    let undecoded: Vec<String> = meta.undecoded().iter().map(ToString::to_string).collect();
    assert_eq!(undecoded, vec!["settings.level", "settings.mode"]);
}

#[test]
fn test_sequences_and_options() {
    #[derive(Deserialize, Debug)]
    struct Lists {
        fixed: [i32; 3],
        pair: (String, bool),
        grow: Vec<String>,
        missing: Option<Vec<i32>>,
        #[serde(default)]
        defaulted: Vec<i32>,
    }

    let lists: Lists =
        from_str("fixed = [1, 2, 3]\npair = [\"a\", true]\ngrow = []").unwrap();
    assert_eq!(lists.fixed, [1, 2, 3]);
    assert_eq!(lists.pair, ("a".to_string(), true));
    assert!(lists.grow.is_empty());
    assert!(lists.missing.is_none());
    assert!(lists.defaulted.is_empty());

    let err = from_str::<Lists>("fixed = [1, 2]\npair = [\"a\", true]\ngrow = []").unwrap_err();
    assert!(err.to_string().contains("length"));
}

#[test]
fn test_array_of_tables_into_structs() {
    #[derive(Deserialize, Debug)]
    struct Fruit {
        name: String,
        #[serde(default)]
        variety: Vec<HashMap<String, String>>,
    }
    #[derive(Deserialize, Debug)]
    struct Basket {
        fruit: Vec<Fruit>,
    }

    let input = r#"
[[fruit]]
name = "apple"

[[fruit.variety]]
name = "red delicious"

[[fruit.variety]]
name = "granny smith"

[[fruit]]
name = "banana"
"#;
    let basket: Basket = from_str(input).unwrap();
    assert_eq!(basket.fruit.len(), 2);
    assert_eq!(basket.fruit[0].variety.len(), 2);
    assert_eq!(basket.fruit[0].variety[1]["name"], "granny smith");
    assert!(basket.fruit[1].variety.is_empty());
}

#[test]
fn test_floats() {
    #[derive(Debug, Deserialize)]
    struct F {
        a: f64,
        b: f64,
        c: f32,
    }
    let f: F = from_str("a = inf\nb = 3\nc = 0.5").unwrap();
    assert!(f.a.is_infinite());
    assert_eq!(f.b, 3.0);
    assert_eq!(f.c, 0.5);

    let err = from_str::<F>("a = 1.0\nb = 1.0\nc = 1e39").unwrap_err();
    assert!(err.is_range());
    let err = from_str::<F>("a = 1.0\nb = 9007199254740993\nc = 1.0").unwrap_err();
    assert!(err.is_range());
}

#[test]
fn test_enums() {
    #[derive(Deserialize, Debug, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Level {
        #[allow(dead_code)]
        Debug,
        Info,
    }
    #[derive(Deserialize, Debug, PartialEq)]
    enum Target {
        File { path: String },
        Port(u16),
    }
    #[derive(Deserialize, Debug)]
    struct Log {
        level: Level,
        target: Target,
        extra: Vec<Target>,
    }

    let log: Log = from_str(
        "level = \"info\"\nextra = [{ Port = 514 }]\n[target.File]\npath = \"/var/log/app\"",
    )
    .unwrap();
    assert_eq!(log.level, Level::Info);
    assert_eq!(
        log.target,
        Target::File {
            path: "/var/log/app".into()
        }
    );
    assert_eq!(log.extra, vec![Target::Port(514)]);
    assert!(from_str::<Log>("level = \"trace\"\nextra = []\ntarget = { Port = 1 }").is_err());
}

#[test]
fn test_durations() {
    #[derive(Debug, Deserialize)]
    struct Timeouts {
        read: Duration,
        write: Duration,
        idle: Duration,
    }
    let t: Timeouts = from_str("read = \"1m30s\"\nwrite = \"250ms\"\nidle = 1_000_000_000").unwrap();
    assert_eq!(t.read, Duration::from_secs(90));
    assert_eq!(t.write, Duration::from_millis(250));
    assert_eq!(t.idle, Duration::from_secs(1));

    let err = from_str::<Timeouts>("read = \"-5s\"\nwrite = \"0\"\nidle = 0").unwrap_err();
    assert!(err.is_range());
    assert!(from_str::<Timeouts>("read = \"5 minutes\"\nwrite = \"0\"\nidle = 0").is_err());
    assert!(from_str::<Timeouts>("read = \"1.h\"\nwrite = \"0\"\nidle = 0").is_err());
    let t: Timeouts = from_str("read = \"1.5h\"\nwrite = \".5s\"\nidle = 0").unwrap();
    assert_eq!(t.read, Duration::from_secs(5400));
    assert_eq!(t.write, Duration::from_millis(500));
}

#[test]
fn test_hooks() {
    #[derive(Debug)]
    struct Semver(u32, u32, u32);

    impl FromToml for Semver {
        type Error = String;

        fn from_toml(value: Value) -> Result<Self, String> {
            let table = value.as_table().ok_or("expected a table")?;
            let part = |k: &str| {
                table
                    .get(k)
                    .and_then(Value::as_integer)
                    .map(|n| n as u32)
                    .ok_or(format!("missing {k}"))
            };
            Ok(Semver(part("major")?, part("minor")?, part("patch")?))
        }
    }

    #[derive(Debug, Deserialize)]
    struct Manifest {
        version: Custom<Semver>,
        addr: Text<std::net::Ipv4Addr>,
        limit: NumberString,
        flag: Text<bool>,
    }

    let input = "addr = \"127.0.0.1\"\nlimit = 0x10\nflag = true\n[version]\nmajor = 1\nminor = 2\npatch = 3";
    let (manifest, meta) = decode::<Manifest>(input).unwrap();
    assert_eq!((manifest.version.0 .0, manifest.version.0 .1, manifest.version.0 .2), (1, 2, 3));
    assert!(manifest.addr.is_loopback());
    assert_eq!(manifest.limit.as_i64(), Some(16));
    assert!(*manifest.flag);
    assert!(meta.undecoded().is_empty());

    let err = from_str::<Manifest>(
        "addr = [1]\nlimit = 1\nflag = true\n[version]\nmajor = 1\nminor = 2\npatch = 3",
    )
    .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));
}

#[test]
fn test_deferred_primitive() {
    #[derive(Deserialize)]
    struct Shape {
        kind: String,
        params: Primitive,
    }
    #[derive(Deserialize, Debug, PartialEq)]
    struct Rect {
        w: u32,
        h: u32,
    }

    let (shapes, mut meta) = decode::<HashMap<String, Shape>>(
        "[a]\nkind = \"rect\"\nparams = { w = 2, h = 3 }\n[b]\nkind = \"rect\"\nparams = { w = 4, h = 5 }",
    )
    .unwrap();
    assert!(meta.is_decoded(&["a", "params"]));
    assert!(!meta.is_decoded(&["a", "params", "w"]));

    let a = &shapes["a"];
    assert_eq!(a.kind, "rect");
    assert_eq!(a.params.key().to_string(), "a.params");
    let rect: Rect = meta.decode_primitive(&a.params).unwrap();
    assert_eq!(rect, Rect { w: 2, h: 3 });
    assert!(meta.is_decoded(&["a", "params", "w"]));
    assert!(!meta.is_decoded(&["b", "params", "w"]));

    let err = meta.decode_primitive::<Vec<u32>>(&shapes["b"].params).unwrap_err();
    assert_eq!(err.last_key().map(ToString::to_string), Some("b.params".to_string()));
}

#[test]
fn test_strict_mode_lists_unknown_keys() {
    #[derive(Deserialize, Debug)]
    struct App {
        #[allow(dead_code)]
        name: String,
    }
    let input = "name = \"x\"\n[extra]\na = 1\nb = 2";
    let err = Decoder::new().deny_unknown_keys(true).decode::<App>(input).unwrap_err();
    match err.kind() {
        ErrorKind::UnknownKeys(keys) => {
            let keys: Vec<String> = keys.iter().map(ToString::to_string).collect();
            assert_eq!(keys, vec!["extra", "extra.a", "extra.b"]);
        }
        other => panic!("unexpected error kind {other:?}"),
    }
    assert_eq!(err.position().map(|p| p.line), Some(2));
    assert!(Decoder::new().decode::<App>(input).is_ok());
}

#[test]
fn test_json_agrees_on_tree_shape() {
    let doc = tomldec::parse(
        "a = 1\nb = [true, \"x\"]\n[c]\nd = 1.5\n[[e]]\nf = \"g\"\n[[e]]\nf = \"h\"",
    )
    .unwrap();
    let json = serde_json::to_value(doc.table()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "a": 1,
            "b": [true, "x"],
            "c": { "d": 1.5 },
            "e": [{ "f": "g" }, { "f": "h" }]
        })
    );
}
