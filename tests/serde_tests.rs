use initree::{from_str, from_tree, parse_str, to_string, to_tree, Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
enum Level {
    Error,
    Warn,
    Info,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Server {
    host: String,
    port: u16,
    workers: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Logging {
    level: Level,
    outputs: Vec<String>,
    #[serde(default)]
    color: bool,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Config {
    server: Server,
    logging: Logging,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<BTreeMap<String, f64>>,
}

fn sample() -> Config {
    Config {
        server: Server {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: Some(4),
        },
        logging: Logging {
            level: Level::Warn,
            outputs: vec!["stderr".to_string(), "/var/log/app.log".to_string()],
            color: true,
        },
        metrics: None,
    }
}

#[test]
fn test_config_round_trip() {
    let config = sample();
    let text = to_string(&config).unwrap();
    println!("{}", text);
    assert_eq!(
        text,
        "[server]\nhost = 0.0.0.0\nport = 8080\nworkers = 4\n\
         [logging]\nlevel = warn\noutputs = stderr, /var/log/app.log\ncolor = true\n"
    );
    assert_eq!(from_str::<Config>(&text).unwrap(), config);
}

#[test]
fn test_hand_written_config() {
    let text = "\
; deployed by ops
[logging]
level = ERROR
outputs =
[server]
host = example.org
port = 443
workers =
[metrics]
ratio = 0.25
";
    let err = from_str::<Config>(text).unwrap_err();
    assert!(matches!(err, Error::Custom(_)), "{}", err);

    let config: Config = from_str(&text.replace("ERROR", "error")).unwrap();
    assert_eq!(config.logging.level, Level::Error);
    assert!(config.logging.outputs.is_empty());
    assert!(!config.logging.color);
    assert_eq!(config.server.workers, None);
    assert_eq!(config.metrics.unwrap()["ratio"], 0.25);
}

#[test]
fn test_missing_section() {
    let err = from_str::<Config>("[server]\nhost = h\nport = 1\n").unwrap_err();
    assert!(err.to_string().contains("logging"), "{}", err);
}

#[test]
fn test_to_tree_then_edit() {
    let mut tree = to_tree(&sample()).unwrap();
    tree.section_mut("server").unwrap().set("port", "9000");
    tree.push_comment("trailing");

    let config: Config = from_tree(&tree).unwrap();
    assert_eq!(config.server.port, 9000);
}

#[test]
fn test_dynamic_maps() {
    let tree = parse_str("[b]\ny = 2\n[a]\nx = 1\n[b]\nz = 3\n").unwrap();
    let map: BTreeMap<String, BTreeMap<String, i64>> = from_tree(&tree).unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map["b"]["y"], 2);
    assert_eq!(map["b"]["z"], 3);
    assert_eq!(to_string(&map).unwrap(), "[a]\nx = 1\n[b]\ny = 2\nz = 3\n");
}

#[test]
fn test_unsupported_shapes() {
    assert!(matches!(
        to_string(&vec![1, 2, 3]),
        Err(Error::UnsupportedType(_))
    ));

    #[derive(Serialize)]
    enum Shape {
        Circle { r: f64 },
    }
    #[derive(Serialize)]
    struct Drawing {
        main: BTreeMap<&'static str, Shape>,
    }
    let drawing = Drawing {
        main: BTreeMap::from([("shape", Shape::Circle { r: 1.0 })]),
    };
    assert!(matches!(
        to_string(&drawing),
        Err(Error::UnsupportedType(_))
    ));
}
