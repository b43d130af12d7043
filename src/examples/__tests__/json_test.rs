use crate::examples::json::json_grammar;
use serde_json::Value as SerdeValue;

#[test]
fn compact_documents_round_trip() {
    let compiler = json_grammar();

    let documents = [
        r#"{"name":"John","age":30,"car":null}"#,
        r#"[1,2,3,[4,5],{"a":"b"}]"#,
        r#""hello""#,
        r#"{"nested":{"flag":true,"other":false,"items":[]},"empty":{}}"#,
        "42",
    ];

    for document in documents {
        match compiler.compile(document) {
            Ok(output) => {
                assert_eq!(output, document);

                let expected: SerdeValue = serde_json::from_str(document).unwrap();
                let actual: SerdeValue = serde_json::from_str(&output).unwrap();
                assert_eq!(actual, expected);
            }
            Err(err) => {
                println!("Failed part:{}", &document[err.pointer..]);
                panic!("{:?}", err);
            }
        }
    }
}

#[test]
fn malformed_documents_fail() {
    let compiler = json_grammar();

    assert!(compiler.compile(r#"{"a":}"#).is_err());
    assert!(compiler.compile(r#"{"a":1"#).is_err());
    assert!(compiler.compile(r#"[1,]"#).is_err());
    assert!(compiler.compile("").is_err());
}

#[test]
fn keywords_only_win_exact_matches() {
    let compiler = json_grammar();

    // `truex` extends past the TRUE accept and lexes as a WORD, which is no valid value
    assert!(compiler.compile("truex").is_err());
    assert_eq!(compiler.compile("true").unwrap(), "true");
}

#[test]
fn syntax_tree_mirrors_the_document_structure() {
    let compiler = json_grammar();

    let tree = compiler.syntax_tree(r#"{"a":[1,2]}"#).unwrap();
    assert_eq!(tree.symbol, "json");
    assert!(tree.contains("object"));
    assert!(tree.contains("member"));
    assert!(tree.contains("array"));
    assert!(tree.contains("NUMBER"));
}