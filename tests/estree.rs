use esparse::ast::*;
use esparse::{Context, ErrorKind, parse, parse_module, parse_script};
use serde_json::{Value, json};

fn script_json(src: &str) -> Value {
    parse_script(src, Context::EMPTY).unwrap().to_json().unwrap()
}

fn error_kind(src: &str, ctx: Context) -> ErrorKind {
    parse_script(src, ctx).unwrap_err().kind
}

#[test]
fn shorthand_reserved_word_outside_strict_code() {
    assert_eq!(
        script_json("const {public} = x;"),
        json!({
            "type": "Program",
            "sourceType": "script",
            "body": [{
                "type": "VariableDeclaration",
                "kind": "const",
                "declarations": [{
                    "type": "VariableDeclarator",
                    "id": {
                        "type": "ObjectPattern",
                        "properties": [{
                            "type": "Property",
                            "key": { "type": "Identifier", "name": "public" },
                            "value": { "type": "Identifier", "name": "public" },
                            "kind": "init",
                            "computed": false,
                            "method": false,
                            "shorthand": true
                        }]
                    },
                    "init": { "type": "Identifier", "name": "x" }
                }]
            }]
        })
    );
}

#[test]
fn json_tree_is_a_result() {
    let program = parse_script("a; b;", Context::EMPTY).unwrap();
    let tree = program.to_json().expect("plain ESTree serializes");
    assert_eq!(tree["type"], json!("Program"));
    assert_eq!(tree, serde_json::to_value(&program).unwrap());
}

#[test]
fn empty_patterns() {
    let tree = script_json("const {} = x; const [] = x;");
    assert_eq!(tree["body"][0]["declarations"][0]["id"]["properties"], json!([]));
    assert_eq!(tree["body"][1]["declarations"][0]["id"]["elements"], json!([]));
}

#[test]
fn malformed_patterns_are_rejected() {
    for src in [
        "const {,} = obj;",
        "const {x,,} = obj;",
        "const [.x] = obj;",
        "const [...,] = obj;",
    ] {
        assert!(parse_script(src, Context::EMPTY).is_err(), "{src}");
    }
}

#[test]
fn scenario_errors() {
    assert_eq!(
        error_kind("const private = 1;", Context::STRICT),
        ErrorKind::UnexpectedReservedWord
    );
    assert_eq!(
        error_kind("const {x:x, x:x} = c", Context::EMPTY),
        ErrorKind::DuplicateBinding
    );
    assert_eq!(
        error_kind("const [...foo, bar] = obj;", Context::EMPTY),
        ErrorKind::InvalidRestElementPosition
    );
    assert_eq!(
        error_kind("for (const [foo] = arr, bar in arr);", Context::EMPTY),
        ErrorKind::InvalidForHeadBinding
    );
    assert_eq!(
        error_kind("const x;", Context::EMPTY),
        ErrorKind::MissingInitializerInConst
    );
    assert_eq!(
        error_kind("[a + b] = c;", Context::EMPTY),
        ErrorKind::InvalidDestructuringTarget
    );
    assert_eq!(error_kind("'\\u{110000}'", Context::EMPTY), ErrorKind::LexError);
}

#[test]
fn const_declarations_classify_their_targets() {
    let program = parse_script(
        "const a = 1; const {b, c: [d]} = e; const [f = 2, ...g] = h;",
        Context::EMPTY,
    )
    .unwrap();
    for stmt in &program.body {
        let Statement::VariableDeclaration(decl) = stmt else {
            panic!("expected declaration");
        };
        for declarator in &decl.declarations {
            assert!(matches!(
                declarator.id,
                Pattern::Identifier(_) | Pattern::Object(_) | Pattern::Array(_)
            ));
            assert!(declarator.init.is_some());
        }
    }
}

#[test]
fn parsing_is_idempotent() {
    let src = "let {a, b: {c}, ...d} = e; class C { static #x = 1; m() { return #x in this; } }";
    let ctx = Context::OPTIONS_NEXT | Context::OPTIONS_LOC;
    let first = parse_script(src, ctx).unwrap();
    let second = parse_script(src, ctx).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first.to_json().unwrap()).unwrap(),
        serde_json::to_string(&second.to_json().unwrap()).unwrap()
    );
}

/// Line and column of a UTF-16 offset, computed from the raw text.
fn position_of(src: &str, offset: u64) -> (u64, u64) {
    let mut line = 1;
    let mut column = 0;
    for (i, unit) in src.encode_utf16().enumerate() {
        if i as u64 == offset {
            break;
        }
        if unit == u16::from(b'\n') {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    (line, column)
}

fn check_locations(src: &str, node: &Value, checked: &mut usize) {
    match node {
        Value::Object(map) => {
            if let (Some(start), Some(loc)) = (map.get("start"), map.get("loc")) {
                let (line, column) = position_of(src, start.as_u64().unwrap());
                assert_eq!(loc["start"]["line"].as_u64(), Some(line), "{node}");
                assert_eq!(loc["start"]["column"].as_u64(), Some(column), "{node}");
                let end = map["end"].as_u64().unwrap();
                let (line, column) = position_of(src, end);
                assert_eq!(loc["end"]["line"].as_u64(), Some(line), "{node}");
                assert_eq!(loc["end"]["column"].as_u64(), Some(column), "{node}");
                *checked += 1;
            }
            for value in map.values() {
                if value.is_object() || value.is_array() {
                    check_locations(src, value, checked);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                check_locations(src, item, checked);
            }
        }
        _ => {}
    }
}

#[test]
fn locations_match_offsets() {
    let src = "const {\n  a,\n  b: [c, d = 1],\n} = obj;\nfunction f(x) {\n  return `t${x}`;\n}\n";
    let tree = parse_script(src, Context::OPTIONS_LOC).unwrap().to_json().unwrap();
    let mut checked = 0;
    check_locations(src, &tree, &mut checked);
    assert!(checked > 15);
    assert_eq!(tree["body"][1]["loc"]["start"], json!({ "line": 5, "column": 0 }));
}

#[test]
fn locations_count_utf16_units() {
    let src = "'😀'; x";
    let tree = parse_script(src, Context::OPTIONS_LOC).unwrap().to_json().unwrap();
    assert_eq!(tree["body"][1]["start"], json!(6));
    let mut checked = 0;
    check_locations(src, &tree, &mut checked);
}

#[test]
fn positions_are_omitted_without_loc() {
    let tree = script_json("a");
    assert!(tree.get("start").is_none());
    assert!(tree["body"][0].get("loc").is_none());
}

#[test]
fn modules_are_strict() {
    let program = parse_module("import a from 'a'; export default a;", Context::EMPTY).unwrap();
    assert_eq!(program.source_type, SourceType::Module);
    assert_eq!(
        parse_module("with (a) {}", Context::EMPTY).unwrap_err().kind,
        ErrorKind::UnexpectedToken
    );
    assert_eq!(
        parse_module("var await;", Context::EMPTY).unwrap_err().kind,
        ErrorKind::UnexpectedReservedWord
    );
    assert!(parse("export {};", Context::MODULE).is_ok());
    assert!(parse("export {};", Context::EMPTY).is_err());
}

#[test]
fn web_compat_toggle() {
    for src in [
        "a: function f() {}",
        "var x = 017;",
        "{ function f() {} function f() {} }",
        "x = 1 <!-- html comment",
    ] {
        assert!(parse_script(src, Context::EMPTY).is_ok(), "{src}");
        assert!(
            parse_script(src, Context::OPTIONS_DISABLE_WEB_COMPAT).is_err(),
            "{src}"
        );
    }
    for src in ["const {,} = obj;", "const [...a,] = b;", "let x; let x;"] {
        assert!(parse_script(src, Context::EMPTY).is_err(), "{src}");
        assert!(
            parse_script(src, Context::OPTIONS_DISABLE_WEB_COMPAT).is_err(),
            "{src}"
        );
    }
}

#[test]
fn staged_syntax_needs_next() {
    let src = "const {a, ...rest} = obj;";
    assert!(parse_script(src, Context::EMPTY).is_err());
    let tree = parse_script(src, Context::OPTIONS_NEXT).unwrap().to_json().unwrap();
    assert_eq!(
        tree["body"][0]["declarations"][0]["id"]["properties"][1]["type"],
        json!("RestElement")
    );
    assert!(parse_script("({...a} = b);", Context::EMPTY).is_err());
    assert!(parse_script("x = {...a};", Context::EMPTY).is_ok());
}

#[test]
fn literal_shapes() {
    let tree = script_json("[1, 'a', null, true, /re/gi, 10n, 0x1fn]");
    let elements = &tree["body"][0]["expression"]["elements"];
    assert_eq!(elements[0]["value"], json!(1));
    assert_eq!(elements[1]["value"], json!("a"));
    assert_eq!(elements[2]["value"], Value::Null);
    assert_eq!(elements[3]["value"], json!(true));
    assert_eq!(elements[4]["regex"], json!({ "pattern": "re", "flags": "gi" }));
    assert_eq!(elements[5]["bigint"], json!("10"));
    assert_eq!(elements[6]["bigint"], json!("31"));
}

#[test]
fn error_display_points_at_token() {
    let err = parse_script("let a;\nlet a;", Context::EMPTY).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateBinding);
    assert_eq!((err.line, err.column), (2, 4));
    assert!(err.to_string().starts_with("SyntaxError: "));
}
