use std::io::Write;

use formblocks::parser::Parser;
use formblocks::render::{render_block, render_instructions};
use formblocks::{FieldValues, Floor, Naming, PageDefinition, Widget};

const GLOSSARY_SERVERS: &str = r#"
title = "Manage Glossary Servers"
instructions = """
Use this form to manage which servers receive nightly glossary updates.

- Each alias must be unique for this tier
- Specify the base URL for each server
"""

[[kind]]
name = "server"
legend = "Server"
naming = "bare"
unique = "alias"
fields = [
    { name = "alias", label = "Alias", required = true },
    { name = "url", label = "URL", required = true },
]
initial = [
    { alias = "Primary", url = "https://www.example.gov" },
    { alias = "Backup", url = "https://backup.example.gov" },
]
"#;

fn parse(source: &str) -> PageDefinition {
    Parser::new(source.to_string(), 0)
        .parse()
        .unwrap_or_else(|errs| {
            let msgs: Vec<String> = errs.iter().map(|e| e.message.clone()).collect();
            panic!("parse failed: {}", msgs.join("; "))
        })
}

fn parse_errors(source: &str) -> Vec<String> {
    match Parser::new(source.to_string(), 0).parse() {
        Ok(_) => panic!("expected parse errors"),
        Err(errs) => errs.into_iter().map(|e| e.message).collect(),
    }
}

#[test]
fn parses_glossary_server_page() {
    let page = parse(GLOSSARY_SERVERS);
    assert_eq!(page.title, "Manage Glossary Servers");
    assert_eq!(page.submit, "Submit");
    assert_eq!(page.kind_names(), vec!["server"]);

    let def = page.kind("server").unwrap();
    assert_eq!(def.kind.naming, Naming::Bare);
    assert_eq!(def.kind.floor, Floor::One);
    assert_eq!(def.kind.unique.as_deref(), Some("alias"));
    assert_eq!(def.kind.fields.len(), 2);
    assert!(def.kind.fields.iter().all(|f| f.required));
    assert_eq!(def.initial.len(), 2);
    assert_eq!(def.initial[1]["alias"], "Backup");
}

#[test]
fn defaults_for_optional_settings() {
    let page = parse(
        r#"
[[kind]]
name = "opt"
fields = [{ name = "name" }, { name = "value", widget = "textarea" }]
"#,
    );
    let kind = &page.kind("opt").unwrap().kind;
    assert_eq!(kind.legend, "Opt");
    assert_eq!(kind.naming, Naming::Prefixed);
    assert_eq!(kind.floor, Floor::One);
    assert_eq!(kind.fields[0].label, "Name");
    assert_eq!(kind.fields[1].widget, Widget::TextArea);
    assert_eq!(kind.field_id("value", 3), "opt-value-3");
    assert_eq!(kind.block_id(3), "opt-block-3");
    assert_eq!(kind.count_field(), "num-opts");
}

#[test]
fn reports_toml_syntax_errors() {
    let errs = Parser::new("[[kind]\nname = 1".to_string(), 7)
        .parse()
        .unwrap_err();
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].file_id, 7);
}

#[test]
fn collects_every_validation_problem() {
    let errs = parse_errors(
        r#"
[[kind]]
name = "Server"
fields = [{ name = "alias" }]

[[kind]]
name = "opt"
floor = 2
unique = "missing"
fields = [{ name = "name" }, { name = "name" }]
initial = [{ colour = "red" }]
"#,
    );
    let joined = errs.join("\n");
    assert!(joined.contains("invalid kind name \"Server\""), "{}", joined);
    assert!(joined.contains("floor must be 0 or 1"), "{}", joined);
    assert!(joined.contains("unique field \"missing\""), "{}", joined);
    assert!(joined.contains("field \"name\" is declared more than once"), "{}", joined);
    assert!(joined.contains("unknown field \"colour\""), "{}", joined);
}

#[test]
fn rejects_duplicate_kinds_and_empty_schemas() {
    let errs = parse_errors(
        r#"
[[kind]]
name = "term"
fields = []

[[kind]]
name = "term"
fields = [{ name = "text" }]
"#,
    );
    assert!(errs.iter().any(|e| e.contains("declares no fields")));
    assert!(errs.iter().any(|e| e.contains("defined more than once")));
}

#[test]
fn rejects_pages_without_kinds() {
    let errs = parse_errors("title = \"Empty\"\n");
    assert!(errs[0].contains("no repeatable block kinds"));
}

#[test]
fn rejects_colliding_bare_field_names() {
    let errs = parse_errors(
        r#"
[[kind]]
name = "source"
naming = "bare"
fields = [{ name = "element" }]

[[kind]]
name = "target"
naming = "bare"
fields = [{ name = "element" }]
"#,
    );
    assert!(errs[0].contains("\"element-<n>\""), "{}", errs[0]);
}

#[test]
fn rejects_field_names_used_by_block_markup() {
    let errs = parse_errors(
        r#"
[[kind]]
name = "rule"
fields = [{ name = "block" }, { name = "button" }, { name = "blocks" }]
"#,
    );
    assert_eq!(
        errs,
        vec![
            "field name \"block\" is reserved".to_string(),
            "field name \"button\" is reserved".to_string(),
        ]
    );
}

#[test]
fn prefixed_kinds_may_share_field_names() {
    let page = parse(
        r#"
[[kind]]
name = "source"
fields = [{ name = "element" }]

[[kind]]
name = "target"
fields = [{ name = "element" }]
"#,
    );
    assert_eq!(page.kinds.len(), 2);
}

#[test]
fn renders_block_markup_with_fixed_attribute_order() {
    let page = parse(GLOSSARY_SERVERS);
    let kind = &page.kind("server").unwrap().kind;
    let values: FieldValues = [("alias", "A"), ("url", "http://a")]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(
        render_block(kind, 1, &values).to_string(),
        concat!(
            r#"<fieldset class="server-block" id="server-block-1"><legend>Server</legend>"#,
            r#"<div class="labeled-field"><label for="alias-1">Alias</label>"#,
            r#"<input class="alias" name="alias-1" id="alias-1" value="A"></div>"#,
            r#"<div class="labeled-field"><label for="url-1">URL</label>"#,
            r#"<input class="url" name="url-1" id="url-1" value="http://a"></div>"#,
            r#"</fieldset>"#,
        )
    );
}

#[test]
fn escapes_values_in_markup() {
    let page = parse(GLOSSARY_SERVERS);
    let kind = &page.kind("server").unwrap().kind;
    let values: FieldValues = [("alias", "\"><script>x</script>"), ("url", "a&b")]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let html = render_block(kind, 1, &values).to_string();
    assert!(html.contains(r#"value="&quot;&gt;&lt;script&gt;x&lt;/script&gt;""#), "{}", html);
    assert!(html.contains(r#"value="a&amp;b""#), "{}", html);
    assert!(!html.contains("<script>"));
}

#[test]
fn renders_markdown_instructions() {
    let page = parse(GLOSSARY_SERVERS);
    let html = render_instructions(page.instructions.as_deref().unwrap()).to_string();
    assert!(html.starts_with(r#"<fieldset class="instructions"><legend>Instructions</legend>"#));
    assert!(html.contains("<li>Each alias must be unique for this tier</li>"));
}

#[test]
fn parses_manifest_from_file() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("servers.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(file, "{}", GLOSSARY_SERVERS).unwrap();

    let source = std::fs::read_to_string(&path).unwrap();
    let page = parse(&source);
    assert_eq!(page.kind("server").unwrap().initial[0]["url"], "https://www.example.gov");
}
