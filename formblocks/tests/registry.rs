use formblocks::render::{extract_values, render_block};
use formblocks::{BlockKind, FieldSpec, FieldValues, Floor, Naming, Registry, RegistryError};

fn server_kind() -> BlockKind {
    BlockKind::new(
        "server",
        "Server",
        vec![FieldSpec::text("alias", "Alias"), FieldSpec::text("url", "URL")],
    )
    .with_naming(Naming::Bare)
    .with_unique("alias")
}

fn term_kind() -> BlockKind {
    BlockKind::new("term", "Search Term", vec![FieldSpec::text("text", "Term")])
        .with_floor(Floor::None)
}

fn values(pairs: &[(&str, &str)]) -> FieldValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn positions(registry: &Registry) -> Vec<usize> {
    registry.blocks().iter().map(|b| b.position).collect()
}

#[test]
fn appends_from_empty_are_numbered_contiguously() {
    for n in 0..6 {
        let mut registry = Registry::new(term_kind());
        assert!(registry.is_empty());
        for expected in 1..=n {
            assert_eq!(registry.append(None), expected);
        }
        assert_eq!(registry.len(), n);
        assert_eq!(positions(&registry), (1..=n).collect::<Vec<_>>());
        assert_eq!(registry.count_value(), n.to_string());
    }
}

#[test]
fn append_fills_missing_fields_with_empty_strings() {
    let mut registry = Registry::new(term_kind());
    registry.append(None);
    assert_eq!(registry.get(1).unwrap().fields, values(&[("text", "")]));

    let mut servers = Registry::with_initial(server_kind(), Vec::new());
    let position = servers.append(Some(values(&[("alias", "Only")])));
    assert_eq!(position, 2);
    assert_eq!(
        servers.get(2).unwrap().fields,
        values(&[("alias", "Only"), ("url", "")])
    );
}

#[test]
fn append_drops_unknown_fields() {
    let mut registry = Registry::new(term_kind());
    registry.append(Some(values(&[("text", "aspirin"), ("color", "red")])));
    assert_eq!(registry.get(1).unwrap().fields, values(&[("text", "aspirin")]));
}

#[test]
fn remove_renumbers_survivors_in_order() {
    let initial: Vec<FieldValues> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|t| values(&[("text", t)]))
        .collect();
    for removed in 1..=initial.len() {
        let mut registry = Registry::with_initial(term_kind(), initial.clone());
        assert!(registry.remove_and_renumber(removed));

        let mut expected = initial.clone();
        expected.remove(removed - 1);
        let actual: Vec<FieldValues> = registry.blocks().iter().map(|b| b.fields.clone()).collect();
        assert_eq!(actual, expected, "after removing position {}", removed);
        assert_eq!(positions(&registry), vec![1, 2, 3, 4]);
        assert_eq!(registry.count_value(), "4");
    }
}

#[test]
fn remove_first_of_two_servers() {
    let mut registry = Registry::with_initial(
        server_kind(),
        vec![
            values(&[("alias", "A"), ("url", "http://a")]),
            values(&[("alias", "B"), ("url", "http://b")]),
        ],
    );
    assert!(registry.remove_and_renumber(1));
    assert_eq!(registry.len(), 1);
    let block = registry.get(1).unwrap();
    assert_eq!(block.position, 1);
    assert_eq!(block.value("alias"), "B");
    assert_eq!(block.value("url"), "http://b");
    assert_eq!(registry.count_value(), "1");
}

#[test]
fn out_of_range_removal_is_a_no_op() {
    let initial = vec![values(&[("text", "x")]), values(&[("text", "y")])];
    let mut registry = Registry::with_initial(term_kind(), initial);
    let before = registry.collect(None);
    assert!(!registry.remove_and_renumber(0));
    assert!(!registry.remove_and_renumber(3));
    assert!(!registry.remove_and_renumber(usize::MAX));
    assert_eq!(registry.collect(None), before);
}

#[test]
fn floor_one_kind_heals_to_single_empty_block() {
    let mut registry = Registry::with_initial(
        server_kind(),
        vec![values(&[("alias", "A"), ("url", "http://a")])],
    );
    assert!(registry.remove_and_renumber(1));
    assert_eq!(registry.len(), 1);
    let block = registry.get(1).unwrap();
    assert_eq!(block.position, 1);
    assert!(block.is_blank());
    assert_eq!(registry.count_value(), "1");
}

#[test]
fn floor_one_kind_starts_with_a_placeholder() {
    let registry = Registry::new(server_kind());
    assert_eq!(registry.len(), 1);
    assert!(registry.get(1).unwrap().is_blank());
}

#[test]
fn floorless_kind_may_become_empty() {
    let mut registry = Registry::with_initial(term_kind(), vec![values(&[("text", "x")])]);
    assert!(registry.remove_and_renumber(1));
    assert!(registry.is_empty());
    assert_eq!(registry.count_value(), "0");
}

#[test]
fn collect_skips_requested_position() {
    let initial = vec![
        values(&[("text", "x")]),
        values(&[("text", "y")]),
        values(&[("text", "z")]),
    ];
    let registry = Registry::with_initial(term_kind(), initial);
    let collected = registry.collect(Some(2));
    let texts: Vec<&str> = collected.iter().map(|b| b.value("text")).collect();
    assert_eq!(texts, vec!["x", "z"]);
    assert_eq!(collected[1].position, 3);
    assert_eq!(registry.len(), 3);
}

#[test]
fn set_value_updates_and_validates() {
    let mut registry = Registry::new(server_kind());
    registry.set_value(1, "alias", "Primary").unwrap();
    assert_eq!(registry.get(1).unwrap().value("alias"), "Primary");

    assert_eq!(
        registry.set_value(2, "alias", "x"),
        Err(RegistryError::NoSuchBlock {
            kind: "server".into(),
            position: 2,
            count: 1,
        })
    );
    assert_eq!(
        registry.set_value(1, "port", "80"),
        Err(RegistryError::UnknownField {
            kind: "server".into(),
            field: "port".into(),
        })
    );
}

#[test]
fn values_typed_before_removal_survive_renumbering() {
    let mut registry = Registry::new(server_kind());
    registry.append(None);
    registry.append(None);
    registry.set_value(1, "alias", "one").unwrap();
    registry.set_value(2, "alias", "two").unwrap();
    registry.set_value(3, "alias", "three").unwrap();
    registry.set_value(3, "url", "https://three").unwrap();

    registry.remove_and_renumber(2);
    let block = registry.get(2).unwrap();
    assert_eq!(block.value("alias"), "three");
    assert_eq!(block.value("url"), "https://three");
}

#[test]
fn render_then_extract_is_lossless() {
    let kind = BlockKind::new(
        "rule",
        "Custom Rule",
        vec![
            FieldSpec::text("ruletype", "Rule Type"),
            FieldSpec::textarea("ruletext", "Rule Text"),
        ],
    );
    let samples = [
        values(&[("ruletype", "xpath"), ("ruletext", "//Para[@id=\"x\"] & <b>")]),
        values(&[("ruletype", ""), ("ruletext", "")]),
        values(&[("ruletype", "  spaced  "), ("ruletext", "line one\nline two")]),
    ];
    for (i, sample) in samples.iter().enumerate() {
        let position = i + 1;
        let element = render_block(&kind, position, sample);
        assert_eq!(extract_values(&kind, &element, position).as_ref(), Some(sample));
    }
}

#[test]
fn render_is_deterministic() {
    let kind = server_kind();
    let v = values(&[("alias", "A"), ("url", "http://a")]);
    assert_eq!(render_block(&kind, 2, &v), render_block(&kind, 2, &v));
    assert_eq!(
        render_block(&kind, 2, &v).to_string(),
        render_block(&kind, 2, &v).to_string()
    );
}
