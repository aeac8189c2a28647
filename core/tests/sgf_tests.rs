// SPDX-License-Identifier: MIT OR Apache-2.0

use gotrain_core::{LoadError, LoaderConfig, ParseError, ParseTree, SgfLoader};
use std::fs;
use std::path::Path;

fn fixture() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/8.sgf"))
}

#[test]
fn parse_simple_sgf() {
    let loader = SgfLoader::bundled().unwrap();
    let tree = loader
        .parse_str("(;GM[1]FF[4]SZ[9];B[ee];W[dc];B[fc];W[];B[hh])")
        .unwrap();

    assert_eq!(tree.rule(), Some("collection"));
    assert_eq!(tree.find_all("node").count(), 6);

    let games = loader.game_trees(&tree);
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].nodes.len(), 6);
    let root = games[0].root().unwrap();
    assert_eq!(root.get("SZ").map(|p| p.value()), Some("9"));

    // An empty value is still a property (a pass)
    let moves: Vec<_> = loader
        .properties(&tree)
        .into_iter()
        .filter(|p| p.key() == "W")
        .map(|p| p.value().to_string())
        .collect();
    assert_eq!(moves, vec!["dc", ""]);
}

#[test]
fn load_fixture_file() {
    let loader = SgfLoader::bundled().unwrap();
    let tree = loader.load_file(fixture()).unwrap();

    let games = loader.game_trees(&tree);
    assert_eq!(games.len(), 1);
    let game = &games[0];
    assert_eq!(game.variations.len(), 2);
    assert_eq!(game.main_line().len(), 7);

    let root = game.root().unwrap();
    assert_eq!(root.get("KM").unwrap().value(), "6.50");
    assert_eq!(root.get("C").unwrap().value(), "Opening [joseki] study");

    // Line breaks inside values are kept verbatim
    let last = game.main_line().last().copied().unwrap();
    assert_eq!(last.get("C").unwrap().value(), "main line\n continues");

    assert!(loader.properties(&tree).iter().all(|p| p.is_default_pattern()));
}

#[test]
fn pretty_tree_mentions_every_rule() {
    let loader = SgfLoader::bundled().unwrap();
    let tree = loader.parse_str("(;B[aa])").unwrap();
    let printed = tree.to_string();
    for rule in ["collection", "game_tree", "sequence", "node", "property", "ident", "prop_value", "VALUE"] {
        assert!(printed.contains(rule), "missing {rule} in\n{printed}");
    }
}

#[test]
fn reserialized_game_parses_to_same_structure() {
    let loader = SgfLoader::bundled().unwrap();
    let tree = loader.load_file(fixture()).unwrap();
    let games = loader.game_trees(&tree);

    let text = games[0].to_string();
    let reparsed = loader.parse_str(&text).unwrap();
    assert_eq!(loader.game_trees(&reparsed), games);
}

#[test]
fn malformed_document_propagates_parse_error() {
    let loader = SgfLoader::bundled().unwrap();
    let err = loader.parse_str("(;B[aa]").unwrap_err();
    match err {
        LoadError::Parse(ParseError::Mismatch { expected, found, .. }) => {
            assert!(expected.contains(&"')'".to_string()), "{expected:?}");
            assert_eq!(found, None);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_document_is_a_read_error() {
    let loader = SgfLoader::bundled().unwrap();
    let err = loader.load_file(Path::new("/definitely/not/here.sgf")).unwrap_err();
    assert!(matches!(err, LoadError::Read { .. }));
}

#[test]
fn custom_grammar_and_start_rule() {
    let dir = tempfile::tempdir().unwrap();
    let grammar_path = dir.path().join("moves.ebnf");
    fs::write(
        &grammar_path,
        "moves = { mv } ; mv = color '[' coord ']' ; color = 'B' | 'W' ; coord = /[a-s]{2}/ ;",
    )
    .unwrap();

    let config = LoaderConfig {
        grammar_path: Some(grammar_path),
        start_rule: Some("mv".into()),
        ..LoaderConfig::default()
    };
    let loader = SgfLoader::new(config).unwrap();
    let tree = loader.parse_str("B [pd]").unwrap();
    assert_eq!(
        tree,
        ParseTree::node(
            "mv",
            vec![
                ParseTree::node("color", vec![ParseTree::leaf("B")]),
                ParseTree::leaf("["),
                ParseTree::node("coord", vec![ParseTree::leaf("pd")]),
                ParseTree::leaf("]"),
            ]
        )
    );

    // Grammar mismatch surfaces unchanged
    assert!(matches!(
        loader.parse_str("X[pd]"),
        Err(LoadError::Parse(ParseError::Mismatch { .. }))
    ));
}

#[test]
fn broken_grammar_file_is_a_grammar_error() {
    let dir = tempfile::tempdir().unwrap();
    let grammar_path = dir.path().join("broken.ebnf");
    fs::write(&grammar_path, "a = b ;").unwrap();

    let config = LoaderConfig {
        grammar_path: Some(grammar_path),
        ..LoaderConfig::default()
    };
    assert!(matches!(SgfLoader::new(config), Err(LoadError::Grammar(_))));
}

#[test]
fn emitted_grammar_compiles_to_same_rules() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("sgf.generated.ebnf");

    let loader = SgfLoader::bundled().unwrap();
    loader.emit_grammar(&out).unwrap();

    let config = LoaderConfig {
        grammar_path: Some(out),
        ..LoaderConfig::default()
    };
    let regenerated = SgfLoader::new(config).unwrap();
    assert_eq!(regenerated.grammar().rules(), loader.grammar().rules());

    let tree = regenerated.load_file(fixture()).unwrap();
    assert_eq!(tree, loader.load_file(fixture()).unwrap());
}

fn nested_variations(levels: usize) -> String {
    "(;B[aa]".repeat(levels) + &")".repeat(levels)
}

#[test]
fn deep_variations_stay_within_limit_on_small_stacks() {
    // std's default for spawned threads
    let worker = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let loader = SgfLoader::bundled().unwrap();
            let nodes = loader
                .parse_str(&nested_variations(500))
                .map(|tree| loader.game_trees(&tree)[0].node_count());
            let too_deep = loader.parse_str(&nested_variations(600));
            (nodes, too_deep)
        })
        .unwrap();

    let (nodes, too_deep) = worker.join().unwrap();
    assert_eq!(nodes.unwrap(), 500);
    assert!(matches!(
        too_deep,
        Err(LoadError::Parse(ParseError::RecursionLimit { limit: 512, .. }))
    ));
}
