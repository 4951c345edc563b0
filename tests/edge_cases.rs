use tagtree::propagate::{propagate_down, propagate_up};
use tagtree::{
    Corpus, DecodeError, RuleSet, RuleSetBuilder, TaggerError, encode_paths, matcher, tag_corpus,
};

type Records = Vec<(Vec<u8>, Vec<String>)>;

fn run(ruleset: &RuleSet, paths: &[&str]) -> Records {
    let buf = encode_paths(paths);
    let mut out = Records::new();
    tag_corpus(ruleset, &buf, &mut out).unwrap();
    out
}

fn record(path: &str, tags: &[&str]) -> (Vec<u8>, Vec<String>) {
    (
        path.as_bytes().to_vec(),
        tags.iter().map(|&t| t.to_owned()).collect(),
    )
}

#[test]
fn prefix_rule_inherited_downward() {
    let ruleset = RuleSetBuilder::new()
        .rule(|r| r.has_prefix("servers.").tag("category=servers"))
        .compile()
        .unwrap();

    let out = run(
        &ruleset,
        &["servers.", "servers.web01.cpu.load", "other.metric"],
    );
    assert_eq!(
        out,
        vec![
            record("servers.", &["category=servers"]),
            record("servers.web01.cpu.load", &["category=servers"]),
        ]
    );
}

#[test]
fn regexp_match_inherited_upward() {
    let ruleset = RuleSetBuilder::new()
        .rule(|r| r.regexp(r"db\.primary\.latency").tag("role=db"))
        .compile()
        .unwrap();

    let out = run(&ruleset, &["db.", "db.primary.", "db.primary.latency"]);
    assert_eq!(
        out,
        vec![
            record("db.", &["role=db"]),
            record("db.primary.", &["role=db"]),
            record("db.primary.latency", &["role=db"]),
        ]
    );
}

#[test]
fn parent_between_independent_matches() {
    // Grandparent and grandchild match different rules; the untagged parent
    // between them collects both. A sibling of the parent only sees the
    // grandparent's tag when propagation runs down before up.
    let ruleset = RuleSetBuilder::new()
        .rule(|r| r.equal("g.").tag("top"))
        .rule(|r| r.has_suffix(".leaf").tag("bottom"))
        .compile()
        .unwrap();
    let paths = ["g.", "g.p.", "g.p.leaf", "g.sibling"];

    let out = run(&ruleset, &paths);
    assert_eq!(
        out,
        vec![
            record("g.", &["top", "bottom"]),
            record("g.p.", &["top", "bottom"]),
            record("g.p.leaf", &["top", "bottom"]),
            record("g.sibling", &["top"]),
        ]
    );

    let buf = encode_paths(paths);
    let mut swapped = Corpus::decode(&buf).unwrap();
    matcher::run(&ruleset, &mut swapped);
    propagate_up(&mut swapped);
    propagate_down(&mut swapped);
    let sibling = swapped.get(b"g.sibling").unwrap();
    let tags: Vec<&str> = ruleset.tag_names(sibling.tags()).collect();
    assert_eq!(tags, ["top", "bottom"]);
}

#[test]
fn leaf_and_directory_with_same_stem_are_unrelated() {
    let ruleset = RuleSetBuilder::new()
        .rule(|r| r.equal("a.b").tag("leaf"))
        .compile()
        .unwrap();

    let out = run(&ruleset, &["a.b", "a.b.", "a.b.c"]);
    assert_eq!(out, vec![record("a.b", &["leaf"])]);
}

#[test]
fn ancestors_without_trailing_dot_are_not_found() {
    // Only directory entries ("x.") are ancestors; a leaf named "x" is not.
    let ruleset = RuleSetBuilder::new()
        .rule(|r| r.equal("x").tag("t"))
        .compile()
        .unwrap();

    let out = run(&ruleset, &["x", "x.y"]);
    assert_eq!(out, vec![record("x", &["t"])]);
}

#[test]
fn multiple_tags_and_overlapping_rules() {
    let ruleset = RuleSetBuilder::new()
        .rule(|r| r.has_prefix("s.").tag("a").tag("b"))
        .rule(|r| r.has_prefix("s.w").tag("b").tag("c"))
        .rule(|r| r.contains(".w").tag("d"))
        .compile()
        .unwrap();

    let out = run(&ruleset, &["s.w1", "s.x"]);
    assert_eq!(
        out,
        vec![record("s.w1", &["a", "b", "c", "d"]), record("s.x", &["a", "b"])]
    );
}

#[test]
fn empty_corpus_emits_nothing() {
    let ruleset = RuleSetBuilder::new()
        .rule(|r| r.has_prefix("a").tag("x"))
        .compile()
        .unwrap();
    assert!(run(&ruleset, &[]).is_empty());
}

#[test]
fn empty_ruleset_tags_nothing() {
    let ruleset = RuleSetBuilder::new().compile().unwrap();
    assert!(ruleset.is_empty());
    assert!(run(&ruleset, &["a.", "a.b"]).is_empty());
}

#[test]
fn declared_length_past_end_yields_no_metrics() {
    let ruleset = RuleSetBuilder::new()
        .rule(|r| r.has_prefix("a").tag("x"))
        .compile()
        .unwrap();
    let mut buf = encode_paths(["a.b", "a.c"]);
    buf.extend_from_slice(&[0x20, b'a']);

    let mut out = Records::new();
    let err = tag_corpus(&ruleset, &buf, &mut out).unwrap_err();
    assert!(matches!(
        err,
        TaggerError::Decode(DecodeError::LengthExceedsBuffer {
            declared: 32,
            remaining: 1,
            ..
        })
    ));
    assert!(out.is_empty());
}

#[test]
fn non_utf8_paths_are_tagged() {
    let ruleset = RuleSetBuilder::new()
        .rule(|r| r.has_prefix([0xc3, 0x28, b'.']).tag("bin"))
        .compile()
        .unwrap();
    let paths: [&[u8]; 2] = [&[0xc3, 0x28, b'.'], &[0xc3, 0x28, b'.', 0xff]];
    let buf = encode_paths(paths);

    let mut out = Records::new();
    tag_corpus(&ruleset, &buf, &mut out).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].0, vec![0xc3, 0x28, b'.', 0xff]);
}

#[test]
fn deep_hierarchy_with_sparse_directories() {
    let ruleset = RuleSetBuilder::new()
        .rule(|r| r.equal("r.").tag("root"))
        .rule(|r| r.has_suffix(".z").tag("deep"))
        .compile()
        .unwrap();
    // Only "r." and "r.a.b.c.d." exist as directories.
    let out = run(&ruleset, &["r.", "r.a.b.c.d.", "r.a.b.c.d.e.f.z", "q.z"]);
    assert_eq!(
        out,
        vec![
            record("r.", &["root", "deep"]),
            record("r.a.b.c.d.", &["root", "deep"]),
            record("r.a.b.c.d.e.f.z", &["root", "deep"]),
            record("q.z", &["deep"]),
        ]
    );
}
