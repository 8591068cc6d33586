//! Persisting statement trees through the binary codec

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use yang_ir::codec;
use yang_ir::{Cursor, Keyword, Position, RawStatement, SourceDocument};

fn build_module(name: &str, containers: usize, leaves: usize) -> RawStatement {
    let mut root = RawStatement::with_argument("module", name).at(Position::new(1, 1, 0, 0));
    root.add_substatement(RawStatement::with_argument("namespace", format!("urn:{name}")));
    root.add_substatement(RawStatement::with_argument("prefix", name));
    for c in 0..containers {
        let mut container = RawStatement::with_argument("container", format!("c{c}"))
            .at(Position::new(c + 3, 3, c * 10, 8));
        for l in 0..leaves {
            container.add_substatement(
                RawStatement::with_argument("leaf", format!("l{l}"))
                    .with_substatement(RawStatement::with_argument("type", "uint8"))
                    .with_substatement(RawStatement {
                        keyword: Keyword::prefixed("md", "annotation"),
                        argument: Some(format!("note \"{l}\"\nline two")),
                        substatements: Vec::new(),
                        position: Position::at(l, 7),
                    }),
            );
        }
        root.add_substatement(container);
    }
    root
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.ystb");
    let root = build_module("cached", 40, 90);
    assert!(root.node_count() > 10_000);

    {
        let mut writer = BufWriter::new(File::create(&path).unwrap());
        codec::write_to(&mut writer, &root).unwrap();
        writer.flush().unwrap();
    }

    let mut reader = BufReader::new(File::open(&path).unwrap());
    let decoded = codec::read_from(&mut reader).unwrap();
    assert_eq!(decoded, root);

    let document = SourceDocument::new(path.display().to_string(), decoded);
    assert_eq!(document.identifier().unwrap().name, "cached");
}

#[test]
fn test_decoded_tree_is_navigable() -> anyhow::Result<()> {
    let root = build_module("nav", 2, 3);
    let decoded = codec::decode(&codec::encode(&root))?;

    let cursor = Cursor::new(&decoded);
    let annotation = cursor.navigate("container=c1/leaf=l2/md:annotation")?;
    assert_eq!(
        annotation.statement().argument(),
        Some("note \"2\"\nline two")
    );
    assert_eq!(annotation.statement().position, Position::at(2, 7));
    Ok(())
}
