use std::fs;

use legis_store::persist::{load, save};
use legis_store::{FlatL2Index, IndexPaths, Passage, StoreError};
use pretty_assertions::assert_eq;

fn passages(n: usize) -> Vec<Passage> {
    (0..n)
        .map(|i| Passage {
            id: i,
            path: format!("https://legislacao.example/ato/{i}"),
            conteudo: format!("PATH: https://legislacao.example/ato/{i}\nCONTEÚDO: artigo {i}"),
        })
        .collect()
}

fn vectors(n: usize) -> Vec<Vec<f32>> {
    (0..n).map(|i| vec![i as f32, 1.0, -(i as f32)]).collect()
}

#[test]
fn build_then_load_keeps_position_equal_to_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = IndexPaths::for_keyword(dir.path(), "açúcar venda");
    let index = FlatL2Index::from_vectors(&vectors(7)).expect("index");

    save(&paths, &index, &passages(7)).expect("save");
    let loaded = load(&paths).expect("load");

    assert_eq!(loaded.index.len(), 7);
    assert_eq!(loaded.passages.len(), 7);
    for (pos, p) in loaded.passages.iter().enumerate() {
        assert_eq!(p.id, pos);
    }
    assert_eq!(loaded.index, index);
}

#[test]
fn metadata_sidecar_uses_expected_field_names() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = IndexPaths::for_keyword(dir.path(), "borracha");
    let index = FlatL2Index::from_vectors(&vectors(1)).expect("index");
    save(&paths, &index, &passages(1)).expect("save");

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&paths.metadata).expect("read")).expect("json");
    assert_eq!(raw[0]["id"], 0);
    assert_eq!(raw[0]["path"], "https://legislacao.example/ato/0");
    assert!(raw[0]["conteudo"].as_str().unwrap().starts_with("PATH: "));
}

#[test]
fn missing_files_are_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = IndexPaths::for_keyword(dir.path(), "nada");
    let err = load(&paths).expect_err("must fail");
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[test]
fn missing_sidecar_alone_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = IndexPaths::for_keyword(dir.path(), "pneu");
    let index = FlatL2Index::from_vectors(&vectors(2)).expect("index");
    save(&paths, &index, &passages(2)).expect("save");
    fs::remove_file(&paths.metadata).expect("remove");

    assert!(matches!(load(&paths), Err(StoreError::NotFound { .. })));
}

#[test]
fn save_refuses_count_mismatch_and_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = IndexPaths::for_keyword(dir.path(), "x");
    let index = FlatL2Index::from_vectors(&vectors(3)).expect("index");

    let err = save(&paths, &index, &passages(2)).expect_err("must fail");
    assert!(matches!(err, StoreError::CountMismatch { vectors: 3, passages: 2 }));
    assert!(!paths.index.exists());
    assert!(!paths.metadata.exists());
}

#[test]
fn save_refuses_misaligned_ids() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = IndexPaths::for_keyword(dir.path(), "x");
    let index = FlatL2Index::from_vectors(&vectors(2)).expect("index");
    let mut ps = passages(2);
    ps.swap(0, 1);

    let err = save(&paths, &index, &ps).expect_err("must fail");
    assert!(matches!(err, StoreError::MisalignedId { position: 0, id: 1 }));
}

#[test]
fn rebuilding_overwrites_previous_index() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = IndexPaths::for_keyword(dir.path(), "cafe");

    let first = FlatL2Index::from_vectors(&vectors(4)).expect("index");
    save(&paths, &first, &passages(4)).expect("save");
    let second = FlatL2Index::from_vectors(&vectors(2)).expect("index");
    save(&paths, &second, &passages(2)).expect("save");

    let loaded = load(&paths).expect("load");
    assert_eq!(loaded.passages.len(), 2);
    assert_eq!(loaded.index.len(), 2);
}

#[test]
fn sidecar_out_of_sync_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = IndexPaths::for_keyword(dir.path(), "x");
    let index = FlatL2Index::from_vectors(&vectors(3)).expect("index");
    save(&paths, &index, &passages(3)).expect("save");

    let shorter = serde_json::to_vec(&passages(2)).expect("json");
    fs::write(&paths.metadata, shorter).expect("write");

    assert!(matches!(load(&paths), Err(StoreError::CountMismatch { .. })));
}
