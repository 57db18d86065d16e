use std::fs;
use tempfile::tempdir;
use xs_devs_core::{Claim, MarkerStore};

#[test]
fn remove_all_walks_nested_system_dirs() {
    let tmp = tempdir().unwrap();
    let store = MarkerStore::new(tmp.path());
    store.put("sdb", "xs").unwrap();
    store.put("sdc", "xs").unwrap();

    // Directories are matched by basename at any depth.
    let nested = tmp.path().join("legacy/devs-old");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("sdb"), b"").unwrap();

    assert_eq!(store.remove_all("sdb"), 2);
    assert!(!nested.join("sdb").exists());
    assert_eq!(
        store.claims().unwrap(),
        vec![Claim {
            device: "sdc".to_string(),
            system: "xs".to_string()
        }]
    );
}

#[test]
fn claims_ignore_non_system_entries() {
    let tmp = tempdir().unwrap();
    let store = MarkerStore::new(tmp.path());
    store.put("sdb", "mpath").unwrap();
    fs::write(tmp.path().join("README"), b"x").unwrap();
    fs::create_dir_all(tmp.path().join("other")).unwrap();
    fs::write(tmp.path().join("other/sdb"), b"").unwrap();

    let claims = store.claims().unwrap();
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].system, "mpath");
}

#[test]
fn remove_ignores_invalid_names() {
    let tmp = tempdir().unwrap();
    let store = MarkerStore::new(tmp.path());
    store.put("sdb", "xs").unwrap();

    store.remove("..", "xs");
    store.remove("sdb", "../devs-xs");
    assert_eq!(store.remove_all("/"), 0);
    assert_eq!(store.claims().unwrap().len(), 1);
}
