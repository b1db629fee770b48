use pretty_assertions::assert_eq;
use tempfile::TempDir;
use weft_core::{FeatureStatus, FeatureStore};

#[test]
fn test_get_or_create_persists_draft() {
    let temp = TempDir::new().unwrap();
    let store = FeatureStore::new(temp.path());

    let state = store.get_or_create("login").unwrap();

    assert_eq!(state.status, FeatureStatus::Draft);
    assert!(temp.path().join(".weft/features/login/state.yaml").is_file());
    assert_eq!(store.load("login").unwrap(), state);
}

#[test]
fn test_transition_saves() {
    let temp = TempDir::new().unwrap();
    let store = FeatureStore::new(temp.path());

    store
        .transition("login", FeatureStatus::InProgress, Some("accepted"))
        .unwrap();
    let state = store.load("login").unwrap();

    assert_eq!(state.status, FeatureStatus::InProgress);
    assert_eq!(state.transitions.len(), 2);
    let yaml = std::fs::read_to_string(store.state_path("login")).unwrap();
    assert!(yaml.contains("status: in-progress"));
}

#[test]
fn test_invalid_transition_is_not_saved() {
    let temp = TempDir::new().unwrap();
    let store = FeatureStore::new(temp.path());
    store.get_or_create("login").unwrap();

    assert!(store.transition("login", FeatureStatus::Completed, None).is_err());
    assert_eq!(store.load("login").unwrap().status, FeatureStatus::Draft);
}

#[test]
fn test_list_filters_and_skips_broken_files() {
    let temp = TempDir::new().unwrap();
    let store = FeatureStore::new(temp.path());
    store.get_or_create("alpha").unwrap();
    store
        .transition("beta", FeatureStatus::InProgress, None)
        .unwrap();
    let broken = store.state_path("gamma");
    std::fs::create_dir_all(broken.parent().unwrap()).unwrap();
    std::fs::write(&broken, "status: [nonsense").unwrap();

    let all: Vec<_> = store
        .list(None)
        .unwrap()
        .into_iter()
        .map(|s| s.feature_name)
        .collect();
    let drafts = store.list(Some(FeatureStatus::Draft)).unwrap();

    assert_eq!(all, vec!["alpha", "beta"]);
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].feature_name, "alpha");
}

#[test]
fn test_missing_state_is_reported() {
    let temp = TempDir::new().unwrap();
    let store = FeatureStore::new(temp.path());
    assert!(store.load("nope").is_err());
    assert!(store.list(None).unwrap().is_empty());
}
