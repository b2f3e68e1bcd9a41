use std::fs;

use serde_json::{Value, json};
use tempfile::TempDir;
use ztree_core::{DirTree, NodeId, SETTINGS_FILE, SortMethod, TreeConfig, TreeError};
use ztree_ops::{MutationEngine, RemoveOutcome};
use ztree_scan::{ParseCache, TreeBuilder};

fn engine() -> MutationEngine {
    let config = TreeConfig::builder().use_trash(false).build().unwrap();
    MutationEngine::new(TreeBuilder::new(config).unwrap())
}

async fn build(engine: &MutationEngine, temp: &TempDir) -> (DirTree, NodeId, ParseCache) {
    let mut tree = DirTree::new();
    let cache = ParseCache::new();
    let root = engine
        .builder()
        .build(&mut tree, temp.path(), None, &cache)
        .await
        .unwrap();
    (tree, root, cache)
}

fn child_names(tree: &DirTree, id: NodeId) -> Vec<String> {
    tree.dir(id)
        .unwrap()
        .children
        .iter()
        .map(|c| tree.node(*c).unwrap().name().to_string())
        .collect()
}

fn read_sidecar(dir: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(dir.join(SETTINGS_FILE)).unwrap()).unwrap()
}

#[tokio::test]
async fn test_rename_keeps_position_and_parent() {
    let temp = TempDir::new().unwrap();
    for name in ["a", "m", "z"] {
        fs::create_dir(temp.path().join(name)).unwrap();
    }
    fs::create_dir(temp.path().join("m/inner")).unwrap();
    fs::write(temp.path().join("m/inner/deep.md"), "deep").unwrap();

    let engine = engine();
    let (mut tree, root, cache) = build(&engine, &temp).await;
    let old = tree.child_named(root, "m").unwrap();

    let renamed = engine.rename(&mut tree, old, "n", &cache).await.unwrap();

    assert!(!tree.contains(old));
    assert_eq!(tree.parent_of(renamed), Some(root));
    assert_eq!(tree.dir(root).unwrap().children[1], renamed);
    assert_eq!(child_names(&tree, root), vec!["a", "n", "z"]);

    let inner = tree.child_named(renamed, "inner").unwrap();
    let deep = tree.child_named(inner, "deep.md").unwrap();
    assert_eq!(
        tree.leaf(deep).unwrap().path,
        temp.path().join("n/inner/deep.md")
    );
    assert!(temp.path().join("n/inner/deep.md").exists());
    assert!(!temp.path().join("m").exists());
}

#[tokio::test]
async fn test_rename_rejects_names_taken_on_disk() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("a")).unwrap();
    // Ignored by the builder, but still occupies the name on disk.
    fs::create_dir(temp.path().join(".cache")).unwrap();

    let engine = engine();
    let (mut tree, root, cache) = build(&engine, &temp).await;
    let a = tree.child_named(root, "a").unwrap();

    let err = engine.rename(&mut tree, a, ".cache", &cache).await.unwrap_err();
    assert!(matches!(err, TreeError::NameExists { .. }));

    let err = engine.rename(&mut tree, a, "  ", &cache).await.unwrap_err();
    assert!(matches!(err, TreeError::InvalidName { .. }));
    assert!(tree.contains(a));
}

#[tokio::test]
async fn test_create_rejects_collision_without_touching_disk() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("notes")).unwrap();

    let engine = engine();
    let (mut tree, root, cache) = build(&engine, &temp).await;
    // Removed behind the tree's back: a disk check would let the create through.
    fs::remove_dir(temp.path().join("notes")).unwrap();

    let err = engine.create(&mut tree, root, "notes", &cache).await.unwrap_err();
    assert!(matches!(err, TreeError::NameExists { .. }));
    assert!(!temp.path().join("notes").exists());

    let err = engine.create(&mut tree, root, "", &cache).await.unwrap_err();
    assert!(matches!(err, TreeError::InvalidName { .. }));
}

#[tokio::test]
async fn test_create_directory_and_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("b.md"), "b").unwrap();

    let engine = engine();
    let (mut tree, root, cache) = build(&engine, &temp).await;

    let dir = engine.create(&mut tree, root, "a", &cache).await.unwrap();
    assert!(temp.path().join("a").is_dir());
    assert_eq!(tree.parent_of(dir), Some(root));

    let file = engine
        .create_file(&mut tree, root, "c.md", "# C", &cache)
        .await
        .unwrap();
    assert_eq!(fs::read_to_string(temp.path().join("c.md")).unwrap(), "# C");
    assert_eq!(tree.leaf(file).unwrap().size, 3);
    assert_eq!(child_names(&tree, root), vec!["a", "b.md", "c.md"]);

    let err = engine
        .create_file(&mut tree, root, "data.bin", "", &cache)
        .await
        .unwrap_err();
    assert!(matches!(err, TreeError::InvalidName { .. }));
    assert!(!temp.path().join("data.bin").exists());
}

#[tokio::test]
async fn test_move_relocates_and_resorts() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("src")).unwrap();
    fs::create_dir(temp.path().join("dst")).unwrap();
    fs::write(temp.path().join("src/b.md"), "b").unwrap();
    fs::write(temp.path().join("dst/a.md"), "a").unwrap();
    fs::write(temp.path().join("dst/c.md"), "c").unwrap();

    let engine = engine();
    let (mut tree, root, cache) = build(&engine, &temp).await;
    let src = tree.child_named(root, "src").unwrap();
    let dst = tree.child_named(root, "dst").unwrap();
    let b = tree.child_named(src, "b.md").unwrap();

    let outcome = engine.move_node(&mut tree, b, dst, &cache).await.unwrap();

    assert!(outcome.detached);
    assert!(!tree.contains(b));
    assert!(tree.dir(src).unwrap().children.is_empty());
    assert_eq!(child_names(&tree, dst), vec!["a.md", "b.md", "c.md"]);
    assert_eq!(tree.parent_of(outcome.node), Some(dst));
    assert!(temp.path().join("dst/b.md").exists());
    assert!(!temp.path().join("src/b.md").exists());
}

#[tokio::test]
async fn test_move_directory_rebuilds_subtree() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("src/chapter")).unwrap();
    fs::create_dir(temp.path().join("dst")).unwrap();
    fs::write(temp.path().join("src/chapter/one.md"), "1").unwrap();

    let engine = engine();
    let (mut tree, root, cache) = build(&engine, &temp).await;
    let src = tree.child_named(root, "src").unwrap();
    let dst = tree.child_named(root, "dst").unwrap();
    let chapter = tree.child_named(src, "chapter").unwrap();

    let err = engine
        .move_node(&mut tree, src, chapter, &cache)
        .await
        .unwrap_err();
    assert!(matches!(err, TreeError::Conflict { .. }));

    let outcome = engine
        .move_node(&mut tree, chapter, dst, &cache)
        .await
        .unwrap();
    let one = tree.child_named(outcome.node, "one.md").unwrap();
    assert_eq!(
        tree.leaf(one).unwrap().path,
        temp.path().join("dst/chapter/one.md")
    );
}

#[tokio::test]
async fn test_remove_deletes_and_splices() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("old")).unwrap();
    fs::write(temp.path().join("old/x.md"), "x").unwrap();
    fs::write(temp.path().join("keep.md"), "k").unwrap();

    let engine = engine();
    let (mut tree, root, cache) = build(&engine, &temp).await;
    let old = tree.child_named(root, "old").unwrap();
    let before = tree.len();

    let outcome = engine.remove(&mut tree, old, &cache).await;

    assert_eq!(outcome, RemoveOutcome::Deleted);
    assert!(!temp.path().join("old").exists());
    assert_eq!(child_names(&tree, root), vec!["keep.md"]);
    assert_eq!(tree.len(), before - 2);

    // Already gone: nothing left to remove.
    assert_eq!(engine.remove(&mut tree, old, &cache).await, RemoveOutcome::Failed);
}

#[tokio::test]
async fn test_sort_methods() {
    let temp = TempDir::new().unwrap();
    for name in ["a.md", "b.md"] {
        fs::write(temp.path().join(name), name).unwrap();
    }

    let engine = engine();
    let (mut tree, root, _cache) = build(&engine, &temp).await;

    let method = engine.sort(&mut tree, root, Some("name-down")).await.unwrap();
    assert_eq!(method, SortMethod::NameDown);
    assert_eq!(child_names(&tree, root), vec!["b.md", "a.md"]);
    assert_eq!(read_sidecar(temp.path())["sorting"], json!("name-down"));

    let method = engine.sort(&mut tree, root, None).await.unwrap();
    assert_eq!(method, SortMethod::NameDown);

    let err = engine.sort(&mut tree, root, Some("size-up")).await.unwrap_err();
    assert!(matches!(err, TreeError::UnknownSortMethod { .. }));
    assert_eq!(tree.dir(root).unwrap().settings.sorting, SortMethod::NameDown);

    engine.sort(&mut tree, root, Some("name-up")).await.unwrap();
    assert!(!temp.path().join(SETTINGS_FILE).exists());
}

#[tokio::test]
async fn test_project_lifecycle() {
    let temp = TempDir::new().unwrap();
    let engine = engine();
    let (mut tree, root, _cache) = build(&engine, &temp).await;

    engine.make_project(&mut tree, root).await.unwrap();
    let sidecar = read_sidecar(temp.path());
    assert_eq!(sidecar["project"]["title"], json!("Untitled"));
    assert_eq!(sidecar["project"]["pdf"]["tocDepth"], json!(2));

    engine
        .update_project_properties(&mut tree, root, &json!({"title": "Thesis", "pdf": {"fontsize": 11}}))
        .await
        .unwrap();
    let project = tree.dir(root).unwrap().settings.project.clone().unwrap();
    assert_eq!(project.title, "Thesis");
    assert_eq!(project.pdf.fontsize, 11);
    assert_eq!(project.pdf.papertype, "a4paper");

    engine
        .set_setting(&mut tree, root, &json!({"icon": "book", "bogus": 1}))
        .await
        .unwrap();
    let sidecar = read_sidecar(temp.path());
    assert_eq!(sidecar["icon"], json!("book"));
    assert!(sidecar.get("bogus").is_none());

    engine.remove_project(&mut tree, root).await.unwrap();
    engine.set_icon(&mut tree, root, None).await.unwrap();
    assert!(!temp.path().join(SETTINGS_FILE).exists());
    assert!(tree.dir(root).unwrap().settings.is_default());
}

#[tokio::test]
async fn test_update_project_properties_without_project_uses_template() {
    let temp = TempDir::new().unwrap();
    let engine = engine();
    let (mut tree, root, _cache) = build(&engine, &temp).await;

    engine
        .update_project_properties(&mut tree, root, &json!({"format": "html"}))
        .await
        .unwrap();

    let project = tree.dir(root).unwrap().settings.project.clone().unwrap();
    assert_eq!(project.title, "Untitled");
    assert_eq!(project.format.to_string(), "html");
}

#[tokio::test]
async fn test_rename_reattaches_node_missing_from_parent() {
    let temp = TempDir::new().unwrap();
    for name in ["a", "m"] {
        fs::create_dir(temp.path().join(name)).unwrap();
    }

    let engine = engine();
    let (mut tree, root, cache) = build(&engine, &temp).await;
    let old = tree.child_named(root, "m").unwrap();
    tree.detach(old);
    assert_eq!(child_names(&tree, root), vec!["a"]);

    let renamed = engine.rename(&mut tree, old, "n", &cache).await.unwrap();

    assert!(!tree.contains(old));
    assert_eq!(tree.parent_of(renamed), Some(root));
    assert_eq!(child_names(&tree, root), vec!["a", "n"]);
    assert!(temp.path().join("n").is_dir());
}

#[tokio::test]
async fn test_rename_root() {
    let temp = TempDir::new().unwrap();
    let book = temp.path().join("book");
    fs::create_dir(&book).unwrap();
    fs::write(book.join("intro.md"), "intro").unwrap();

    let engine = engine();
    let mut tree = DirTree::new();
    let cache = ParseCache::new();
    let root = engine
        .builder()
        .build(&mut tree, &book, None, &cache)
        .await
        .unwrap();

    let renamed = engine.rename(&mut tree, root, "novel", &cache).await.unwrap();

    assert!(!tree.contains(root));
    assert_eq!(tree.parent_of(renamed), None);
    assert_eq!(tree.dir(renamed).unwrap().path, temp.path().join("novel"));
    assert_eq!(child_names(&tree, renamed), vec!["intro.md"]);
    assert_eq!(tree.len(), 2);
}

#[tokio::test]
async fn test_move_source_missing_from_parent() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("src")).unwrap();
    fs::create_dir(temp.path().join("dst")).unwrap();
    fs::write(temp.path().join("src/b.md"), "b").unwrap();

    let engine = engine();
    let (mut tree, root, cache) = build(&engine, &temp).await;
    let dst = tree.child_named(root, "dst").unwrap();
    let src = tree.child_named(root, "src").unwrap();
    let b = tree.child_named(src, "b.md").unwrap();
    tree.detach(b);
    let before = tree.len();

    let outcome = engine.move_node(&mut tree, b, dst, &cache).await.unwrap();

    assert!(!outcome.detached);
    assert!(!tree.contains(b));
    assert_eq!(tree.len(), before);
    assert_eq!(child_names(&tree, dst), vec!["b.md"]);
    assert_eq!(tree.parent_of(outcome.node), Some(dst));
    assert!(temp.path().join("dst/b.md").exists());
}

#[tokio::test]
async fn test_remove_with_trash_enabled() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("old")).unwrap();
    fs::write(temp.path().join("old/x.md"), "x").unwrap();

    let engine = MutationEngine::new(TreeBuilder::new(TreeConfig::default()).unwrap());
    assert!(engine.builder().config().use_trash);
    let (mut tree, root, cache) = build(&engine, &temp).await;
    let old = tree.child_named(root, "old").unwrap();

    // Either the trash takes it or the delete fallback does.
    let outcome = engine.remove(&mut tree, old, &cache).await;

    assert!(outcome.is_removed());
    assert!(!temp.path().join("old").exists());
    assert!(!tree.contains(old));
    assert!(tree.dir(root).unwrap().children.is_empty());
}

#[tokio::test]
async fn test_failed_settings_write_keeps_children_sorted() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("sub")).unwrap();
    for name in ["a.md", "b.md"] {
        fs::write(temp.path().join("sub").join(name), name).unwrap();
    }

    let engine = engine();
    let (mut tree, root, _cache) = build(&engine, &temp).await;
    let sub = tree.child_named(root, "sub").unwrap();
    fs::remove_dir_all(temp.path().join("sub")).unwrap();

    let err = engine.sort(&mut tree, sub, Some("name-down")).await.unwrap_err();
    assert!(matches!(err, TreeError::NotFound { .. }));
    assert_eq!(tree.dir(sub).unwrap().settings.sorting, SortMethod::NameUp);
    assert_eq!(child_names(&tree, sub), vec!["a.md", "b.md"]);

    engine
        .set_setting(&mut tree, sub, &json!({"sorting": "name-down"}))
        .await
        .unwrap_err();
    assert_eq!(tree.dir(sub).unwrap().settings.sorting, SortMethod::NameUp);
    assert_eq!(child_names(&tree, sub), vec!["a.md", "b.md"]);

    engine.set_icon(&mut tree, sub, Some("book")).await.unwrap_err();
    assert!(tree.dir(sub).unwrap().settings.icon.is_none());
}

#[tokio::test]
async fn test_create_rejects_ignored_names() {
    let temp = TempDir::new().unwrap();
    let engine = engine();
    let (mut tree, root, cache) = build(&engine, &temp).await;

    for name in [".drafts", SETTINGS_FILE, "node_modules"] {
        let err = engine.create(&mut tree, root, name, &cache).await.unwrap_err();
        assert!(matches!(err, TreeError::InvalidName { .. }), "{name}");
        assert!(!temp.path().join(name).exists());
    }

    let err = engine
        .create_file(&mut tree, root, ".notes.md", "hidden", &cache)
        .await
        .unwrap_err();
    assert!(matches!(err, TreeError::InvalidName { .. }));
    assert!(!temp.path().join(".notes.md").exists());
    assert!(tree.dir(root).unwrap().children.is_empty());
}
