use enigraph::filesystem::{Creation, FsTree};
use enigraph::progeny::{AvoidCircles, PrettyFormatter, ProgenyOptions};
use enigraph::NodeExt;
use tempfile::TempDir;

#[test]
fn pretty_listing_after_moves_and_renames() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let tree = FsTree::new();
    let test = tree
        .create(temp_dir.path().join("Enigraphtest"), Creation::Directory)
        .expect("Failed to create directory");
    let test2 = tree
        .create(temp_dir.path().join("Enigraphtest2"), Creation::Directory)
        .expect("Failed to create directory");
    let child = tree
        .create_child(&test, "bla", Creation::File)
        .expect("Failed to create file");

    let same = tree.open(temp_dir.path().join("Enigraphtest/bla"));
    same.rename("blub").expect("Failed to rename");
    assert_eq!(child.to_string(), "blub");

    test.set_parent(&test2).expect("Failed to move directory");
    child.set_parent(&test2).expect("Failed to move file");

    let lines: Vec<String> = test2
        .progeny(
            ProgenyOptions::depth_first().with_root(),
            PrettyFormatter::new(),
            AvoidCircles::new(),
        )
        .collect::<Result<_, _>>()
        .expect("Failed to list");
    assert_eq!(lines, vec!["+Enigraphtest2", " |Enigraphtest", " |blub"]);

    let ancestry: Vec<_> = child.ancestors(true).take(2).map(|node| node.to_string()).collect();
    assert_eq!(ancestry, vec!["blub", "Enigraphtest2"]);
    assert!(temp_dir.path().join("Enigraphtest2/blub").is_file());
    assert!(temp_dir.path().join("Enigraphtest2/Enigraphtest").is_dir());
}
