use seedkit::scanner::ScanOptions;
use seedkit::{ErrorKind, ScanEntry, Scanner};
use std::fs;
use std::path::{Path, PathBuf};

fn write(path: &Path, data: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, data).unwrap();
}

fn scanner() -> Scanner {
    Scanner::local(&ScanOptions::default()).unwrap()
}

#[test]
fn test_scan_real_tree() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("album");
    write(&root.join("02.flac"), b"two");
    write(&root.join("01.flac"), b"one!");
    write(&root.join(".DS_Store"), b"junk");
    write(&root.join("scans/front.jpg"), b"jpeg");
    write(&root.join(".cache/thumb.jpg"), b"hidden");

    let forest = scanner().scan(&[root.clone()]).unwrap();
    assert_eq!(forest.len(), 1);

    let ScanEntry::Dir(dir) = &forest[0] else {
        panic!("expected a directory");
    };
    assert_eq!(dir.name, "album");
    let names: Vec<_> = dir.children.iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, vec!["01.flac", "02.flac", "scans"]);
    assert_eq!(forest[0].total_size(), 11);
}

#[test]
fn test_find_directories_at_any_depth() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("library");
    write(&root.join("a/1.txt"), b"1");
    write(&root.join("a/b/c/2.txt"), b"2");
    fs::create_dir_all(root.join("empty/nested")).unwrap();

    let dirs = scanner().find_directories(&[root.clone()]).unwrap();
    assert_eq!(dirs, vec![root.join("a"), root.join("a/b/c")]);
}

#[test]
fn test_exclude_patterns() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("content");
    write(&root.join("keep.txt"), b"keep");
    write(&root.join("ignore.tmp"), b"ignore");
    write(&root.join("sub/nested_ignore.tmp"), b"ignore");

    let options = ScanOptions {
        exclude: vec!["*.tmp".into()],
        ..ScanOptions::default()
    };
    let files = Scanner::local(&options)
        .unwrap()
        .find_files(&[root.clone()])
        .unwrap();
    let paths: Vec<PathBuf> = files.into_iter().map(|f| f.path).collect();
    assert_eq!(paths, vec![root.join("keep.txt")]);
}

#[test]
fn test_missing_root_fails_whole_scan() {
    let temp_dir = tempfile::tempdir().unwrap();
    let present = temp_dir.path().join("present.txt");
    write(&present, b"data");

    let err = scanner()
        .scan(&[present, temp_dir.path().join("missing")])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.path().unwrap().ends_with("missing"));
}

#[test]
fn test_files_in_dir_is_flat() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("flat");
    write(&root.join("b.txt"), b"bb");
    write(&root.join("a.txt"), b"a");
    write(&root.join("deeper/c.txt"), b"c");

    let files = scanner().files_in_dir(&root).unwrap();
    let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
    assert_eq!(files[1].size, 2);
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_aborts_scan() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("locked");
    let sealed = root.join("sealed");
    write(&sealed.join("secret.txt"), b"x");
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o000)).unwrap();

    // root ignores permission bits
    if fs::read_dir(&sealed).is_ok() {
        fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = scanner().scan(&[root]);
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).unwrap();

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(err.path(), Some(sealed.as_path()));
}
