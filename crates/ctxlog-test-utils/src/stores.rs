use ctxlog_core::StoreKind;
use std::fs;
use std::path::{Path, PathBuf};

/// Overwrite a store document with arbitrary bytes.
pub fn write_raw_store(root: &Path, kind: StoreKind, contents: &str) -> PathBuf {
    let path = root.join(kind.file_name());
    fs::write(&path, contents).expect("write raw store");
    path
}

pub fn read_raw_store(root: &Path, kind: StoreKind) -> String {
    fs::read_to_string(root.join(kind.file_name())).expect("read raw store")
}

/// Preserved copies of unreadable documents for `kind`.
pub fn corrupt_copies(root: &Path, kind: StoreKind) -> Vec<PathBuf> {
    let prefix = format!("{}.corrupt-", kind.file_name());
    let mut copies: Vec<PathBuf> = fs::read_dir(root)
        .expect("list storage root")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix))
        })
        .collect();
    copies.sort();
    copies
}
