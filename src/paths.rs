use std::path::{Path, PathBuf};

pub fn out_manifest(work_dir: impl AsRef<Path>, prefix: &str) -> PathBuf {
    PathBuf::from(work_dir.as_ref()).join(format!("{prefix}_manifest.json"))
}

/// Scratch path a layout is written to before being renamed to `path`.
pub fn partial(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}
