use crate::api::{Error, InputKind, Result};
use crate::model::Source;
use glob::{glob, Pattern};
use std::fs;
use std::path::{Path, PathBuf};

/// Reads every `*.sql` file directly inside `dir`, sorted by file name.
pub fn load_migrations(dir: &Path) -> Result<Vec<Source>> {
    if !dir.is_dir() {
        return Err(Error::missing_input(InputKind::Migrations, dir));
    }

    let files = resolve_glob(&dir_pattern(dir, "*.sql"))?;
    if files.is_empty() {
        tracing::warn!(dir = %dir.display(), "no migration files found");
    }

    files
        .into_iter()
        .map(|path| {
            let name = file_name(&path);
            read_source(&path, name)
        })
        .collect()
}

pub fn load_type_file(path: &Path) -> Result<Source> {
    if !path.is_file() {
        return Err(Error::missing_input(InputKind::Types, path));
    }
    read_source(path, file_name(path))
}

/// Reads every file named `leaf` below `dir`. Each file is one module, named
/// after its parent directory.
pub fn load_modules(dir: &Path, leaf: &str) -> Result<Vec<Source>> {
    if !dir.is_dir() {
        return Err(Error::missing_input(InputKind::Modules, dir));
    }

    let pattern = dir_pattern(dir, &format!("**/{}", Pattern::escape(leaf)));
    let files = resolve_glob(&pattern)?;
    if files.is_empty() {
        tracing::warn!(dir = %dir.display(), leaf, "no module files found");
    }

    files
        .into_iter()
        .map(|path| {
            let name = module_name(&path);
            read_source(&path, name)
        })
        .collect()
}

/// Name of the module a file belongs to: its parent directory.
pub fn module_name(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .or_else(|| path.file_stem())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_source(path: &Path, name: String) -> Result<Source> {
    let bytes = fs::read(path).map_err(|e| Error::read(path, e))?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(file = %path.display(), "not valid UTF-8, invalid bytes replaced");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    Ok(Source::new(name, text))
}

fn dir_pattern(dir: &Path, tail: &str) -> String {
    let escaped = Pattern::escape(&dir.to_string_lossy());
    format!("{}/{tail}", escaped.trim_end_matches('/'))
}

fn resolve_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob(pattern).map_err(|e| Error::invalid_pattern(pattern, e.to_string()))?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::read(e.path().to_path_buf(), e.into_error()))?;
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
