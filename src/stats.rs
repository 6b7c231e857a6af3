use crate::error::Error;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static STATS_FILE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^stats_t(\d+)\.txt$").unwrap());

/// Sequential index `N` of a `stats_tN.txt` file.
pub fn file_number(path: impl AsRef<Path>) -> Result<u64, Error> {
    let path = path.as_ref();
    let unexpected = || Error::UnexpectedFileName {
        path: path.to_path_buf(),
    };
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(unexpected)?;
    let cap = STATS_FILE_REGEX.captures(file_name).ok_or_else(unexpected)?;
    cap[1].parse().map_err(|_| unexpected())
}

/// Statistics files of a run directory, in numeric (not lexicographic) order.
pub fn stat_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, Error> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::missing(dir));
    }
    let pattern = Path::new(&glob::Pattern::escape(&dir.to_string_lossy())).join("stats_t*.txt");
    let mut files = Vec::new();
    for entry in glob::glob(&pattern.to_string_lossy())? {
        let path = entry.map_err(|err| Error::io(err.path().to_path_buf(), err.into_error()))?;
        let number = file_number(&path)?;
        files.push((number, path));
    }
    files.sort_by_key(|(number, _)| *number);
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

pub fn stat_files_per_dir<P: AsRef<Path>>(dirs: &[P]) -> Result<Vec<Vec<PathBuf>>, Error> {
    dirs.iter()
        .map(|dir| {
            let files = stat_files(dir)?;
            log::debug!("{} has {} stats files", dir.as_ref().display(), files.len());
            Ok(files)
        })
        .collect()
}

/// Number of statistics files every one of the run directories has.
pub fn end_file_number_of(files_per_dir: &[Vec<PathBuf>]) -> Option<usize> {
    files_per_dir.iter().map(Vec::len).min()
}

pub fn end_file_number<P: AsRef<Path>>(dirs: &[P]) -> Result<Option<usize>, Error> {
    Ok(end_file_number_of(&stat_files_per_dir(dirs)?))
}

#[cfg(test)]
mod tests {
    use super::{end_file_number, end_file_number_of, file_number, stat_files, stat_files_per_dir};
    use crate::error::Error;
    use color_eyre::eyre;
    use pretty_assertions_sorted as diff;
    use std::path::Path;

    fn touch(dir: &Path, names: &[&str]) -> eyre::Result<()> {
        for name in names {
            std::fs::write(dir.join(name), "")?;
        }
        Ok(())
    }

    #[test]
    fn test_file_number() -> eyre::Result<()> {
        assert_eq!(file_number("run/stats_t0.txt")?, 0);
        assert_eq!(file_number("/a/b/stats_t123.txt")?, 123);
        assert!(matches!(
            file_number("run/stats_tx.txt"),
            Err(Error::UnexpectedFileName { .. })
        ));
        assert!(file_number("run/stats_t1.txt.bak").is_err());
        Ok(())
    }

    #[test]
    fn test_stat_files_numeric_order() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        touch(
            dir.path(),
            &["stats_t10.txt", "stats_t2.txt", "stats_t1.txt", "other.txt"],
        )?;
        let files: Vec<_> = stat_files(dir.path())?
            .into_iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        diff::assert_eq!(
            files,
            vec![
                "stats_t1.txt".to_string(),
                "stats_t2.txt".to_string(),
                "stats_t10.txt".to_string(),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_stat_files_missing_dir() {
        assert!(matches!(
            stat_files("/does/not/exist"),
            Err(Error::MissingPath { .. })
        ));
    }

    #[test]
    fn test_end_file_number() -> eyre::Result<()> {
        let a = tempfile::tempdir()?;
        let b = tempfile::tempdir()?;
        touch(a.path(), &["stats_t0.txt", "stats_t1.txt", "stats_t2.txt"])?;
        touch(b.path(), &["stats_t0.txt", "stats_t1.txt"])?;
        assert_eq!(end_file_number(&[a.path(), b.path()])?, Some(2));
        assert_eq!(end_file_number::<&Path>(&[])?, None);

        let per_dir = stat_files_per_dir(&[a.path(), b.path()])?;
        assert_eq!(per_dir.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(end_file_number_of(&per_dir), Some(2));
        Ok(())
    }

    #[test]
    fn test_stat_files_dir_with_glob_characters() -> eyre::Result<()> {
        let root = tempfile::tempdir()?;
        let bracketed = root.path().join("run[1]");
        let plain = root.path().join("run1");
        std::fs::create_dir(&bracketed)?;
        std::fs::create_dir(&plain)?;
        touch(&bracketed, &["stats_t0.txt", "stats_t1.txt"])?;
        touch(&plain, &["stats_t5.txt"])?;

        let files = stat_files(&bracketed)?;
        diff::assert_eq!(
            files,
            vec![
                bracketed.join("stats_t0.txt"),
                bracketed.join("stats_t1.txt"),
            ]
        );
        Ok(())
    }
}
