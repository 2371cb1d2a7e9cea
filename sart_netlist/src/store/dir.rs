use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use super::{LevelRecord, LevelStore};
use crate::{Error, Result};

const EXT: &str = "json";

/// One JSON file per level under `root`. Level names are escaped into file
/// names, `%` as `%25` and `/` as `%2F`.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Opens `root`, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> PathBuf {
        let escaped = name.replace('%', "%25").replace('/', "%2F");
        self.root.join(format!("{escaped}.{EXT}"))
    }

    fn level_name(file_stem: &str) -> String {
        file_stem.replace("%2F", "/").replace("%25", "%")
    }
}

impl LevelStore for DirStore {
    fn save(&self, record: &LevelRecord) -> Result<()> {
        let mut writer = BufWriter::new(File::create(self.path(&record.name))?);
        serde_json::to_writer(&mut writer, record)?;
        writer.flush()?;
        Ok(())
    }

    fn load(&self, name: &str) -> Result<LevelRecord> {
        let path = self.path(name);
        if !path.is_file() {
            return Err(Error::MissingLevel(name.to_string()));
        }

        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn level_names(&self) -> Result<Vec<String>> {
        let mut names = vec![];
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(Self::level_name(stem));
            }
        }
        names.sort();
        Ok(names)
    }
}
