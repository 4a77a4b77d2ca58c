use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::FareInputError;

/// A directory holding the reference files (`fare_products.txt`,
/// `fare_transfer_rules.txt`, `stops.txt`, `gtfsoperators.xml`).
#[derive(Debug, Clone)]
pub struct FareDataInput {
    root: PathBuf,
}

impl FareDataInput {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FareInputError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FareInputError::MissingPath(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(FareInputError::NotADirectory(path.to_path_buf()));
        }
        Ok(Self {
            root: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn read_optional_file(&self, name: &str) -> Result<Option<Vec<u8>>, FareInputError> {
        match fs::read(self.root.join(name)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FareInputError::Io {
                file: name.to_string(),
                source,
            }),
        }
    }

    pub fn read_required_file(&self, name: &str) -> Result<Vec<u8>, FareInputError> {
        self.read_optional_file(name)?
            .ok_or_else(|| FareInputError::MissingFile(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        std::env::temp_dir().join(format!("{}_{}_{}", prefix, std::process::id(), nanos))
    }

    #[test]
    fn rejects_missing_and_non_directory_paths() {
        let dir = temp_dir("fare_input_missing");
        assert!(matches!(
            FareDataInput::from_path(&dir),
            Err(FareInputError::MissingPath(_))
        ));

        fs::create_dir_all(&dir).expect("create dir");
        let file = dir.join("fare_products.txt");
        fs::write(&file, "fare_product_id\n").expect("write file");
        assert!(matches!(
            FareDataInput::from_path(&file),
            Err(FareInputError::NotADirectory(_))
        ));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn reads_optional_and_required_files() {
        let dir = temp_dir("fare_input_read");
        fs::create_dir_all(&dir).expect("create dir");
        fs::write(dir.join("stops.txt"), "stop_id,stop_name\n").expect("write file");

        let input = FareDataInput::from_path(&dir).expect("input");
        assert!(input.read_optional_file("stops.txt").unwrap().is_some());
        assert!(input.read_optional_file("gtfsoperators.xml").unwrap().is_none());
        assert!(matches!(
            input.read_required_file("fare_products.txt"),
            Err(FareInputError::MissingFile(name)) if name == "fare_products.txt"
        ));

        fs::remove_dir_all(&dir).ok();
    }
}
