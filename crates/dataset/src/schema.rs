use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaDefect {
    #[error("Missing schema file: {0}")]
    Missing(PathBuf),
    #[error("Cannot read schema file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid YAML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Schema file {0} is not a key-value document")]
    NotAMapping(PathBuf),
    #[error("Missing required field '{0}' in schema file")]
    MissingKey(String),
}

/// Checks that the dataset schema file exists, parses, and declares every
/// required top-level key. Values are not inspected.
pub fn check_schema_file(path: &Path, required_keys: &[String]) -> Result<(), SchemaDefect> {
    if !path.is_file() {
        return Err(SchemaDefect::Missing(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path).map_err(|source| SchemaDefect::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: serde_yaml::Value = serde_yaml::from_str(&text).map_err(|source| SchemaDefect::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let serde_yaml::Value::Mapping(map) = doc else {
        return Err(SchemaDefect::NotAMapping(path.to_path_buf()));
    };

    for key in required_keys {
        if !map.contains_key(key.as_str()) {
            return Err(SchemaDefect::MissingKey(key.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::REQUIRED_SCHEMA_KEYS;

    fn required() -> Vec<String> {
        REQUIRED_SCHEMA_KEYS.iter().map(|s| s.to_string()).collect()
    }

    fn write(dir: &Path, body: &str) -> PathBuf {
        let p = dir.join("data.yaml");
        std::fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn test_complete_schema_passes() {
        let tmp = tempfile::tempdir().unwrap();
        let p = write(
            tmp.path(),
            "train: ../train/images\nval: ../valid/images\ntest: ../test/images\nnc: 1\nnames: ['pothole']\n",
        );
        check_schema_file(&p, &required()).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = check_schema_file(&tmp.path().join("data.yaml"), &required()).unwrap_err();
        assert!(matches!(err, SchemaDefect::Missing(_)));
    }

    #[test]
    fn test_missing_key_is_named() {
        let tmp = tempfile::tempdir().unwrap();
        let p = write(tmp.path(), "train: a\nval: b\ntest: c\nnames: [pothole]\n");
        match check_schema_file(&p, &required()) {
            Err(SchemaDefect::MissingKey(k)) => assert_eq!(k, "nc"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_and_non_mapping_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let p = write(tmp.path(), "train: [unclosed\n");
        assert!(matches!(check_schema_file(&p, &required()), Err(SchemaDefect::Parse { .. })));

        let p = write(tmp.path(), "- train\n- val\n");
        assert!(matches!(check_schema_file(&p, &required()), Err(SchemaDefect::NotAMapping(_))));

        let p = write(tmp.path(), "");
        assert!(check_schema_file(&p, &required()).is_err());
    }
}
