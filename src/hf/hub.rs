use std::fs;
use std::path::{Path, PathBuf};

use hf_hub::api::tokio::Api;
use tracing::{debug, info};

use crate::hf::ModelError;

pub const CONFIG_FILE: &str = "config.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHT_FILES: [&str; 2] = ["model.safetensors", "pytorch_model.bin"];

/// The files that make up a pretrained tokenizer/model pair.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    /// Hub id or directory the files were resolved from.
    pub origin: String,
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: Option<PathBuf>,
}

impl ModelFiles {
    /// Fetches (or reuses from the local hub cache) a model's files.
    pub async fn from_hub(model_id: &str, with_weights: bool) -> Result<Self, ModelError> {
        let model_id = model_id.trim();
        let load_err = |reason: String| ModelError::Load {
            model: model_id.to_string(),
            reason,
        };

        let api = Api::new().map_err(|err| load_err(err.to_string()))?;
        let repo = api.model(model_id.to_string());

        let config = repo
            .get(CONFIG_FILE)
            .await
            .map_err(|err| load_err(err.to_string()))?;
        let tokenizer = repo
            .get(TOKENIZER_FILE)
            .await
            .map_err(|err| load_err(err.to_string()))?;

        let weights = if with_weights {
            let mut found = None;
            let mut last_error = String::new();
            for name in WEIGHT_FILES {
                match repo.get(name).await {
                    Ok(path) => {
                        found = Some(path);
                        break;
                    }
                    Err(err) => {
                        debug!(file = name, error = %err, "weight file not available");
                        last_error = err.to_string();
                    }
                }
            }
            Some(found.ok_or_else(|| load_err(format!("no weight file: {last_error}")))?)
        } else {
            None
        };

        info!(model = model_id, "resolved model files");
        Ok(Self {
            origin: model_id.to_string(),
            config,
            tokenizer,
            weights,
        })
    }

    /// Resolves files previously written by [`ModelFiles::save_to`].
    pub fn from_dir(dir: &Path) -> Result<Self, ModelError> {
        let origin = dir.display().to_string();
        let require = |name: &str| {
            let path = dir.join(name);
            if path.is_file() {
                Ok(path)
            } else {
                Err(ModelError::Load {
                    model: origin.clone(),
                    reason: format!("missing {name}"),
                })
            }
        };

        let config = require(CONFIG_FILE)?;
        let tokenizer = require(TOKENIZER_FILE)?;
        let weights = WEIGHT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file());

        Ok(Self {
            origin,
            config,
            tokenizer,
            weights,
        })
    }

    /// Copies the files into `dir`, creating it when needed.
    pub fn save_to(&self, dir: &Path) -> Result<(), ModelError> {
        let save_err = |reason: String| ModelError::Save {
            model: self.origin.clone(),
            dir: dir.display().to_string(),
            reason,
        };

        fs::create_dir_all(dir).map_err(|err| save_err(err.to_string()))?;

        let mut files = vec![(&self.config, CONFIG_FILE), (&self.tokenizer, TOKENIZER_FILE)];
        if let Some(weights) = &self.weights {
            let name = weights
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(WEIGHT_FILES[0]);
            files.push((weights, name));
        }

        for (source, name) in files {
            let target = dir.join(name);
            if same_file(source, &target) {
                continue;
            }
            fs::copy(source, &target).map_err(|err| save_err(format!("{name}: {err}")))?;
        }

        info!(model = %self.origin, dir = %dir.display(), "saved model files");
        Ok(())
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_model_dir(dir: &Path, with_weights: bool) {
        fs::write(dir.join(CONFIG_FILE), r#"{"model_type":"distilbert"}"#).expect("config");
        fs::write(dir.join(TOKENIZER_FILE), "{}").expect("tokenizer");
        if with_weights {
            fs::write(dir.join("model.safetensors"), b"weights").expect("weights");
        }
    }

    #[test]
    fn directory_round_trip_keeps_all_files() {
        let source = tempfile::tempdir().expect("tempdir");
        write_model_dir(source.path(), true);
        let files = ModelFiles::from_dir(source.path()).expect("complete model dir");

        let target = tempfile::tempdir().expect("tempdir");
        let saved = target.path().join("nested").join("model_directory");
        files.save_to(&saved).expect("save succeeds");

        let reloaded = ModelFiles::from_dir(&saved).expect("saved dir loads");
        assert_eq!(
            reloaded.weights.as_deref().and_then(Path::file_name),
            Some("model.safetensors".as_ref())
        );
        assert_eq!(
            fs::read_to_string(reloaded.config).expect("config readable"),
            r#"{"model_type":"distilbert"}"#
        );
    }

    #[test]
    fn tokenizer_only_directories_are_accepted() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_model_dir(dir.path(), false);
        let files = ModelFiles::from_dir(dir.path()).expect("loads");
        assert!(files.weights.is_none());
    }

    #[test]
    fn missing_files_name_the_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ModelFiles::from_dir(dir.path()).expect_err("empty dir");
        let message = err.to_string();
        assert!(message.contains(&dir.path().display().to_string()));
        assert!(message.contains("config.json"));
    }

    #[test]
    fn saving_into_the_source_directory_is_a_no_op() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_model_dir(dir.path(), true);
        let files = ModelFiles::from_dir(dir.path()).expect("loads");
        files.save_to(dir.path()).expect("no self-copy");
    }
}
