use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::hf::ModelError;

/// Class index → label mapping taken from a model's `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    labels: BTreeMap<usize, String>,
}

#[derive(Debug, Deserialize)]
struct LabelConfig {
    #[serde(default)]
    id2label: BTreeMap<String, String>,
}

impl LabelTable {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        Self {
            labels: labels
                .into_iter()
                .map(|(id, label)| (id, label.into()))
                .collect(),
        }
    }

    pub fn from_config_json(model: &str, raw: &str) -> Result<Self, ModelError> {
        let config: LabelConfig = serde_json::from_str(raw).map_err(|err| ModelError::Load {
            model: model.to_string(),
            reason: format!("invalid config.json: {err}"),
        })?;

        let mut labels = BTreeMap::new();
        for (id, label) in config.id2label {
            let id = id.parse::<usize>().map_err(|_| ModelError::Load {
                model: model.to_string(),
                reason: format!("id2label key '{id}' is not a class index"),
            })?;
            labels.insert(id, label);
        }
        Ok(Self { labels })
    }

    pub fn from_config_file(model: &str, path: &Path) -> Result<Self, ModelError> {
        let raw = fs::read_to_string(path).map_err(|err| ModelError::Load {
            model: model.to_string(),
            reason: format!("{}: {err}", path.display()),
        })?;
        Self::from_config_json(model, &raw)
    }

    /// Unnamed classes get the `LABEL_<n>` name transformers assigns.
    pub fn label(&self, class_id: usize) -> String {
        self.labels
            .get(&class_id)
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{class_id}"))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Raw classifier output for one input.
#[derive(Debug, Clone, PartialEq)]
pub struct Logits {
    pub input_ids: Vec<u32>,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub class_id: usize,
    pub label: String,
    pub score: f32,
}

pub trait SequenceClassifier {
    fn labels(&self) -> &LabelTable;

    fn logits(&self, text: &str) -> Result<Logits, ModelError>;

    fn classify(&self, text: &str) -> Result<(Logits, Prediction), ModelError> {
        let logits = self.logits(text)?;
        let prediction = predict(&logits.values, self.labels()).ok_or_else(|| {
            ModelError::Inference {
                model: "classifier".to_string(),
                reason: "model returned no logits".to_string(),
            }
        })?;
        Ok((logits, prediction))
    }
}

/// Picks the highest logit. Scores are softmax probabilities, or a sigmoid
/// for single-logit heads.
pub fn predict(logits: &[f32], labels: &LabelTable) -> Option<Prediction> {
    let (class_id, &best) = logits
        .iter()
        .enumerate()
        .max_by(|(left_id, left), (right_id, right)| {
            left.total_cmp(right).then(right_id.cmp(left_id))
        })?;

    let score = if logits.len() == 1 {
        1.0 / (1.0 + (-best).exp())
    } else {
        let total: f32 = logits.iter().map(|value| (value - best).exp()).sum();
        1.0 / total
    };

    Some(Prediction {
        class_id,
        label: labels.label(class_id),
        score,
    })
}

#[cfg(feature = "local-inference")]
pub use local::LocalClassifier;

#[cfg(feature = "local-inference")]
mod local {
    use candle_core::{DType, Device, IndexOp, Module, Tensor};
    use candle_nn::{Linear, VarBuilder, linear};
    use candle_transformers::models::{bert, distilbert};
    use serde::Deserialize;
    use tracing::{debug, info};

    use super::{LabelTable, Logits, SequenceClassifier};
    use crate::hf::ModelError;
    use crate::hf::hub::ModelFiles;
    use crate::hf::tokenizer::TextTokenizer;

    #[derive(Debug, Deserialize)]
    struct Architecture {
        model_type: String,
        dim: Option<usize>,
        hidden_size: Option<usize>,
    }

    impl Architecture {
        fn width(&self) -> Option<usize> {
            self.dim.or(self.hidden_size)
        }
    }

    enum Head {
        DistilBert {
            model: distilbert::DistilBertModel,
            pre_classifier: Linear,
            classifier: Linear,
        },
        Bert {
            model: bert::BertModel,
            pooler: Linear,
            classifier: Linear,
        },
    }

    /// DistilBERT or BERT with a sequence-classification head, run on candle.
    pub struct LocalClassifier {
        name: String,
        tokenizer: TextTokenizer,
        labels: LabelTable,
        head: Head,
        device: Device,
    }

    impl LocalClassifier {
        pub fn load(files: &ModelFiles) -> Result<Self, ModelError> {
            let name = files.origin.clone();
            let load_err = |reason: String| ModelError::Load {
                model: name.clone(),
                reason,
            };

            let raw = std::fs::read_to_string(&files.config)
                .map_err(|err| load_err(err.to_string()))?;
            let labels = LabelTable::from_config_json(&name, &raw)?;
            let num_labels = labels.len().max(1);
            let architecture: Architecture =
                serde_json::from_str(&raw).map_err(|err| load_err(err.to_string()))?;

            let weights = files
                .weights
                .as_ref()
                .ok_or_else(|| load_err("no weight file".to_string()))?;
            let device = Device::cuda_if_available(0).map_err(|err| load_err(err.to_string()))?;
            let vb = if weights.extension().is_some_and(|ext| ext == "safetensors") {
                // SAFETY: the file is not modified while mapped.
                unsafe {
                    VarBuilder::from_mmaped_safetensors(&[weights.as_path()], DType::F32, &device)
                }
            } else {
                VarBuilder::from_pth(weights, DType::F32, &device)
            }
            .map_err(|err| load_err(err.to_string()))?;

            let width = architecture
                .width()
                .ok_or_else(|| load_err("config.json has no hidden size".to_string()))?;
            let head = match architecture.model_type.as_str() {
                "distilbert" => {
                    let config: distilbert::Config =
                        serde_json::from_str(&raw).map_err(|err| load_err(err.to_string()))?;
                    Head::DistilBert {
                        model: distilbert::DistilBertModel::load(vb.clone(), &config)
                            .map_err(|err| load_err(err.to_string()))?,
                        pre_classifier: linear(width, width, vb.pp("pre_classifier"))
                            .map_err(|err| load_err(err.to_string()))?,
                        classifier: linear(width, num_labels, vb.pp("classifier"))
                            .map_err(|err| load_err(err.to_string()))?,
                    }
                }
                "bert" => {
                    let config: bert::Config =
                        serde_json::from_str(&raw).map_err(|err| load_err(err.to_string()))?;
                    let pooler = linear(width, width, vb.pp("bert.pooler.dense"))
                        .or_else(|_| linear(width, width, vb.pp("pooler.dense")))
                        .map_err(|err| load_err(err.to_string()))?;
                    Head::Bert {
                        model: bert::BertModel::load(vb.clone(), &config)
                            .map_err(|err| load_err(err.to_string()))?,
                        pooler,
                        classifier: linear(width, num_labels, vb.pp("classifier"))
                            .map_err(|err| load_err(err.to_string()))?,
                    }
                }
                other => {
                    return Err(load_err(format!(
                        "unsupported model_type '{other}' (expected distilbert or bert)"
                    )));
                }
            };

            let tokenizer = TextTokenizer::from_files(files)?;
            info!(model = %name, model_type = %architecture.model_type, "loaded classifier");
            Ok(Self {
                name,
                tokenizer,
                labels,
                head,
                device,
            })
        }

        fn forward(&self, encoding: &tokenizers::Encoding) -> candle_core::Result<Vec<f32>> {
            let ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
            let logits = match &self.head {
                Head::DistilBert {
                    model,
                    pre_classifier,
                    classifier,
                } => {
                    let len = encoding.get_ids().len();
                    let mask = Tensor::zeros((len, len), DType::U8, &self.device)?;
                    let hidden = model.forward(&ids, &mask)?;
                    let cls = hidden.i((.., 0))?;
                    let pooled = pre_classifier.forward(&cls)?.relu()?;
                    classifier.forward(&pooled)?
                }
                Head::Bert {
                    model,
                    pooler,
                    classifier,
                } => {
                    let type_ids =
                        Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
                    let mask =
                        Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;
                    let hidden = model.forward(&ids, &type_ids, Some(&mask))?;
                    let cls = hidden.i((.., 0))?;
                    let pooled = pooler.forward(&cls)?.tanh()?;
                    classifier.forward(&pooled)?
                }
            };
            logits.squeeze(0)?.to_dtype(DType::F32)?.to_vec1::<f32>()
        }
    }

    impl SequenceClassifier for LocalClassifier {
        fn labels(&self) -> &LabelTable {
            &self.labels
        }

        fn logits(&self, text: &str) -> Result<Logits, ModelError> {
            let encoding = self.tokenizer.encode(text)?;
            let values = self.forward(&encoding).map_err(|err| ModelError::Inference {
                model: self.name.clone(),
                reason: err.to_string(),
            })?;
            debug!(model = %self.name, ?values, "computed logits");
            Ok(Logits {
                input_ids: encoding.get_ids().to_vec(),
                values,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sst2_labels() -> LabelTable {
        LabelTable::new([(0, "POSITIVE"), (1, "NEGATIVE")])
    }

    #[test]
    fn argmax_selects_the_label_from_the_table() {
        let prediction = predict(&[2.0, -1.0], &sst2_labels()).expect("non-empty logits");
        assert_eq!(prediction.class_id, 0);
        assert_eq!(prediction.label, "POSITIVE");
        assert!((prediction.score - 0.952_574).abs() < 1e-4);
    }

    #[test]
    fn single_logit_heads_use_a_sigmoid() {
        let prediction = predict(&[0.0], &LabelTable::default()).expect("one logit");
        assert_eq!(prediction.label, "LABEL_0");
        assert!((prediction.score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn empty_logits_predict_nothing() {
        assert!(predict(&[], &sst2_labels()).is_none());
    }

    #[test]
    fn labels_are_read_from_config_json() {
        let table = LabelTable::from_config_json(
            "sst2",
            r#"{"model_type":"distilbert","id2label":{"0":"NEGATIVE","1":"POSITIVE"}}"#,
        )
        .expect("valid config");
        assert_eq!(table.label(1), "POSITIVE");
        assert_eq!(table.label(7), "LABEL_7");
    }

    #[test]
    fn non_numeric_label_keys_are_rejected() {
        let err = LabelTable::from_config_json("broken", r#"{"id2label":{"zero":"A"}}"#)
            .expect_err("bad key");
        assert!(err.to_string().contains("'broken'"));
    }

    struct FixedClassifier {
        labels: LabelTable,
    }

    impl SequenceClassifier for FixedClassifier {
        fn labels(&self) -> &LabelTable {
            &self.labels
        }

        fn logits(&self, _text: &str) -> Result<Logits, ModelError> {
            Ok(Logits {
                input_ids: vec![101, 2023, 102],
                values: vec![2.0, -1.0],
            })
        }
    }

    #[test]
    fn classify_returns_logits_and_prediction() {
        let classifier = FixedClassifier {
            labels: sst2_labels(),
        };
        let (logits, prediction) = classifier.classify("great movie").expect("classifies");
        assert_eq!(logits.input_ids, vec![101, 2023, 102]);
        assert_eq!(prediction.label, "POSITIVE");
    }
}
