//! Record → feature vector → model → verdict.

use crate::encoder::EncodingScheme;
use crate::error::{PreprocessingError, Result};
use crate::serving::model::Predictor;
use crate::serving::record::{CustomerRecord, SchemaVersion};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Human-readable model outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Interested,
    NotInterested,
}

impl Verdict {
    /// Map a model label: 1 → interested, 0 → not interested.
    pub fn from_label(label: u8) -> Result<Self> {
        match label {
            1 => Ok(Verdict::Interested),
            0 => Ok(Verdict::NotInterested),
            other => Err(PreprocessingError::TypeCoercion {
                column: "prediction".to_string(),
                value: other.to_string(),
                target_type: "binary label".to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Interested => "Customer is interested",
            Verdict::NotInterested => "Customer is not interested",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body returned to an API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    Prediction { prediction: String },
    Error { error: String, code: String },
}

/// Serving-side prediction: one record in, one verdict out.
///
/// Holds the deployed schema version, the encoding scheme fitted at training
/// time and the model handle. All three are immutable, so a single service can
/// be shared by every request handler.
#[derive(Clone)]
pub struct PredictionService {
    schema: SchemaVersion,
    scheme: Arc<EncodingScheme>,
    model: Arc<dyn Predictor>,
}

static_assertions::assert_impl_all!(PredictionService: Send, Sync);

impl PredictionService {
    /// Wire a scheme and a model together for `schema`.
    ///
    /// Fails with [`PreprocessingError::SchemaMismatch`] when the scheme needs
    /// raw columns outside the schema, or when the model records a feature
    /// order different from the scheme's.
    pub fn new(
        schema: SchemaVersion,
        scheme: Arc<EncodingScheme>,
        model: Arc<dyn Predictor>,
    ) -> Result<Self> {
        let fields = schema.fields();
        for source in scheme.source_columns() {
            if !fields.contains(&source) {
                return Err(PreprocessingError::SchemaMismatch {
                    expected: schema.to_string(),
                    found: format!("scheme column '{}'", source),
                });
            }
        }

        if let Some(names) = model.feature_names() {
            let expected = scheme.feature_names();
            if names != expected.as_slice() {
                return Err(PreprocessingError::SchemaMismatch {
                    expected: format!("{:?}", expected),
                    found: format!("{:?}", names),
                });
            }
        }

        Ok(Self {
            schema,
            scheme,
            model,
        })
    }

    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    /// The ordered vector the model receives for `record`.
    pub fn feature_vector(&self, record: &CustomerRecord) -> Result<Vec<f64>> {
        record.validate(self.schema)?;
        let frame = record.to_frame()?;
        let matrix = self.scheme.transform(&frame)?;
        matrix.feature_row(0)
    }

    pub fn predict(&self, record: &CustomerRecord) -> Result<Verdict> {
        let features = self.feature_vector(record)?;
        let label = self.model.predict(&features)?;
        debug!("Model returned {} for {:?}", label, features);
        Verdict::from_label(label)
    }

    /// Predict from a JSON request body.
    pub fn predict_json(&self, body: &str) -> Result<Verdict> {
        let record: CustomerRecord = serde_json::from_str(body)?;
        self.predict(&record)
    }

    /// Predict from form fields.
    pub fn predict_form(&self, form: &HashMap<String, String>) -> Result<Verdict> {
        let record = CustomerRecord::from_form(form, self.schema)?;
        self.predict(&record)
    }

    /// Answer a JSON request. Failures become a generic error body.
    ///
    /// Bad requests are logged at debug level; anything else points at the
    /// deployment and is logged as a warning.
    pub fn respond_json(&self, body: &str) -> PredictionResponse {
        match self.predict_json(body) {
            Ok(verdict) => PredictionResponse::Prediction {
                prediction: verdict.to_string(),
            },
            Err(e) => {
                if e.is_input_error() {
                    debug!("Rejected prediction request: {}", e);
                } else {
                    warn!("Prediction failed: {}", e);
                }
                PredictionResponse::Error {
                    error: "Prediction failed".to_string(),
                    code: e.error_code().to_string(),
                }
            }
        }
    }
}
