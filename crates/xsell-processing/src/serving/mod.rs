//! Serving boundary.
//!
//! HTTP routing and page rendering live outside this crate. What lives here
//! is the data contract a front-end needs: the accepted record shapes, the
//! model seam and the verdict strings. The model handle is built once at
//! startup and passed in; there is no process-wide model.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xsell_processing::serving::{LogisticModel, PredictionService, SchemaVersion};
//! use xsell_processing::EncodingScheme;
//!
//! let scheme = Arc::new(EncodingScheme::load("scheme.json")?);
//! let model = Arc::new(LogisticModel::load("model.json")?);
//! let service = PredictionService::new(SchemaVersion::Reduced, scheme, model)?;
//! let body = service.respond_json(request_body);
//! ```

mod model;
mod record;
mod service;

pub use model::{ConstantPredictor, LogisticModel, Predictor};
pub use record::{CustomerRecord, FULL_FIELDS, REDUCED_FIELDS, SchemaVersion};
pub use service::{PredictionResponse, PredictionService, Verdict};
