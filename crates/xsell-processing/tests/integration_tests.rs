//! Integration tests for the cross-sell preprocessing library.
//!
//! These tests run the public API end to end over CSV fixtures shaped like
//! the insurance training data.

use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use xsell_processing::{
    ConstantPredictor, CustomerRecord, EncodingScheme, LogisticModel, PredictionResponse,
    PredictionService, PreprocessingError, ProfileDetail, SchemaVersion, Verdict,
    find_best_f1_threshold, get_config, initial_check, move_target_to_last_frame, preprocess,
    preprocess_with_scheme,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_csv(filename: &str) -> DataFrame {
    let path = fixtures_path().join(filename);
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

const REDUCED_TRAINING_COLUMNS: [&str; 8] = [
    "id",
    "Gender",
    "Age",
    "Driving_License",
    "Previously_Insured",
    "Vehicle_Age",
    "Vehicle_Damage",
    "Response",
];

fn reduced_scheme() -> Arc<EncodingScheme> {
    let df = load_csv("insurance_sample.csv")
        .select(REDUCED_TRAINING_COLUMNS)
        .unwrap();
    Arc::new(EncodingScheme::fit(&df, &get_config().unwrap()).unwrap())
}

fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect()
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_get_config_reads_shipped_file() {
    let config = get_config().unwrap();
    assert_eq!(config.id_column, "id");
    assert_eq!(
        config.categorical_cols,
        vec!["Gender", "Vehicle_Age", "Vehicle_Damage"]
    );
    assert_eq!(config.target_col, "Response");
    assert_eq!(get_config().unwrap(), config);
}

// ============================================================================
// Profiling
// ============================================================================

#[test]
fn test_profile_insurance_sample() {
    let df = load_csv("insurance_sample.csv");
    let table = initial_check(&df).unwrap();

    assert_eq!(table.len(), 12);

    let gender = table.get("Gender").unwrap();
    assert_eq!(gender.null_count, 0);
    assert_eq!(gender.unique_count, 2);
    assert_eq!(gender.detail, ProfileDetail::Text { empty_count: 0 });

    let age = table.get("Age").unwrap();
    assert_eq!(
        age.detail,
        ProfileDetail::Numeric {
            min: Some(21.0),
            max: Some(76.0)
        }
    );

    let rendered = table.to_dataframe().unwrap();
    assert_eq!(rendered.height(), 12);
    assert_eq!(
        names(&rendered),
        vec![
            "Column",
            "Type",
            "Null Count",
            "Unique Count",
            "Min",
            "Max",
            "Empty String Count"
        ]
    );
}

// ============================================================================
// Preprocessing
// ============================================================================

#[test]
fn test_preprocess_full_dataset_layout() {
    let df = load_csv("insurance_sample.csv");
    let matrix = preprocess(df, &get_config().unwrap()).unwrap();

    assert_eq!(matrix.height(), 12);
    assert_eq!(
        matrix.column_names(),
        vec![
            "Age",
            "Driving_License",
            "Region_Code",
            "Previously_Insured",
            "Annual_Premium",
            "Policy_Sales_Channel",
            "Vintage",
            "Gender",
            "Vehicle_Age_1-2 Year",
            "Vehicle_Age_< 1 Year",
            "Vehicle_Age_> 2 Years",
            "Vehicle_Damage",
            "Response",
        ]
    );
    assert_eq!(matrix.target_column.as_deref(), Some("Response"));

    let index = matrix.index.as_ref().unwrap();
    assert_eq!(index.name().as_str(), "id");
    assert_eq!(index.len(), 12);
}

#[test]
fn test_preprocess_narrowed_dtypes() {
    let df = load_csv("insurance_sample.csv");
    let matrix = preprocess(df, &get_config().unwrap()).unwrap();
    let features = &matrix.features;

    for name in [
        "Gender",
        "Age",
        "Driving_License",
        "Region_Code",
        "Previously_Insured",
        "Vehicle_Damage",
        "Vehicle_Age_< 1 Year",
        "Response",
    ] {
        assert_eq!(features.column(name).unwrap().dtype(), &DataType::Int8, "{}", name);
    }
    assert_eq!(features.column("Annual_Premium").unwrap().dtype(), &DataType::Int32);
    assert_eq!(
        features.column("Policy_Sales_Channel").unwrap().dtype(),
        &DataType::Int16
    );
    assert_eq!(features.column("Vintage").unwrap().dtype(), &DataType::Int16);

    let premiums: Vec<Option<i32>> = features
        .column("Annual_Premium")
        .unwrap()
        .i32()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(premiums[0], Some(40454));
    assert_eq!(premiums[5], Some(2630));
}

#[test]
fn test_preprocess_binary_and_one_hot_values() {
    let df = load_csv("insurance_sample.csv");
    let matrix = preprocess(df, &get_config().unwrap()).unwrap();
    let features = &matrix.features;

    // Male (7 of 12) is the majority value
    let gender: Vec<Option<i8>> = features
        .column("Gender")
        .unwrap()
        .i8()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(gender[0], Some(1));
    assert_eq!(gender[4], Some(0));

    // Yes and No tie 6/6; Yes is seen first
    let damage: Vec<Option<i8>> = features
        .column("Vehicle_Damage")
        .unwrap()
        .i8()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(damage[0], Some(1));
    assert_eq!(damage[1], Some(0));

    // exactly one indicator per row
    for row in 0..matrix.height() {
        let hot: i64 = [
            "Vehicle_Age_1-2 Year",
            "Vehicle_Age_< 1 Year",
            "Vehicle_Age_> 2 Years",
        ]
        .iter()
        .map(|name| {
            features
                .column(name)
                .unwrap()
                .i8()
                .unwrap()
                .get(row)
                .unwrap() as i64
        })
        .sum();
        assert_eq!(hot, 1, "row {}", row);
    }
}

#[test]
fn test_preprocess_target_moved_last() {
    let df = load_csv("insurance_sample.csv");
    let reordered = df
        .select([
            "Response", "id", "Gender", "Age", "Driving_License", "Previously_Insured",
            "Vehicle_Age", "Vehicle_Damage",
        ])
        .unwrap();

    let relocated = move_target_to_last_frame(reordered.clone(), "Response").unwrap();
    assert_eq!(names(&relocated).last().map(String::as_str), Some("Response"));
    assert!(
        move_target_to_last_frame(relocated.clone(), "Response")
            .unwrap()
            .equals(&relocated)
    );

    let matrix = preprocess(reordered, &get_config().unwrap()).unwrap();
    assert_eq!(
        matrix.column_names().last().map(String::as_str),
        Some("Response")
    );
}

#[test]
fn test_preprocess_missing_categorical_column() {
    let df = load_csv("insurance_sample.csv").drop("Vehicle_Age").unwrap();
    let err = preprocess(df, &get_config().unwrap()).unwrap_err();
    assert!(matches!(err, PreprocessingError::ColumnNotFound(ref c) if c == "Vehicle_Age"));
}

#[test]
fn test_scheme_save_and_replay() {
    let df = load_csv("insurance_sample.csv");
    let (matrix, scheme) = preprocess_with_scheme(df.clone(), &get_config().unwrap()).unwrap();

    let path = std::env::temp_dir().join(format!("xsell-scheme-{}.json", std::process::id()));
    scheme.save(&path).unwrap();
    let loaded = EncodingScheme::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded, scheme);

    // scoring batch without the target replays the same features
    let unlabelled = df.drop("Response").unwrap();
    let replayed = loaded.transform(&unlabelled).unwrap();
    assert!(replayed.target_column.is_none());
    assert!(replayed.features.equals(&matrix.feature_frame().unwrap()));
}

#[test]
fn test_unseen_category_at_transform() {
    let scheme = reduced_scheme();
    let df = df!(
        "Gender" => &["Male"],
        "Age" => &[30i64],
        "Driving_License" => &[1i64],
        "Previously_Insured" => &[0i64],
        "Vehicle_Age" => &["new"],
        "Vehicle_Damage" => &["Yes"],
    )
    .unwrap();
    let err = scheme.transform(&df).unwrap_err();
    assert_eq!(err.error_code(), "UNKNOWN_CATEGORY");
}

// ============================================================================
// Threshold Search
// ============================================================================

#[test]
fn test_threshold_from_validation_scores() {
    let df = load_csv("validation_scores.csv");
    let labels: Vec<u8> = df
        .column("Response")
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap() as u8)
        .collect();
    let probs: Vec<f64> = df
        .column("probability")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap())
        .collect();

    let best = find_best_f1_threshold(&labels, &probs).unwrap();
    assert_eq!(best.score, 1.0);
    assert!((best.threshold - 0.48).abs() < 1e-9, "got {}", best.threshold);

    let again = find_best_f1_threshold(&labels, &probs).unwrap();
    assert_eq!(again, best);
}

// ============================================================================
// Serving
// ============================================================================

#[test]
fn test_end_to_end_reduced_record() {
    let scheme = reduced_scheme();
    let service = PredictionService::new(
        SchemaVersion::Reduced,
        scheme,
        Arc::new(ConstantPredictor::new(1)),
    )
    .unwrap();

    let record = CustomerRecord {
        gender: "Male".to_string(),
        age: 30,
        driving_license: 1,
        region_code: None,
        previously_insured: 0,
        vehicle_age: "1-2 Year".to_string(),
        vehicle_damage: "Yes".to_string(),
        annual_premium: None,
        policy_sales_channel: None,
        vintage: None,
    };

    // Age, Driving_License, Previously_Insured, then Gender, the Vehicle_Age
    // indicators in sorted category order and Vehicle_Damage
    assert_eq!(
        service.feature_vector(&record).unwrap(),
        vec![30.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0]
    );

    let verdict = service.predict(&record).unwrap();
    assert_eq!(verdict, Verdict::Interested);
    assert_eq!(verdict.to_string(), "Customer is interested");
}

#[test]
fn test_end_to_end_full_form() {
    let df = load_csv("insurance_sample.csv");
    let scheme = Arc::new(EncodingScheme::fit(&df, &get_config().unwrap()).unwrap());
    let service = PredictionService::new(
        SchemaVersion::Full,
        scheme,
        Arc::new(ConstantPredictor::new(0)),
    )
    .unwrap();

    let form: HashMap<String, String> = [
        ("Gender", "Female"),
        ("Age", "56"),
        ("Driving_License", "1"),
        ("Region_Code", "28.0"),
        ("Previously_Insured", "0"),
        ("Vehicle_Age", "1-2 Year"),
        ("Vehicle_Damage", "Yes"),
        ("Annual_Premium", "32031"),
        ("Policy_Sales_Channel", "26"),
        ("Vintage", "72"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let record = CustomerRecord::from_form(&form, SchemaVersion::Full).unwrap();
    assert_eq!(
        service.feature_vector(&record).unwrap(),
        vec![56.0, 1.0, 28.0, 0.0, 32031.0, 26.0, 72.0, 0.0, 1.0, 0.0, 0.0, 1.0]
    );
    assert_eq!(service.predict_form(&form).unwrap(), Verdict::NotInterested);
}

#[test]
fn test_logistic_model_serving() {
    let scheme = reduced_scheme();
    let feature_names = scheme.feature_names();
    let mut weights = vec![0.0; feature_names.len()];
    let damage = feature_names
        .iter()
        .position(|n| n == "Vehicle_Damage")
        .unwrap();
    weights[damage] = 4.0;

    let model = LogisticModel {
        feature_names,
        weights,
        intercept: -2.0,
        threshold: 0.5,
    };
    let service =
        PredictionService::new(SchemaVersion::Reduced, scheme, Arc::new(model)).unwrap();

    let damaged = r#"{"Gender":"Female","Age":41,"Driving_License":1,"Previously_Insured":0,
                      "Vehicle_Age":"> 2 Years","Vehicle_Damage":"Yes"}"#;
    let undamaged = r#"{"Gender":"Female","Age":41,"Driving_License":1,"Previously_Insured":0,
                        "Vehicle_Age":"> 2 Years","Vehicle_Damage":"No"}"#;

    assert_eq!(
        service.respond_json(damaged),
        PredictionResponse::Prediction {
            prediction: "Customer is interested".to_string()
        }
    );
    assert_eq!(
        service.respond_json(undamaged),
        PredictionResponse::Prediction {
            prediction: "Customer is not interested".to_string()
        }
    );
}

#[test]
fn test_service_shared_across_threads() {
    let service = Arc::new(
        PredictionService::new(
            SchemaVersion::Reduced,
            reduced_scheme(),
            Arc::new(ConstantPredictor::new(1)),
        )
        .unwrap(),
    );
    let body = r#"{"Gender":"Male","Age":30,"Driving_License":1,"Previously_Insured":0,
                   "Vehicle_Age":"1-2 Year","Vehicle_Damage":"Yes"}"#;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || service.predict_json(body).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Verdict::Interested);
    }
}
