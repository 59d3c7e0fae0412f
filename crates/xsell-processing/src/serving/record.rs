//! The single customer record accepted at the serving boundary.

use crate::error::{PreprocessingError, Result};
use crate::utils::{parse_integer_string, parse_numeric_string};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Fields of the reduced (6-field) serving schema, in vector order.
pub const REDUCED_FIELDS: [&str; 6] = [
    "Gender",
    "Age",
    "Driving_License",
    "Previously_Insured",
    "Vehicle_Age",
    "Vehicle_Damage",
];

/// Fields of the full (10-field) serving schema, in vector order.
pub const FULL_FIELDS: [&str; 10] = [
    "Gender",
    "Age",
    "Driving_License",
    "Region_Code",
    "Previously_Insured",
    "Vehicle_Age",
    "Vehicle_Damage",
    "Annual_Premium",
    "Policy_Sales_Channel",
    "Vintage",
];

/// Which field set a deployed model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Gender, Age, Driving_License, Previously_Insured, Vehicle_Age, Vehicle_Damage.
    #[default]
    Reduced,
    /// Reduced plus Region_Code, Annual_Premium, Policy_Sales_Channel, Vintage.
    Full,
}

impl SchemaVersion {
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            SchemaVersion::Reduced => &REDUCED_FIELDS,
            SchemaVersion::Full => &FULL_FIELDS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchemaVersion::Reduced => "reduced",
            SchemaVersion::Full => "full",
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} fields)", self.as_str(), self.fields().len())
    }
}

/// One customer as submitted to the API or the web form.
///
/// JSON field names match the raw dataset columns exactly. The four full
/// schema fields are optional; [`CustomerRecord::validate`] checks them
/// against the deployed [`SchemaVersion`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerRecord {
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Age")]
    pub age: i64,
    #[serde(rename = "Driving_License")]
    pub driving_license: i64,
    #[serde(rename = "Region_Code", default, skip_serializing_if = "Option::is_none")]
    pub region_code: Option<i64>,
    #[serde(rename = "Previously_Insured")]
    pub previously_insured: i64,
    #[serde(rename = "Vehicle_Age")]
    pub vehicle_age: String,
    #[serde(rename = "Vehicle_Damage")]
    pub vehicle_damage: String,
    #[serde(rename = "Annual_Premium", default, skip_serializing_if = "Option::is_none")]
    pub annual_premium: Option<f64>,
    #[serde(
        rename = "Policy_Sales_Channel",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub policy_sales_channel: Option<i64>,
    #[serde(rename = "Vintage", default, skip_serializing_if = "Option::is_none")]
    pub vintage: Option<i64>,
}

impl CustomerRecord {
    /// Parse a form submission. Every value arrives as a string.
    ///
    /// Keys outside `schema` are ignored (forms carry buttons and tokens).
    pub fn from_form(form: &HashMap<String, String>, schema: SchemaVersion) -> Result<Self> {
        let full = schema == SchemaVersion::Full;
        let record = CustomerRecord {
            gender: text_field(form, "Gender")?,
            age: int_field(form, "Age")?,
            driving_license: int_field(form, "Driving_License")?,
            region_code: full.then(|| int_field(form, "Region_Code")).transpose()?,
            previously_insured: int_field(form, "Previously_Insured")?,
            vehicle_age: text_field(form, "Vehicle_Age")?,
            vehicle_damage: text_field(form, "Vehicle_Damage")?,
            annual_premium: full.then(|| float_field(form, "Annual_Premium")).transpose()?,
            policy_sales_channel: full
                .then(|| int_field(form, "Policy_Sales_Channel"))
                .transpose()?,
            vintage: full.then(|| int_field(form, "Vintage")).transpose()?,
        };
        record.validate(schema)?;
        Ok(record)
    }

    /// Check that the record carries exactly the fields of `schema`.
    pub fn validate(&self, schema: SchemaVersion) -> Result<()> {
        let extended = [
            ("Region_Code", self.region_code.is_some()),
            ("Annual_Premium", self.annual_premium.is_some()),
            ("Policy_Sales_Channel", self.policy_sales_channel.is_some()),
            ("Vintage", self.vintage.is_some()),
        ];

        for (field, present) in extended {
            match (schema, present) {
                (SchemaVersion::Reduced, true) => {
                    return Err(PreprocessingError::SchemaMismatch {
                        expected: schema.to_string(),
                        found: format!("extra field '{}'", field),
                    });
                }
                (SchemaVersion::Full, false) => {
                    return Err(PreprocessingError::ColumnNotFound(field.to_string()));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// One-row frame with the raw columns, in [`FULL_FIELDS`] order.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut columns = vec![
            Column::new("Gender".into(), [self.gender.as_str()]),
            Column::new("Age".into(), [self.age]),
            Column::new("Driving_License".into(), [self.driving_license]),
        ];
        if let Some(region) = self.region_code {
            columns.push(Column::new("Region_Code".into(), [region]));
        }
        columns.push(Column::new(
            "Previously_Insured".into(),
            [self.previously_insured],
        ));
        columns.push(Column::new("Vehicle_Age".into(), [self.vehicle_age.as_str()]));
        columns.push(Column::new(
            "Vehicle_Damage".into(),
            [self.vehicle_damage.as_str()],
        ));
        if let Some(premium) = self.annual_premium {
            columns.push(Column::new("Annual_Premium".into(), [premium]));
        }
        if let Some(channel) = self.policy_sales_channel {
            columns.push(Column::new("Policy_Sales_Channel".into(), [channel]));
        }
        if let Some(vintage) = self.vintage {
            columns.push(Column::new("Vintage".into(), [vintage]));
        }

        Ok(DataFrame::new(columns)?)
    }
}

fn text_field(form: &HashMap<String, String>, name: &str) -> Result<String> {
    form.get(name)
        .map(|v| v.trim().to_string())
        .ok_or_else(|| PreprocessingError::ColumnNotFound(name.to_string()))
}

fn int_field(form: &HashMap<String, String>, name: &str) -> Result<i64> {
    let raw = text_field(form, name)?;
    parse_integer_string(&raw).ok_or_else(|| PreprocessingError::TypeCoercion {
        column: name.to_string(),
        value: raw,
        target_type: "integer".to_string(),
    })
}

fn float_field(form: &HashMap<String, String>, name: &str) -> Result<f64> {
    let raw = text_field(form, name)?;
    parse_numeric_string(&raw).ok_or_else(|| PreprocessingError::TypeCoercion {
        column: name.to_string(),
        value: raw,
        target_type: "number".to_string(),
    })
}
