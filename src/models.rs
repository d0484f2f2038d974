use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

// ============ Database Models ============

/// One row of the entries table, mapped by column name.
///
/// `accepted` and `completed` default to `None` when a statement does not
/// select them.
#[derive(Debug, Clone, FromRow)]
pub struct EntryRow {
    pub address: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub eligibility_type: Option<String>,
    /// Serialized JSON sequence.
    pub income_details: Option<String>,
    /// Selected as `float8`.
    pub total_income: Option<f64>,
    pub benefit_description: Option<String>,
    /// Selected through `to_jsonb`, whatever the column type.
    pub benefit_images: Option<Value>,
    /// Serialized JSON sequence, written from the request's `qualifications`.
    pub what_we_can_do: Option<String>,
    #[sqlx(default)]
    pub accepted: Option<bool>,
    #[sqlx(default)]
    pub completed: Option<bool>,
}

/// Which serialized JSON text columns a response decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoding {
    /// Return both columns exactly as stored.
    Raw,
    /// Decode `income_details` only.
    IncomeDetails,
    /// Decode `income_details` and `what_we_can_do`.
    All,
}

impl EntryRow {
    pub fn into_view(self, decoding: Decoding) -> EntryView {
        let (decode_income, decode_qualifications) = match decoding {
            Decoding::Raw => (false, false),
            Decoding::IncomeDetails => (true, false),
            Decoding::All => (true, true),
        };

        EntryView {
            address: self.address,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            email: self.email,
            eligibility_type: self.eligibility_type,
            income_details: self
                .income_details
                .map(|text| JsonTextField::from_column(text, decode_income)),
            total_income: self.total_income.and_then(finite_income),
            benefit_description: self.benefit_description,
            benefit_images: self.benefit_images,
            what_we_can_do: self
                .what_we_can_do
                .map(|text| JsonTextField::from_column(text, decode_qualifications)),
            accepted: self.accepted,
            completed: self.completed,
        }
    }
}

/// A TEXT column holding JSON, either decoded or left as the stored text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JsonTextField {
    Decoded(Value),
    Raw(String),
}

impl JsonTextField {
    /// Parses `text` as JSON, keeping the original text when it does not parse.
    pub fn decode(text: String) -> Self {
        if text.is_empty() {
            return JsonTextField::Raw(text);
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => JsonTextField::Decoded(value),
            Err(e) => {
                tracing::debug!("Keeping undecodable JSON text column as-is: {}", e);
                JsonTextField::Raw(text)
            }
        }
    }

    fn from_column(text: String, decode: bool) -> Self {
        if decode {
            Self::decode(text)
        } else {
            JsonTextField::Raw(text)
        }
    }
}

/// Keeps `total_income` only when JSON can carry it as a number.
pub fn finite_income(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        tracing::warn!("total_income {} has no JSON number form, returning null", value);
        None
    }
}

// ============ API Response Models ============

/// Entry as returned to clients. Keys are the table's column names.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EntryView {
    pub address: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub eligibility_type: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub income_details: Option<JsonTextField>,
    pub total_income: Option<f64>,
    pub benefit_description: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub benefit_images: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub what_we_can_do: Option<JsonTextField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub message: String,
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchesResponse {
    pub matches: Vec<EntryView>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QualifiedEntriesResponse {
    pub qualified_entries: Vec<EntryView>,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// ============ API Request Models ============

/// Documents the query string; handlers read it as ordered pairs.
#[derive(Debug, Clone, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StreetQuery {
    /// Fragment matched case-insensitively anywhere in the address.
    pub street: Option<String>,
}

/// Documents the query string; handlers read it as ordered pairs.
#[derive(Debug, Clone, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AddressQuery {
    /// Exact address of the entry.
    pub address: Option<String>,
}

/// Intake form submission. Every field is optional.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitRequest {
    pub address: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub eligibility_type: Option<String>,
    #[serde(default = "empty_sequence")]
    #[schema(value_type = Object)]
    pub income_details: Value,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    #[schema(value_type = Option<f64>)]
    pub total_income: Option<BigDecimal>,
    pub benefit_description: Option<String>,
    #[schema(value_type = Option<Vec<String>>)]
    pub benefit_images: Option<BenefitImages>,
    #[serde(default = "empty_sequence")]
    #[schema(value_type = Object)]
    pub qualifications: Value,
}

impl SubmitRequest {
    pub fn income_details_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.income_details)
    }

    pub fn qualifications_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.qualifications)
    }
}

fn empty_sequence() -> Value {
    Value::Array(Vec::new())
}

/// `benefit_images` arrives either as one string or as a list of strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BenefitImages {
    One(String),
    Many(Vec<String>),
}

impl BenefitImages {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            BenefitImages::One(image) => vec![image],
            BenefitImages::Many(images) => images,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalInput {
    Number(serde_json::Number),
    Text(String),
}

/// Reads a JSON number or numeric string into a `BigDecimal` without rounding.
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<DecimalInput>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(DecimalInput::Number(n)) => n.to_string(),
        Some(DecimalInput::Text(s)) => s,
    };

    BigDecimal::from_str(raw.trim())
        .map(Some)
        .map_err(|e| serde::de::Error::custom(format!("invalid total_income {:?}: {}", raw, e)))
}
