use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;

use super::domain::{parse_truthy, Promotion, TargetAudience};

/// Errors raised while importing an admin-portal catalog export.
#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { code: String, message: String },
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read catalog export: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid catalog CSV data: {}", err),
            CatalogImportError::Row { code, message } => {
                write!(f, "invalid catalog row '{}': {}", code, message)
            }
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::Row { .. } => None,
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Promotion catalog parsed from the staff portal's CSV export.
#[derive(Debug, Clone)]
pub struct PromotionCatalog {
    promotions: Vec<Promotion>,
}

impl PromotionCatalog {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut promotions = Vec::new();

        for record in csv_reader.deserialize::<CatalogRow>() {
            promotions.push(record?.into_promotion()?);
        }

        Ok(Self { promotions })
    }

    pub fn promotions(&self) -> &[Promotion] {
        &self.promotions
    }

    pub fn into_promotions(self) -> Vec<Promotion> {
        self.promotions
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Audience", default, deserialize_with = "empty_string_as_none")]
    audience: Option<String>,
    #[serde(rename = "Expires On")]
    expires_on: String,
    #[serde(rename = "Active", default, deserialize_with = "empty_string_as_none")]
    active: Option<String>,
    #[serde(rename = "Public", default, deserialize_with = "empty_string_as_none")]
    public: Option<String>,
    #[serde(rename = "Stock", default, deserialize_with = "empty_string_as_none")]
    stock: Option<String>,
    #[serde(
        rename = "Usage Limit",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    usage_limit: Option<String>,
    #[serde(
        rename = "Min Order Value",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    min_order_value: Option<String>,
}

impl CatalogRow {
    fn into_promotion(self) -> Result<Promotion, CatalogImportError> {
        let code = self.code.clone();
        let row_error = |message: String| CatalogImportError::Row {
            code: code.clone(),
            message,
        };

        let expires_on = NaiveDate::parse_from_str(self.expires_on.trim(), "%Y-%m-%d")
            .map_err(|err| row_error(format!("bad expiry date '{}': {err}", self.expires_on)))?;

        let target_audience = match self.audience.as_deref() {
            Some(raw) => raw
                .parse::<TargetAudience>()
                .map_err(|err| row_error(err.to_string()))?,
            None => TargetAudience::All,
        };

        let is_active = match self.active.as_deref() {
            Some(raw) => parse_truthy(raw)
                .ok_or_else(|| row_error(format!("bad Active flag '{raw}'")))?,
            None => true,
        };
        let is_public = match self.public.as_deref() {
            Some(raw) => parse_truthy(raw)
                .ok_or_else(|| row_error(format!("bad Public flag '{raw}'")))?,
            None => false,
        };

        let stock = self
            .stock
            .as_deref()
            .map(|raw| {
                raw.parse::<i64>()
                    .map_err(|_| row_error(format!("bad Stock '{raw}'")))
            })
            .transpose()?;
        let usage_limit = self
            .usage_limit
            .as_deref()
            .map(|raw| {
                raw.parse::<u32>()
                    .map_err(|_| row_error(format!("bad Usage Limit '{raw}'")))
            })
            .transpose()?;
        let min_order_value = self
            .min_order_value
            .as_deref()
            .map(|raw| {
                raw.parse::<i64>()
                    .map_err(|_| row_error(format!("bad Min Order Value '{raw}'")))
            })
            .transpose()?;

        Ok(Promotion {
            code: self.code,
            title: self.title,
            target_audience,
            expires_on,
            is_active,
            is_public,
            stock,
            usage_limit,
            usage_count: 0,
            min_order_value,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
