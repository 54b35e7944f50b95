use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::loyalty::domain::CustomerId;

/// Who a promotion is aimed at. Anything other than `All` keeps the promotion
/// out of the general public listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetAudience {
    All,
    NewClients,
    Birthday,
    Vip,
    TierLevel(u8),
}

impl TargetAudience {
    pub fn is_targeted(self) -> bool {
        !matches!(self, TargetAudience::All)
    }
}

impl fmt::Display for TargetAudience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAudience::All => write!(f, "all"),
            TargetAudience::NewClients => write!(f, "new_clients"),
            TargetAudience::Birthday => write!(f, "birthday"),
            TargetAudience::Vip => write!(f, "vip"),
            TargetAudience::TierLevel(level) => write!(f, "tier:{level}"),
        }
    }
}

impl From<TargetAudience> for String {
    fn from(value: TargetAudience) -> Self {
        value.to_string()
    }
}

/// Parse failure for an audience tag.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized target audience '{0}'")]
pub struct AudienceParseError(pub String);

impl FromStr for TargetAudience {
    type Err = AudienceParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "" | "all" => Ok(TargetAudience::All),
            "new_clients" | "new_client" => Ok(TargetAudience::NewClients),
            "birthday" => Ok(TargetAudience::Birthday),
            "vip" => Ok(TargetAudience::Vip),
            other => {
                let level = other
                    .strip_prefix("tier:")
                    .or_else(|| other.strip_prefix("tier_"))
                    .and_then(|raw| raw.parse::<u8>().ok());
                match level {
                    Some(level) => Ok(TargetAudience::TierLevel(level)),
                    None => Err(AudienceParseError(value.to_string())),
                }
            }
        }
    }
}

impl TryFrom<String> for TargetAudience {
    type Error = AudienceParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A voucher/promotion row as stored by the admin portal.
///
/// `is_public` has historically been persisted as a boolean, an integer, and
/// the strings "0"/"1" depending on the writing client, so deserialization
/// accepts all of those shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub code: String,
    pub title: String,
    #[serde(default = "default_audience")]
    pub target_audience: TargetAudience,
    pub expires_on: NaiveDate,
    pub is_active: bool,
    #[serde(deserialize_with = "deserialize_flexible_bool")]
    pub is_public: bool,
    /// Remaining redeemable inventory. `None` means unlimited.
    pub stock: Option<i64>,
    /// Per-customer redemption cap. `None` means uncapped.
    pub usage_limit: Option<u32>,
    /// Total redemptions recorded so far, across all customers.
    #[serde(default)]
    pub usage_count: u32,
    /// Minimum appointment order value required at redemption, in VND.
    pub min_order_value: Option<i64>,
}

fn default_audience() -> TargetAudience {
    TargetAudience::All
}

/// Accepts `true`/`false`, `0`/`1`, and `"0"`/`"1"`/`"true"`/`"false"`.
pub fn deserialize_flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bool(value) => Ok(value),
        Raw::Int(value) => Ok(value != 0),
        Raw::Text(value) => parse_truthy(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("cannot interpret '{value}' as a boolean"))
        }),
    }
}

pub(crate) fn parse_truthy(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" | "" => Some(false),
        _ => None,
    }
}

/// Record of one redemption, kept to enforce per-customer usage limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionUsage {
    pub customer_id: CustomerId,
    pub promotion_code: String,
    pub appointment_id: String,
    pub used_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audience_parses_admin_portal_spellings() {
        assert_eq!("All".parse::<TargetAudience>().unwrap(), TargetAudience::All);
        assert_eq!(
            "New Clients".parse::<TargetAudience>().unwrap(),
            TargetAudience::NewClients
        );
        assert_eq!(
            "tier:2".parse::<TargetAudience>().unwrap(),
            TargetAudience::TierLevel(2)
        );
        assert_eq!(
            "Tier_3".parse::<TargetAudience>().unwrap(),
            TargetAudience::TierLevel(3)
        );
        assert!("platinum".parse::<TargetAudience>().is_err());
    }

    #[test]
    fn is_public_accepts_legacy_representations() {
        for raw in [
            r#"{"code":"A","title":"t","expires_on":"2026-12-31","is_active":true,"is_public":"1","stock":null,"usage_limit":null,"min_order_value":null}"#,
            r#"{"code":"A","title":"t","expires_on":"2026-12-31","is_active":true,"is_public":1,"stock":null,"usage_limit":null,"min_order_value":null}"#,
            r#"{"code":"A","title":"t","expires_on":"2026-12-31","is_active":true,"is_public":true,"stock":null,"usage_limit":null,"min_order_value":null}"#,
        ] {
            let promotion: Promotion = serde_json::from_str(raw).expect("deserializes");
            assert!(promotion.is_public, "expected truthy for {raw}");
        }

        let promotion: Promotion = serde_json::from_str(
            r#"{"code":"A","title":"t","expires_on":"2026-12-31","is_active":true,"is_public":"0","stock":null,"usage_limit":null,"min_order_value":null}"#,
        )
        .expect("deserializes");
        assert!(!promotion.is_public);
    }

    #[test]
    fn audience_round_trips_through_serde() {
        let audience = TargetAudience::TierLevel(2);
        let json = serde_json::to_string(&audience).expect("serializes");
        assert_eq!(json, "\"tier:2\"");
        let parsed: TargetAudience = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(parsed, audience);
    }
}
