//! Domain and result types shared across the pipeline.
//!
//! Field names serialize in camelCase, which is also the wire shape sent to
//! and expected back from the text-generation backend.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// How urgently a recipient needs food.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Urgency::Low, Urgency::Medium, Urgency::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = String;

    /// Case-insensitive: models often answer `"High"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            other => Err(format!("unknown urgency level '{}'", other)),
        }
    }
}

impl Serialize for Urgency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Urgency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ── Inventory records ──

/// Lifecycle of a donated item, from receipt to pickup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodItemStatus {
    Received,
    Inspected,
    Stored,
    Allocated,
    PickedUp,
    Expired,
    Trashed,
}

impl FoodItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodItemStatus::Received => "received",
            FoodItemStatus::Inspected => "inspected",
            FoodItemStatus::Stored => "stored",
            FoodItemStatus::Allocated => "allocated",
            FoodItemStatus::PickedUp => "picked_up",
            FoodItemStatus::Expired => "expired",
            FoodItemStatus::Trashed => "trashed",
        }
    }

    /// No further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FoodItemStatus::PickedUp | FoodItemStatus::Expired | FoodItemStatus::Trashed
        )
    }

    /// Whether recipient matching may be requested for an item in this state.
    pub fn is_matchable(&self) -> bool {
        !matches!(self, FoodItemStatus::Allocated | FoodItemStatus::PickedUp)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// The main path is received → inspected → stored → allocated → picked_up.
    /// Any non-terminal item may be marked expired or trashed.
    pub fn can_transition_to(&self, next: FoodItemStatus) -> bool {
        use FoodItemStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Received, Inspected)
                | (Inspected, Stored)
                | (Stored, Allocated)
                | (Allocated, PickedUp)
                | (Allocated, Stored)
                | (_, Expired)
                | (_, Trashed)
        )
    }
}

impl fmt::Display for FoodItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Fresh,
    Frozen,
    Dry,
    Packaged,
}

/// Pickup point of a donated item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

impl PickupLocation {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// A donated food item as tracked in the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub weight_kg: f64,
    pub condition: Condition,
    pub expiration_date: NaiveDate,
    /// e.g. `ambient`, `refrigerated`, `frozen`.
    pub storage_temp: String,
    pub allergens: Vec<String>,
    pub dietary_tags: Vec<String>,
    pub pickup_location: PickupLocation,
    pub status: FoodItemStatus,
    pub donor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientKind {
    Individual,
    Family,
    Organization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientNeeds {
    pub dietary_restrictions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_size: Option<u32>,
    pub urgency: Urgency,
}

/// A person, family, or partner organization that can receive food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub name: String,
    pub kind: RecipientKind,
    pub contact: String,
    pub address: String,
    pub location: GeoPoint,
    pub needs: RecipientNeeds,
}

// ── Results ──

/// One suggested recipient for a food item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientMatch {
    pub recipient_id: String,
    /// 0 to 100, higher is better.
    pub match_score: f64,
    pub reason: String,
}

impl RecipientMatch {
    pub fn new(recipient_id: impl Into<String>, match_score: f64, reason: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            match_score,
            reason: reason.into(),
        }
    }
}

/// Suggested recipients, best match first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MatchResult(Vec<RecipientMatch>);

impl MatchResult {
    /// Order by descending score. Equal scores keep their input order.
    pub fn ranked(mut matches: Vec<RecipientMatch>) -> Self {
        matches.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        Self(matches)
    }

    pub fn matches(&self) -> &[RecipientMatch] {
        &self.0
    }

    pub fn best(&self) -> Option<&RecipientMatch> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<RecipientMatch> {
        self.0
    }
}

impl<'de> Deserialize<'de> for MatchResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<RecipientMatch>::deserialize(deserializer).map(MatchResult::ranked)
    }
}

/// Structured reading of a free-text needs description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub dietary_restrictions: Vec<String>,
    pub food_preferences: Vec<String>,
    pub urgency_level: Urgency,
    pub notes: String,
}

/// How well a set of food items fits one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuitabilityResult {
    /// 0 to 100.
    pub suitability_score: f64,
    pub recommendation_rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_adjustments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn urgency_parses_case_insensitively() {
        assert_eq!("High".parse::<Urgency>().unwrap(), Urgency::High);
        assert_eq!(" low ".parse::<Urgency>().unwrap(), Urgency::Low);
        assert!("critical".parse::<Urgency>().is_err());
    }

    #[test]
    fn urgency_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Urgency::Medium).unwrap(), json!("medium"));
    }

    #[test]
    fn ranked_sorts_descending_and_keeps_ties_stable() {
        let result = MatchResult::ranked(vec![
            RecipientMatch::new("a", 50.0, ""),
            RecipientMatch::new("b", 90.0, ""),
            RecipientMatch::new("c", 50.0, ""),
            RecipientMatch::new("d", 70.0, ""),
        ]);
        let ids: Vec<&str> = result.matches().iter().map(|m| m.recipient_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
        assert_eq!(result.best().unwrap().recipient_id, "b");
    }

    #[test]
    fn match_result_deserializes_ranked() {
        let result: MatchResult = serde_json::from_value(json!([
            {"recipientId": "x", "matchScore": 10, "reason": "far"},
            {"recipientId": "y", "matchScore": 60, "reason": "near"}
        ]))
        .unwrap();
        assert_eq!(result.matches()[0].recipient_id, "y");
    }

    #[test]
    fn status_lifecycle() {
        use FoodItemStatus::*;
        assert!(Received.can_transition_to(Inspected));
        assert!(Stored.can_transition_to(Allocated));
        assert!(Allocated.can_transition_to(PickedUp));
        assert!(Stored.can_transition_to(Expired));
        assert!(!Received.can_transition_to(Allocated));
        assert!(!PickedUp.can_transition_to(Trashed));
        assert!(!Expired.can_transition_to(Stored));
    }

    #[test]
    fn allocated_and_picked_up_items_are_not_matchable() {
        assert!(FoodItemStatus::Stored.is_matchable());
        assert!(!FoodItemStatus::Allocated.is_matchable());
        assert!(!FoodItemStatus::PickedUp.is_matchable());
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(FoodItemStatus::PickedUp).unwrap(),
            json!("picked_up")
        );
    }
}
