//! Request construction from raw caller input.
//!
//! Requests are only obtainable through constructors that validate every
//! field, and expose no setters, so a request in hand is always well-formed.
//! Failures are [`PantryError::Validation`] naming the offending field using
//! its wire name (`weightKg`, `pickupLocation.latitude`, ...).

use crate::error::{PantryError, Result};
use crate::schema;
use crate::types::{FoodItem, GeoPoint, Recipient};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Input for the recipient-matching flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    food_item_id: String,
    expiration_date: NaiveDate,
    dietary_tags: Vec<String>,
    weight_kg: f64,
    pickup_location: GeoPoint,
}

impl MatchRequest {
    pub fn builder() -> MatchRequestBuilder {
        MatchRequestBuilder::default()
    }

    /// Build a request from an inventory record.
    pub fn from_item(item: &FoodItem) -> Result<Self> {
        Self::builder()
            .food_item_id(&item.id)
            .expiration(item.expiration_date)
            .dietary_tags(item.dietary_tags.iter().cloned())
            .weight_kg(item.weight_kg)
            .pickup_location(item.pickup_location.latitude, item.pickup_location.longitude)
            .build()
    }

    /// Build a request from an untyped form payload.
    ///
    /// The payload is checked against the declared input shape first; any
    /// mismatch is reported as a validation error on the offending path.
    pub fn from_json(value: &Value) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw {
            food_item_id: String,
            expiration_date: String,
            dietary_tags: Vec<String>,
            weight_kg: f64,
            pickup_location: GeoPoint,
        }

        schema::match_input_schema()
            .validate(value)
            .map_err(schema_to_validation)?;
        let raw: Raw = serde_json::from_value(value.clone())
            .map_err(|e| PantryError::validation("$", e.to_string()))?;

        Self::builder()
            .food_item_id(raw.food_item_id)
            .expiration_date(raw.expiration_date)
            .dietary_tags(raw.dietary_tags)
            .weight_kg(raw.weight_kg)
            .pickup_location(raw.pickup_location.latitude, raw.pickup_location.longitude)
            .build()
    }

    pub fn food_item_id(&self) -> &str {
        &self.food_item_id
    }

    pub fn expiration_date(&self) -> NaiveDate {
        self.expiration_date
    }

    pub fn dietary_tags(&self) -> &[String] {
        &self.dietary_tags
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn pickup_location(&self) -> GeoPoint {
        self.pickup_location
    }
}

/// Collects raw fields for a [`MatchRequest`]; nothing is checked until
/// [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct MatchRequestBuilder {
    food_item_id: Option<String>,
    expiration_date: Option<String>,
    expiration: Option<NaiveDate>,
    dietary_tags: Option<Vec<String>>,
    weight_kg: Option<f64>,
    pickup_location: Option<(f64, f64)>,
}

impl MatchRequestBuilder {
    pub fn food_item_id(mut self, id: impl Into<String>) -> Self {
        self.food_item_id = Some(id.into());
        self
    }

    /// ISO-8601 date (`2024-08-01`) or timestamp (`2024-08-01T09:30:00Z`).
    pub fn expiration_date(mut self, date: impl Into<String>) -> Self {
        self.expiration_date = Some(date.into());
        self.expiration = None;
        self
    }

    /// Already-parsed expiration date.
    pub fn expiration(mut self, date: NaiveDate) -> Self {
        self.expiration = Some(date);
        self.expiration_date = None;
        self
    }

    pub fn dietary_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dietary_tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn weight_kg(mut self, weight: f64) -> Self {
        self.weight_kg = Some(weight);
        self
    }

    pub fn pickup_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.pickup_location = Some((latitude, longitude));
        self
    }

    pub fn build(self) -> Result<MatchRequest> {
        let food_item_id = self
            .food_item_id
            .ok_or_else(|| missing("foodItemId"))?;
        if food_item_id.trim().is_empty() {
            return Err(PantryError::validation("foodItemId", "must not be empty"));
        }

        let expiration_date = match (self.expiration, self.expiration_date) {
            (Some(date), _) => date,
            (None, Some(raw)) => parse_iso_date(&raw)?,
            (None, None) => return Err(missing("expirationDate")),
        };

        let dietary_tags = self.dietary_tags.ok_or_else(|| missing("dietaryTags"))?;
        let mut seen = HashSet::new();
        for tag in &dietary_tags {
            if tag.trim().is_empty() {
                return Err(PantryError::validation("dietaryTags", "tags must not be empty"));
            }
            if !seen.insert(tag.as_str()) {
                return Err(PantryError::validation(
                    "dietaryTags",
                    format!("duplicate tag '{}'", tag),
                ));
            }
        }

        let weight_kg = self.weight_kg.ok_or_else(|| missing("weightKg"))?;
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return Err(PantryError::validation(
                "weightKg",
                format!("must be a positive number, got {}", weight_kg),
            ));
        }

        let (latitude, longitude) = self
            .pickup_location
            .ok_or_else(|| missing("pickupLocation"))?;
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(PantryError::validation(
                "pickupLocation.latitude",
                format!("must be within [-90, 90], got {}", latitude),
            ));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(PantryError::validation(
                "pickupLocation.longitude",
                format!("must be within [-180, 180], got {}", longitude),
            ));
        }

        Ok(MatchRequest {
            food_item_id,
            expiration_date,
            dietary_tags,
            weight_kg,
            pickup_location: GeoPoint::new(latitude, longitude),
        })
    }
}

/// Input for the free-text needs assessment flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    needs_description: String,
}

impl AssessmentRequest {
    /// The description is kept verbatim; whitespace-only text is rejected.
    pub fn new(needs_description: impl Into<String>) -> Result<Self> {
        let needs_description = needs_description.into();
        if needs_description.trim().is_empty() {
            return Err(PantryError::validation(
                "needsDescription",
                "please describe the recipient's needs",
            ));
        }
        Ok(Self { needs_description })
    }

    pub fn needs_description(&self) -> &str {
        &self.needs_description
    }
}

/// Input for scoring how well available food fits one recipient.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuitabilityRequest {
    recipient_info: String,
    food_item_info: String,
}

impl SuitabilityRequest {
    pub fn new(recipient_info: impl Into<String>, food_item_info: impl Into<String>) -> Result<Self> {
        let recipient_info = recipient_info.into();
        let food_item_info = food_item_info.into();
        if recipient_info.trim().is_empty() {
            return Err(PantryError::validation("recipientInfo", "must not be empty"));
        }
        if food_item_info.trim().is_empty() {
            return Err(PantryError::validation("foodItemInfo", "must not be empty"));
        }
        Ok(Self {
            recipient_info,
            food_item_info,
        })
    }

    /// Describe a recipient and a set of items in plain text.
    pub fn from_records(recipient: &Recipient, items: &[&FoodItem]) -> Result<Self> {
        if items.is_empty() {
            return Err(PantryError::validation("foodItemInfo", "no food items selected"));
        }

        let needs = &recipient.needs;
        let mut recipient_info = format!(
            "{} ({:?}). Urgency: {}.",
            recipient.name, recipient.kind, needs.urgency
        );
        if let Some(size) = needs.family_size {
            recipient_info.push_str(&format!(" Family size: {}.", size));
        }
        if !needs.dietary_restrictions.is_empty() {
            recipient_info.push_str(&format!(
                " Dietary restrictions: {}.",
                needs.dietary_restrictions.join(", ")
            ));
        }

        let food_item_info = items
            .iter()
            .map(|item| {
                format!(
                    "{} ({}), {} kg, expires {}",
                    item.name, item.category, item.weight_kg, item.expiration_date
                )
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::new(recipient_info, food_item_info)
    }

    pub fn recipient_info(&self) -> &str {
        &self.recipient_info
    }

    pub fn food_item_info(&self) -> &str {
        &self.food_item_info
    }
}

fn missing(field: &str) -> PantryError {
    PantryError::validation(field, "required field is missing")
}

/// Turn a schema failure on caller input into a validation failure.
pub(crate) fn schema_to_validation(err: PantryError) -> PantryError {
    match err {
        PantryError::SchemaViolation { path, reason } => {
            let field = path.trim_start_matches("$.").to_string();
            PantryError::Validation { field, reason }
        }
        other => other,
    }
}

fn parse_iso_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.date_naive());
    }
    Err(PantryError::validation(
        "expirationDate",
        format!("'{}' is not an ISO-8601 date", raw),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RecipientKind, RecipientNeeds, Urgency};
    use serde_json::json;

    fn valid_builder() -> MatchRequestBuilder {
        MatchRequest::builder()
            .food_item_id("item-001")
            .expiration_date("2024-08-01")
            .dietary_tags(["vegetarian"])
            .weight_kg(5.0)
            .pickup_location(40.0, -75.0)
    }

    fn field_of(err: PantryError) -> String {
        match err {
            PantryError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn builds_with_exact_fields() {
        let req = valid_builder().build().unwrap();
        assert_eq!(req.food_item_id(), "item-001");
        assert_eq!(req.expiration_date(), NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());
        assert_eq!(req.dietary_tags(), ["vegetarian".to_string()]);
        assert_eq!(req.weight_kg(), 5.0);
        assert_eq!(req.pickup_location(), GeoPoint::new(40.0, -75.0));
    }

    #[test]
    fn zero_or_negative_weight_fails() {
        for w in [0.0, -1.0, f64::NAN] {
            let err = valid_builder().weight_kg(w).build().unwrap_err();
            assert_eq!(field_of(err), "weightKg");
        }
    }

    #[test]
    fn missing_fields_are_named() {
        let err = MatchRequest::builder().build().unwrap_err();
        assert_eq!(field_of(err), "foodItemId");

        let err = MatchRequest::builder()
            .food_item_id("x")
            .expiration_date("2024-08-01")
            .dietary_tags(Vec::<String>::new())
            .pickup_location(0.0, 0.0)
            .build()
            .unwrap_err();
        assert_eq!(field_of(err), "weightKg");
    }

    #[test]
    fn duplicate_tags_fail() {
        let err = valid_builder()
            .dietary_tags(["vegan", "gluten-free", "vegan"])
            .build()
            .unwrap_err();
        assert_eq!(field_of(err), "dietaryTags");
    }

    #[test]
    fn bad_dates_fail_and_timestamps_are_accepted() {
        let err = valid_builder().expiration_date("next tuesday").build().unwrap_err();
        assert_eq!(field_of(err), "expirationDate");

        let req = valid_builder()
            .expiration_date("2024-08-01T09:30:00Z")
            .build()
            .unwrap();
        assert_eq!(req.expiration_date(), NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());
    }

    #[test]
    fn coordinates_out_of_range_fail() {
        let err = valid_builder().pickup_location(95.0, 0.0).build().unwrap_err();
        assert_eq!(field_of(err), "pickupLocation.latitude");
        let err = valid_builder().pickup_location(0.0, -181.0).build().unwrap_err();
        assert_eq!(field_of(err), "pickupLocation.longitude");
    }

    #[test]
    fn from_json_matches_builder() {
        let req = MatchRequest::from_json(&json!({
            "foodItemId": "item-001",
            "expirationDate": "2024-08-01",
            "dietaryTags": ["vegetarian"],
            "weightKg": 5,
            "pickupLocation": {"latitude": 40.0, "longitude": -75.0}
        }))
        .unwrap();
        assert_eq!(req, valid_builder().build().unwrap());
    }

    #[test]
    fn from_json_reports_schema_path_as_field() {
        let err = MatchRequest::from_json(&json!({
            "foodItemId": "item-001",
            "expirationDate": "2024-08-01",
            "dietaryTags": ["vegetarian"],
            "weightKg": "five",
            "pickupLocation": {"latitude": 40.0, "longitude": -75.0}
        }))
        .unwrap_err();
        assert_eq!(field_of(err), "weightKg");
    }

    #[test]
    fn serializes_to_wire_shape() {
        let value = serde_json::to_value(valid_builder().build().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "foodItemId": "item-001",
                "expirationDate": "2024-08-01",
                "dietaryTags": ["vegetarian"],
                "weightKg": 5.0,
                "pickupLocation": {"latitude": 40.0, "longitude": -75.0}
            })
        );
        assert!(schema::match_input_schema().validate(&value).is_ok());
    }

    #[test]
    fn empty_needs_description_fails() {
        for text in ["", "   \n"] {
            let err = AssessmentRequest::new(text).unwrap_err();
            assert_eq!(field_of(err), "needsDescription");
        }
        let req = AssessmentRequest::new("  family of 3 ").unwrap();
        assert_eq!(req.needs_description(), "  family of 3 ");
    }

    #[test]
    fn suitability_from_records() {
        let recipient = Recipient {
            id: "rec-7".into(),
            name: "Maple Street Family".into(),
            kind: RecipientKind::Family,
            contact: "555-0100".into(),
            address: "12 Maple St".into(),
            location: GeoPoint::new(40.1, -75.1),
            needs: RecipientNeeds {
                dietary_restrictions: vec!["dairy-free".into()],
                family_size: Some(5),
                urgency: Urgency::High,
            },
        };
        let item = crate::inventory::tests::sample_item("item-3");
        let req = SuitabilityRequest::from_records(&recipient, &[&item]).unwrap();
        assert!(req.recipient_info().contains("Family size: 5"));
        assert!(req.recipient_info().contains("dairy-free"));
        assert!(req.recipient_info().contains("Urgency: high"));
        assert!(req.food_item_info().contains("expires 2024-08-01"));

        let err = SuitabilityRequest::from_records(&recipient, &[]).unwrap_err();
        assert_eq!(field_of(err), "foodItemInfo");
    }
}
