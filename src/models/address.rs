use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Free-form shipping address. Every key is optional; intake sources send
/// whatever subset they have.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShippingAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl ShippingAddress {
    pub fn is_empty(&self) -> bool {
        [
            &self.line1,
            &self.line2,
            &self.city,
            &self.postal_code,
            &self.region,
            &self.country,
        ]
        .iter()
        .all(|part| part.as_deref().map_or(true, |s| s.trim().is_empty()))
    }

    /// Parses the stored JSON text. Unreadable values are treated as absent.
    pub fn from_stored(raw: Option<&str>) -> Option<Self> {
        let raw = raw?;
        match serde_json::from_str::<Self>(raw) {
            Ok(address) if !address.is_empty() => Some(address),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable shipping address");
                None
            }
        }
    }

    pub fn to_stored(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        serde_json::to_string(self).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_addresses_round_trip_through_storage() {
        let address = ShippingAddress {
            city: Some("Lyon".into()),
            country: Some("FR".into()),
            ..Default::default()
        };
        let stored = address.to_stored().unwrap();
        assert_eq!(stored, r#"{"city":"Lyon","country":"FR"}"#);
        assert_eq!(ShippingAddress::from_stored(Some(&stored)), Some(address));
    }

    #[test]
    fn blank_or_broken_addresses_are_absent() {
        assert_eq!(ShippingAddress::default().to_stored(), None);
        assert_eq!(ShippingAddress::from_stored(Some("{\"city\":\"  \"}")), None);
        assert_eq!(ShippingAddress::from_stored(Some("not json")), None);
        assert_eq!(ShippingAddress::from_stored(None), None);
    }
}
