//! Delivery addresses and the address form.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::id::{AddressId, UserId};

/// A saved delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "_id")]
    pub id: AddressId,
    /// Free-form label such as "Home" or "Business".
    #[serde(rename = "type")]
    pub kind: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    #[serde(deserialize_with = "string_or_number")]
    pub postal_code: String,
    #[serde(deserialize_with = "string_or_number")]
    pub phone_number: String,
    pub user: UserId,
}

/// Errors from validating an [`AddressForm`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressFormError {
    /// One or more required fields were left blank.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// Address form as the customer fills it in. Every field is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressForm {
    #[serde(rename = "type")]
    pub kind: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub phone_number: String,
}

impl AddressForm {
    /// Whether every field is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self == &Self::default()
    }

    /// Validate the form and tag it with the owning customer.
    ///
    /// Values are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`AddressFormError::MissingFields`] listing every blank field.
    pub fn validate(&self, user: &UserId) -> Result<NewAddress, AddressFormError> {
        let fields = [
            ("type", &self.kind),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("country", &self.country),
            ("postalCode", &self.postal_code),
            ("phoneNumber", &self.phone_number),
        ];

        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(AddressFormError::MissingFields(missing));
        }

        Ok(NewAddress {
            kind: self.kind.trim().to_string(),
            street: self.street.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            country: self.country.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            user: user.clone(),
        })
    }
}

/// A validated address ready to be sent to the address store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    #[serde(rename = "type")]
    pub kind: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub phone_number: String,
    pub user: UserId,
}

/// The form posts numeric inputs, so older records hold numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Integer(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}
