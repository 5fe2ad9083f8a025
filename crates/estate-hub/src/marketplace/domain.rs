use std::fmt;

use serde::{Deserialize, Serialize};

/// Account roles. Buyers browse and contact sellers; sellers manage their own listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Buyer,
    Seller,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
        }
    }

    /// Landing page after a successful login.
    pub const fn dashboard(self) -> &'static str {
        match self {
            Role::Buyer => "/buyer_dashboard",
            Role::Seller => "/seller_dashboard",
        }
    }
}

/// Registered account. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(skip_serializing)]
    pub password_digest: String,
    pub role: Role,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal {
            identifier: self.email.clone(),
            role: self.role,
        }
    }

    pub fn contact(&self) -> SellerContact {
        SellerContact {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
        }
    }
}

/// Authenticated identity attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub identifier: String,
    pub role: Role,
}

/// Contact details shown to interested buyers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

/// Sign-up form as submitted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

impl Registration {
    pub fn validate(&self) -> Result<(), RegistrationViolation> {
        let required = [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("phone_number", &self.phone_number),
            ("password", &self.password),
            ("confirm_password", &self.confirm_password),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(RegistrationViolation::MissingField(*field));
        }

        if !looks_like_email(self.email.trim()) {
            return Err(RegistrationViolation::InvalidEmail);
        }

        if self.password != self.confirm_password {
            return Err(RegistrationViolation::PasswordMismatch);
        }

        Ok(())
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationViolation {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Passwords must match")]
    PasswordMismatch,
}

/// Numeric listing identifier. Seed and seller listings are numbered independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub u64);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a listing is one of the built-in samples or was posted by a seller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingOrigin {
    Seed,
    #[default]
    Seller,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub place: String,
    pub area: u32,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub hospitals: String,
    pub colleges: String,
    pub image: Option<String>,
    pub seller_id: String,
    #[serde(default)]
    pub origin: ListingOrigin,
}

impl Property {
    pub fn is_seed(&self) -> bool {
        self.origin == ListingOrigin::Seed
    }
}

/// Validated listing attributes handed to the repository. `image` is a stored filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFields {
    pub place: String,
    pub area: u32,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub hospitals: String,
    pub colleges: String,
    pub image: Option<String>,
}

/// Listing form as submitted by a seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSubmission {
    pub place: String,
    pub area: u32,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub hospitals: String,
    pub colleges: String,
    #[serde(default)]
    pub image: Option<ImageUpload>,
}

impl ListingSubmission {
    pub fn validate(&self) -> Result<(), ListingViolation> {
        let required = [
            ("place", &self.place),
            ("hospitals", &self.hospitals),
            ("colleges", &self.colleges),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ListingViolation::MissingField(*field));
        }

        if self.area == 0 {
            return Err(ListingViolation::NonPositiveArea);
        }

        Ok(())
    }

    /// Split the form into repository fields (no image yet) and the pending upload.
    pub fn into_parts(self) -> (ListingFields, Option<ImageUpload>) {
        let fields = ListingFields {
            place: self.place.trim().to_string(),
            area: self.area,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            hospitals: self.hospitals.trim().to_string(),
            colleges: self.colleges.trim().to_string(),
            image: None,
        };
        (fields, self.image)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingViolation {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Area must be a positive number")]
    NonPositiveArea,
}

/// Image attached to a listing form; `content` is base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUpload {
    pub filename: String,
    pub content: String,
}
