use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;
use tracing::{info, warn};

use super::access::{authorize, AccessDenied, DenialReason, GuardedAction, SessionState};
use super::credentials::{CredentialStore, DuplicateEmail, HashingError, PasswordHasher};
use super::domain::{
    ImageUpload, ListingOrigin, ListingSubmission, ListingViolation, Principal, Property,
    PropertyId, Registration, RegistrationViolation, SellerContact, User,
};
use super::repository::{seed_property, PropertyRepository};
use super::search::{PropertyFilter, SearchCriteria, UnparsableFilterValue};
use super::sellers::resolve_seller;
use super::sessions::{SessionStore, SessionToken};
use super::uploads::{store_upload, ImageStore};

/// Application context shared by every request handler.
pub struct MarketplaceService<H, I> {
    credentials: CredentialStore<H>,
    properties: PropertyRepository,
    sessions: SessionStore,
    images: Arc<I>,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: SessionToken,
    pub principal: Principal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub properties: Vec<Property>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignored_filters: Vec<UnparsableFilterValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SellerDetails {
    pub property: Property,
    pub seller: SellerContact,
}

impl<H, I> MarketplaceService<H, I>
where
    H: PasswordHasher + 'static,
    I: ImageStore + 'static,
{
    pub fn new(hasher: Arc<H>, images: Arc<I>) -> Self {
        Self {
            credentials: CredentialStore::new(hasher),
            properties: PropertyRepository::new(),
            sessions: SessionStore::new(),
            images,
        }
    }

    pub fn credentials(&self) -> &CredentialStore<H> {
        &self.credentials
    }

    pub fn properties(&self) -> &PropertyRepository {
        &self.properties
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn register(&self, registration: Registration) -> Result<(), MarketplaceError> {
        registration.validate()?;

        let Registration {
            first_name,
            last_name,
            email,
            phone_number,
            password,
            role,
            ..
        } = registration;
        let email = email.trim().to_string();

        // Skip the hashing cost for an email that is already taken.
        if self.credentials.find_by_email(&email).is_some() {
            return Err(DuplicateEmail { email }.into());
        }

        let password_digest = self.credentials.hasher().hash(&password)?;
        self.credentials.register(User {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email,
            phone_number: phone_number.trim().to_string(),
            password_digest,
            role,
        })?;
        Ok(())
    }

    pub fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, MarketplaceError> {
        let email = email.trim();
        match self.credentials.verify_login(email, password) {
            Some(principal) => {
                let token = self.sessions.open(principal.clone());
                info!(email, role = principal.role.label(), "login succeeded");
                Ok(LoginOutcome { token, principal })
            }
            None => {
                warn!(email, "login rejected");
                Err(MarketplaceError::InvalidCredentials)
            }
        }
    }

    pub fn logout(&self, token: Option<&SessionToken>) {
        if let Some(token) = token {
            self.sessions.close(token);
        }
    }

    pub fn session(&self, token: Option<&SessionToken>) -> SessionState {
        self.sessions.resolve(token)
    }

    /// Every listing (seeds first), narrowed by `criteria` when a search was submitted.
    pub fn buyer_dashboard(
        &self,
        session: &SessionState,
        criteria: Option<&SearchCriteria>,
    ) -> Result<SearchResults, MarketplaceError> {
        authorize(session, GuardedAction::BuyerDashboard)?;
        let listings = self.properties.list_all_with_seed();

        let results = match criteria {
            Some(criteria) => {
                let filter = PropertyFilter::from_criteria(criteria);
                SearchResults {
                    properties: filter.apply(listings),
                    ignored_filters: filter.skipped().to_vec(),
                }
            }
            None => SearchResults {
                properties: listings,
                ignored_filters: Vec::new(),
            },
        };
        Ok(results)
    }

    pub fn seller_dashboard(&self, session: &SessionState) -> Result<Vec<Property>, MarketplaceError> {
        let principal = authorize(session, GuardedAction::SellerDashboard)?;
        Ok(self.properties.list_by_seller(&principal.identifier))
    }

    pub fn post_property(
        &self,
        session: &SessionState,
        submission: ListingSubmission,
    ) -> Result<Property, MarketplaceError> {
        let principal = authorize(session, GuardedAction::PostProperty)?;
        submission.validate()?;

        let (mut fields, upload) = submission.into_parts();
        fields.image = self.store_image(upload);
        Ok(self.properties.create(&principal.identifier, fields))
    }

    /// Current values of an owned listing, for prefilling the edit form.
    pub fn edit_form(
        &self,
        session: &SessionState,
        id: PropertyId,
    ) -> Result<Property, MarketplaceError> {
        let principal = authorize(session, GuardedAction::EditProperty)?;
        self.owned(id, principal, GuardedAction::EditProperty)
    }

    pub fn edit_property(
        &self,
        session: &SessionState,
        id: PropertyId,
        submission: ListingSubmission,
    ) -> Result<Property, MarketplaceError> {
        let action = GuardedAction::EditProperty;
        let principal = authorize(session, action)?;
        let current = self.owned(id, principal, action)?;
        submission.validate()?;

        let (mut fields, upload) = submission.into_parts();
        fields.image = self.store_image(upload);
        let stored = fields.image.clone();

        if self
            .properties
            .update(id, &principal.identifier, fields)
            .is_err()
        {
            if let Some(image) = &stored {
                self.discard_image(image);
            }
            return Err(MarketplaceError::NotFoundOrForbidden { action });
        }

        // A new image supersedes the old file; without one the old file stays in use.
        if let (Some(_), Some(previous)) = (&stored, &current.image) {
            self.discard_image(previous);
        }
        self.owned(id, principal, action)
    }

    pub fn delete_property(
        &self,
        session: &SessionState,
        id: PropertyId,
    ) -> Result<(), MarketplaceError> {
        let action = GuardedAction::DeleteProperty;
        let principal = authorize(session, action)?;
        let property = self.owned(id, principal, action)?;
        self.properties
            .delete(id, &principal.identifier)
            .map_err(|_| MarketplaceError::NotFoundOrForbidden { action })?;

        if let Some(image) = &property.image {
            self.discard_image(image);
        }
        Ok(())
    }

    /// Seller contact for a listing a buyer is interested in.
    ///
    /// Seed and seller listing ids overlap. Without an explicit `origin` the seed
    /// listing takes precedence, then seller listings are consulted.
    pub fn interested(
        &self,
        session: &SessionState,
        id: PropertyId,
        origin: Option<ListingOrigin>,
    ) -> Result<SellerDetails, MarketplaceError> {
        authorize(session, GuardedAction::ShowInterest)?;

        let property = self
            .find_listing(id, origin)
            .ok_or(MarketplaceError::PropertyNotFound { id })?;
        let seller = resolve_seller(&self.credentials, &property)
            .contact()
            .ok_or_else(|| {
                warn!(property_id = %id, seller = %property.seller_id, "listing seller has no account");
                MarketplaceError::SellerNotFound { id }
            })?;

        Ok(SellerDetails { property, seller })
    }

    fn find_listing(&self, id: PropertyId, origin: Option<ListingOrigin>) -> Option<Property> {
        match origin {
            Some(ListingOrigin::Seed) => seed_property(id),
            Some(ListingOrigin::Seller) => self.properties.get(id),
            None => seed_property(id).or_else(|| self.properties.get(id)),
        }
    }

    fn owned(
        &self,
        id: PropertyId,
        principal: &Principal,
        action: GuardedAction,
    ) -> Result<Property, MarketplaceError> {
        self.properties
            .get_owned(id, &principal.identifier)
            .map_err(|_| MarketplaceError::NotFoundOrForbidden { action })
    }

    fn discard_image(&self, filename: &str) {
        if let Err(err) = self.images.remove(filename) {
            warn!(%err, filename, "stale listing image left in storage");
        }
    }

    /// Rejected or failed uploads leave the listing without an image.
    fn store_image(&self, upload: Option<ImageUpload>) -> Option<String> {
        let upload = upload?;
        match store_upload(self.images.as_ref(), &upload) {
            Ok(filename) => Some(filename),
            Err(err) => {
                warn!(%err, filename = %upload.filename, "listing image skipped");
                None
            }
        }
    }
}

/// Error raised by the marketplace service.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),
    #[error(transparent)]
    DuplicateEmail(#[from] DuplicateEmail),
    #[error("Login Unsuccessful. Please check email and password")]
    InvalidCredentials,
    #[error(transparent)]
    InvalidRegistration(#[from] RegistrationViolation),
    #[error(transparent)]
    InvalidListing(#[from] ListingViolation),
    #[error(
        "Property not found or you do not have permission to {} this property",
        listing_verb(.action)
    )]
    NotFoundOrForbidden { action: GuardedAction },
    #[error("Property not found")]
    PropertyNotFound { id: PropertyId },
    #[error("Seller details not found")]
    SellerNotFound { id: PropertyId },
    #[error(transparent)]
    PasswordHashing(#[from] HashingError),
}

fn listing_verb(action: &GuardedAction) -> &'static str {
    match action {
        GuardedAction::DeleteProperty => "delete",
        _ => "edit",
    }
}

impl MarketplaceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MarketplaceError::AccessDenied(denied) => match denied.reason {
                DenialReason::NotAuthenticated => StatusCode::UNAUTHORIZED,
                DenialReason::WrongRole => StatusCode::FORBIDDEN,
            },
            MarketplaceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            MarketplaceError::DuplicateEmail(_) => StatusCode::CONFLICT,
            MarketplaceError::InvalidRegistration(_) | MarketplaceError::InvalidListing(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            MarketplaceError::NotFoundOrForbidden { .. }
            | MarketplaceError::PropertyNotFound { .. }
            | MarketplaceError::SellerNotFound { .. } => StatusCode::NOT_FOUND,
            MarketplaceError::PasswordHashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing flash message and where the client should go next.
    pub fn notice(&self) -> Notice {
        let redirect = match self {
            MarketplaceError::AccessDenied(denied) => denied.redirect(),
            MarketplaceError::InvalidCredentials => "/login",
            MarketplaceError::DuplicateEmail(_)
            | MarketplaceError::InvalidRegistration(_)
            | MarketplaceError::PasswordHashing(_) => "/register",
            MarketplaceError::InvalidListing(_) | MarketplaceError::NotFoundOrForbidden { .. } => {
                "/seller_dashboard"
            }
            MarketplaceError::PropertyNotFound { .. } | MarketplaceError::SellerNotFound { .. } => {
                "/buyer_dashboard"
            }
        };

        let message = match self {
            MarketplaceError::PasswordHashing(_) => {
                "Registration failed, please try again".to_string()
            }
            other => other.to_string(),
        };

        Notice::danger(message, redirect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeCategory {
    Success,
    Danger,
}

/// Flash message for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub message: String,
    pub category: NoticeCategory,
    pub redirect: String,
}

impl Notice {
    pub fn success(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category: NoticeCategory::Success,
            redirect: redirect.into(),
        }
    }

    pub fn danger(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category: NoticeCategory::Danger,
            redirect: redirect.into(),
        }
    }
}
