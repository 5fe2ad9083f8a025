//! Property marketplace: buyer and seller accounts, listing management and search.
//!
//! Credentials, listings and sessions are held in memory for the lifetime of the
//! process, each behind its own mutex inside [`MarketplaceService`]. Rendering is
//! left to clients; handlers answer with JSON documents and flash-style notices.

pub mod access;
pub mod credentials;
pub mod domain;
pub mod repository;
pub mod router;
pub mod search;
pub mod sellers;
pub mod service;
pub mod sessions;
pub mod uploads;

#[cfg(test)]
mod tests;

pub use access::{
    authorize, require_role, AccessDenied, Decision, DenialReason, GuardedAction, SessionState,
};
pub use credentials::{
    Argon2PasswordHasher, CredentialStore, DuplicateEmail, HashingError, PasswordHasher,
};
pub use domain::{
    ImageUpload, ListingFields, ListingOrigin, ListingSubmission, ListingViolation, Principal,
    Property, PropertyId, Registration, RegistrationViolation, Role, SellerContact, User,
};
pub use repository::{
    seed_properties, seed_property, seed_seller, NotFoundOrForbidden, PropertyRepository,
};
pub use router::marketplace_router;
pub use search::{PropertyFilter, SearchCriteria, UnparsableFilterValue};
pub use sellers::{resolve_seller, SellerLookup};
pub use service::{
    LoginOutcome, MarketplaceError, MarketplaceService, Notice, NoticeCategory, SearchResults,
    SellerDetails,
};
pub use sessions::{
    SessionStore, SessionToken, MAX_SESSIONS_PER_PRINCIPAL, SESSION_COOKIE_NAME,
};
pub use uploads::{
    allowed_file, secure_filename, store_upload, unique_filename, ImageStore, UploadError,
    ALLOWED_IMAGE_EXTENSIONS,
};
