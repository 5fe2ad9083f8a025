use super::credentials::{CredentialStore, PasswordHasher};
use super::domain::{Property, SellerContact};
use super::repository::seed_seller;

/// Outcome of looking up who is selling a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SellerLookup {
    /// Seed listings always show the fixed sample seller.
    Seed(SellerContact),
    Registered(SellerContact),
    /// The listing names a seller with no account.
    Unknown,
}

impl SellerLookup {
    pub fn contact(self) -> Option<SellerContact> {
        match self {
            SellerLookup::Seed(contact) | SellerLookup::Registered(contact) => Some(contact),
            SellerLookup::Unknown => None,
        }
    }
}

pub fn resolve_seller<H>(credentials: &CredentialStore<H>, property: &Property) -> SellerLookup
where
    H: PasswordHasher,
{
    if property.is_seed() {
        return SellerLookup::Seed(seed_seller());
    }

    match credentials.find_by_email(&property.seller_id) {
        Some(user) => SellerLookup::Registered(user.contact()),
        None => SellerLookup::Unknown,
    }
}
