use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::info;

use super::domain::{ListingFields, ListingOrigin, Property, PropertyId, SellerContact};

/// Update or delete addressed a listing that is missing or owned by someone else.
///
/// Callers cannot tell the two cases apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("property not found or not owned by the requesting seller")]
pub struct NotFoundOrForbidden;

/// The three sample listings shown ahead of seller listings. Their sellers have no account.
pub fn seed_properties() -> Vec<Property> {
    let seed = |id: u64, place: &str, area, bedrooms, bathrooms, hospitals: &str, colleges: &str| {
        Property {
            id: PropertyId(id),
            place: place.to_string(),
            area,
            bedrooms,
            bathrooms,
            hospitals: hospitals.to_string(),
            colleges: colleges.to_string(),
            image: Some(format!("property{id}.jpg")),
            seller_id: format!("seller{id}@example.com"),
            origin: ListingOrigin::Seed,
        }
    };

    vec![
        seed(1, "Downtown", 1200, 3, 2, "2", "3"),
        seed(2, "Uptown", 900, 2, 1, "1", "1"),
        seed(3, "Suburb", 1500, 4, 2, "3", "2"),
    ]
}

pub fn seed_property(id: PropertyId) -> Option<Property> {
    seed_properties().into_iter().find(|property| property.id == id)
}

/// Contact shown for every seed listing.
pub fn seed_seller() -> SellerContact {
    SellerContact {
        first_name: "John".to_string(),
        last_name: "Doe".to_string(),
        email: "seller@example.com".to_string(),
        phone_number: "1234567890".to_string(),
    }
}

struct RepositoryState {
    next_id: u64,
    properties: Vec<Property>,
}

/// Seller listings, kept in insertion order. Ids come from a counter and are never reused.
pub struct PropertyRepository {
    state: Mutex<RepositoryState>,
}

impl Default for PropertyRepository {
    fn default() -> Self {
        Self {
            state: Mutex::new(RepositoryState {
                next_id: 1,
                properties: Vec::new(),
            }),
        }
    }
}

impl PropertyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, seller_id: &str, fields: ListingFields) -> Property {
        let mut state = self.state();
        let id = PropertyId(state.next_id);
        state.next_id += 1;

        let property = Property {
            id,
            place: fields.place,
            area: fields.area,
            bedrooms: fields.bedrooms,
            bathrooms: fields.bathrooms,
            hospitals: fields.hospitals,
            colleges: fields.colleges,
            image: fields.image,
            seller_id: seller_id.to_string(),
            origin: ListingOrigin::Seller,
        };
        state.properties.push(property.clone());

        info!(property_id = %id, seller = seller_id, "listing created");
        property
    }

    /// Replace the listing's attributes. A `None` image keeps the current one.
    pub fn update(
        &self,
        id: PropertyId,
        seller_id: &str,
        fields: ListingFields,
    ) -> Result<(), NotFoundOrForbidden> {
        let mut state = self.state();
        let property = state
            .properties
            .iter_mut()
            .find(|property| property.id == id && property.seller_id == seller_id)
            .ok_or(NotFoundOrForbidden)?;

        property.place = fields.place;
        property.area = fields.area;
        property.bedrooms = fields.bedrooms;
        property.bathrooms = fields.bathrooms;
        property.hospitals = fields.hospitals;
        property.colleges = fields.colleges;
        if let Some(image) = fields.image {
            property.image = Some(image);
        }

        info!(property_id = %id, seller = seller_id, "listing updated");
        Ok(())
    }

    pub fn delete(&self, id: PropertyId, seller_id: &str) -> Result<(), NotFoundOrForbidden> {
        let mut state = self.state();
        let position = state
            .properties
            .iter()
            .position(|property| property.id == id && property.seller_id == seller_id)
            .ok_or(NotFoundOrForbidden)?;
        state.properties.remove(position);

        info!(property_id = %id, seller = seller_id, "listing deleted");
        Ok(())
    }

    pub fn get(&self, id: PropertyId) -> Option<Property> {
        self.state()
            .properties
            .iter()
            .find(|property| property.id == id)
            .cloned()
    }

    pub fn get_owned(
        &self,
        id: PropertyId,
        seller_id: &str,
    ) -> Result<Property, NotFoundOrForbidden> {
        self.state()
            .properties
            .iter()
            .find(|property| property.id == id && property.seller_id == seller_id)
            .cloned()
            .ok_or(NotFoundOrForbidden)
    }

    pub fn list_by_seller(&self, seller_id: &str) -> Vec<Property> {
        self.state()
            .properties
            .iter()
            .filter(|property| property.seller_id == seller_id)
            .cloned()
            .collect()
    }

    /// Seed listings first, then seller listings in insertion order.
    pub fn list_all_with_seed(&self) -> Vec<Property> {
        let mut listings = seed_properties();
        listings.extend(self.state().properties.iter().cloned());
        listings
    }

    fn state(&self) -> MutexGuard<'_, RepositoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
