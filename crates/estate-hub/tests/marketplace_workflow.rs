use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use estate_hub::marketplace::{
    Argon2PasswordHasher, GuardedAction, ImageStore, ImageUpload, ListingOrigin,
    ListingSubmission, MarketplaceError, MarketplaceService, PropertyId, Registration, Role,
    SearchCriteria, UploadError,
};

#[derive(Default)]
struct ScratchImages {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl ImageStore for ScratchImages {
    fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, UploadError> {
        self.files
            .lock()
            .expect("image lock")
            .insert(filename.to_string(), bytes.to_vec());
        Ok(filename.to_string())
    }

    fn load(&self, filename: &str) -> Result<Option<Vec<u8>>, UploadError> {
        Ok(self.files.lock().expect("image lock").get(filename).cloned())
    }

    fn remove(&self, filename: &str) -> Result<(), UploadError> {
        self.files.lock().expect("image lock").remove(filename);
        Ok(())
    }
}

fn register(
    service: &MarketplaceService<Argon2PasswordHasher, ScratchImages>,
    email: &str,
    role: Role,
) {
    service
        .register(Registration {
            first_name: "Rowan".to_string(),
            last_name: "Hale".to_string(),
            email: email.to_string(),
            phone_number: "5550199".to_string(),
            password: "correct horse".to_string(),
            confirm_password: "correct horse".to_string(),
            role,
        })
        .expect("registration succeeds");
}

#[test]
fn seller_lists_and_buyer_reaches_seller() {
    let images = Arc::new(ScratchImages::default());
    let service = MarketplaceService::new(Arc::new(Argon2PasswordHasher), images.clone());
    register(&service, "seller@estate.test", Role::Seller);
    register(&service, "buyer@estate.test", Role::Buyer);

    let seller = service
        .login("seller@estate.test", "correct horse")
        .expect("seller login");
    let seller_session = service.session(Some(&seller.token));

    let posted = service
        .post_property(
            &seller_session,
            ListingSubmission {
                place: "Lakeside Cottage".to_string(),
                area: 850,
                bedrooms: 2,
                bathrooms: 1,
                hospitals: "1".to_string(),
                colleges: "2".to_string(),
                image: Some(ImageUpload {
                    filename: "cottage.jpeg".to_string(),
                    content: "/9j/".to_string(),
                }),
            },
        )
        .expect("listing posted");
    assert_eq!(posted.id, PropertyId(1));
    let image = posted.image.clone().expect("image stored");
    assert!(image.ends_with("_cottage.jpeg"));
    assert_eq!(
        images.load(&image).expect("load"),
        Some(vec![0xff, 0xd8, 0xff])
    );

    let buyer = service
        .login("buyer@estate.test", "correct horse")
        .expect("buyer login");
    let buyer_session = service.session(Some(&buyer.token));

    let criteria = SearchCriteria {
        place: Some("lake".to_string()),
        ..SearchCriteria::default()
    };
    let results = service
        .buyer_dashboard(&buyer_session, Some(&criteria))
        .expect("search");
    assert_eq!(results.properties, vec![posted.clone()]);

    let details = service
        .interested(&buyer_session, posted.id, Some(ListingOrigin::Seller))
        .expect("seller details");
    assert_eq!(details.seller.email, "seller@estate.test");
    assert_eq!(details.seller.phone_number, "5550199");

    service.logout(Some(&buyer.token));
    let after_logout = service.session(Some(&buyer.token));
    match service.interested(&after_logout, posted.id, None) {
        Err(MarketplaceError::AccessDenied(denied)) => {
            assert_eq!(denied.action, GuardedAction::ShowInterest)
        }
        other => panic!("expected denial, got {other:?}"),
    }
}

#[test]
fn wrong_password_never_opens_a_session() {
    let service = MarketplaceService::new(
        Arc::new(Argon2PasswordHasher),
        Arc::new(ScratchImages::default()),
    );
    register(&service, "seller@estate.test", Role::Seller);

    assert!(matches!(
        service.login("seller@estate.test", "Correct Horse"),
        Err(MarketplaceError::InvalidCredentials)
    ));
}
