use crate::infra::InMemoryImageStore;
use clap::Args;
use estate_hub::error::AppError;
use estate_hub::marketplace::{
    Argon2PasswordHasher, ImageUpload, ListingOrigin, ListingSubmission, MarketplaceService,
    Property, Registration, Role, SearchCriteria,
};
use std::sync::Arc;

type DemoService = MarketplaceService<Argon2PasswordHasher, InMemoryImageStore>;

const DEMO_PASSWORD: &str = "demo-password";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Case-insensitive place fragment for the buyer search.
    #[arg(long)]
    pub(crate) place: Option<String>,
    /// Minimum area for the buyer search.
    #[arg(long)]
    pub(crate) area_min: Option<String>,
    /// Exact bedroom count for the buyer search.
    #[arg(long)]
    pub(crate) bedrooms: Option<String>,
    /// Print search results as JSON instead of a table.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let images = InMemoryImageStore::default();
    let service: DemoService =
        MarketplaceService::new(Arc::new(Argon2PasswordHasher), Arc::new(images.clone()));

    println!("Estate Hub demo");
    register(&service, "Sam", "Seller", "sam@estate.test", Role::Seller)?;
    register(&service, "Bea", "Buyer", "bea@estate.test", Role::Buyer)?;
    println!("  Registered seller sam@estate.test and buyer bea@estate.test");

    let seller = service.login("sam@estate.test", DEMO_PASSWORD)?;
    let seller_session = service.session(Some(&seller.token));
    for submission in demo_listings() {
        let property = service.post_property(&seller_session, submission)?;
        println!(
            "  Posted #{} {} ({} sq ft, {} bed / {} bath)",
            property.id, property.place, property.area, property.bedrooms, property.bathrooms
        );
    }
    println!("  Stored images: {}", images.filenames().join(", "));

    let buyer = service.login("bea@estate.test", DEMO_PASSWORD)?;
    let buyer_session = service.session(Some(&buyer.token));
    let criteria = SearchCriteria {
        place: args.place,
        area_min: args.area_min,
        bedrooms: args.bedrooms,
        ..SearchCriteria::default()
    };
    let results = service.buyer_dashboard(&buyer_session, Some(&criteria))?;

    if args.json {
        match serde_json::to_string_pretty(&results) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("  Search results unavailable: {err}"),
        }
    } else {
        println!("\nBuyer search ({} matches)", results.properties.len());
        for property in &results.properties {
            print_property(property);
        }
        for skipped in &results.ignored_filters {
            println!("  Ignored filter {}: '{}'", skipped.field, skipped.value);
        }
    }

    if let Some(first) = results.properties.first() {
        let origin = if first.is_seed() {
            ListingOrigin::Seed
        } else {
            ListingOrigin::Seller
        };
        let details = service.interested(&buyer_session, first.id, Some(origin))?;
        println!(
            "\nInterested in {}: contact {} {} <{}> {}",
            details.property.place,
            details.seller.first_name,
            details.seller.last_name,
            details.seller.email,
            details.seller.phone_number
        );
    }

    service.logout(Some(&buyer.token));
    service.logout(Some(&seller.token));
    Ok(())
}

fn register(
    service: &DemoService,
    first_name: &str,
    last_name: &str,
    email: &str,
    role: Role,
) -> Result<(), AppError> {
    service.register(Registration {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        phone_number: "5550000".to_string(),
        password: DEMO_PASSWORD.to_string(),
        confirm_password: DEMO_PASSWORD.to_string(),
        role,
    })?;
    Ok(())
}

fn demo_listings() -> Vec<ListingSubmission> {
    vec![
        ListingSubmission {
            place: "Harbour View".to_string(),
            area: 780,
            bedrooms: 2,
            bathrooms: 1,
            hospitals: "1".to_string(),
            colleges: "2".to_string(),
            image: Some(ImageUpload {
                filename: "harbour view.png".to_string(),
                content: "iVBORw0KGgo=".to_string(),
            }),
        },
        ListingSubmission {
            place: "Maple Row".to_string(),
            area: 1350,
            bedrooms: 3,
            bathrooms: 2,
            hospitals: "2".to_string(),
            colleges: "1".to_string(),
            image: None,
        },
    ]
}

fn print_property(property: &Property) {
    let origin = if property.is_seed() { "sample" } else { "seller" };
    println!(
        "  #{:<3} {:<14} {:>5} sq ft  {} bed / {} bath  [{}] {}",
        property.id,
        property.place,
        property.area,
        property.bedrooms,
        property.bathrooms,
        origin,
        property.image.as_deref().unwrap_or("no image")
    );
}
