use super::common::*;
use std::sync::Arc;

use crate::marketplace::credentials::{
    Argon2PasswordHasher, CredentialStore, DuplicateEmail, PasswordHasher,
};
use crate::marketplace::domain::{Role, User};

fn user(email: &str, role: Role, digest: &str) -> User {
    User {
        first_name: "Sam".to_string(),
        last_name: "Okafor".to_string(),
        email: email.to_string(),
        phone_number: "5550199".to_string(),
        password_digest: digest.to_string(),
        role,
    }
}

#[test]
fn first_registration_for_an_email_wins() {
    let store = CredentialStore::new(Arc::new(PlainHasher));
    store
        .register(user("sam@example.com", Role::Seller, "plain$one"))
        .expect("first registration");

    let duplicate = store.register(user("sam@example.com", Role::Buyer, "plain$two"));
    assert_eq!(
        duplicate,
        Err(DuplicateEmail {
            email: "sam@example.com".to_string()
        })
    );

    let stored = store.find_by_email("sam@example.com").expect("user stored");
    assert_eq!(stored.role, Role::Seller);
    assert_eq!(store.len(), 1);
}

#[test]
fn verify_login_returns_role_tagged_principal() {
    let store = CredentialStore::new(Arc::new(PlainHasher));
    store
        .register(user("buyer@example.com", Role::Buyer, "plain$hunter2"))
        .expect("registered");

    let principal = store
        .verify_login("buyer@example.com", "hunter2")
        .expect("credentials accepted");
    assert_eq!(principal.identifier, "buyer@example.com");
    assert_eq!(principal.role, Role::Buyer);
}

#[test]
fn verify_login_rejects_wrong_password_and_unknown_email() {
    let store = CredentialStore::new(Arc::new(PlainHasher));
    store
        .register(user("buyer@example.com", Role::Buyer, "plain$hunter2"))
        .expect("registered");

    assert!(store.verify_login("buyer@example.com", "hunter3").is_none());
    assert!(store.verify_login("nobody@example.com", "hunter2").is_none());
    assert!(store.find_by_email("nobody@example.com").is_none());
}

#[test]
fn repeated_failed_attempts_do_not_lock_the_account() {
    let store = CredentialStore::new(Arc::new(PlainHasher));
    store
        .register(user("buyer@example.com", Role::Buyer, "plain$hunter2"))
        .expect("registered");

    for _ in 0..20 {
        assert!(store.verify_login("buyer@example.com", "guess").is_none());
    }
    assert!(store.verify_login("buyer@example.com", "hunter2").is_some());
}

#[test]
fn argon2_digests_are_salted_and_verifiable() {
    let hasher = Argon2PasswordHasher;
    let first = hasher.hash("correct horse").expect("hashes");
    let second = hasher.hash("correct horse").expect("hashes");

    assert!(first.starts_with("$argon2"));
    assert_ne!(first, second, "each digest carries its own salt");
    assert!(hasher.verify(&first, "correct horse"));
    assert!(!hasher.verify(&first, "battery staple"));
}

#[test]
fn argon2_treats_malformed_digest_as_mismatch() {
    assert!(!Argon2PasswordHasher.verify("not-a-phc-string", "anything"));
}
