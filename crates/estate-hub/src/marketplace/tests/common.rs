use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::Value;

use crate::marketplace::access::SessionState;
use crate::marketplace::credentials::{HashingError, PasswordHasher};
use crate::marketplace::domain::{ImageUpload, ListingSubmission, Registration, Role};
use crate::marketplace::service::MarketplaceService;
use crate::marketplace::uploads::{ImageStore, UploadError};

/// Reversible stand-in for Argon2 so tests stay fast.
#[derive(Debug, Default)]
pub(super) struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, HashingError> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, digest: &str, password: &str) -> bool {
        digest.strip_prefix("plain$") == Some(password)
    }
}

pub(super) struct BrokenHasher;

impl PasswordHasher for BrokenHasher {
    fn hash(&self, _password: &str) -> Result<String, HashingError> {
        Err(HashingError("entropy source unavailable".to_string()))
    }

    fn verify(&self, _digest: &str, _password: &str) -> bool {
        false
    }
}

#[derive(Default)]
pub(super) struct MemoryImages {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryImages {
    pub(super) fn bytes(&self, filename: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .expect("image mutex poisoned")
            .get(filename)
            .cloned()
    }

    pub(super) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .files
            .lock()
            .expect("image mutex poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl ImageStore for MemoryImages {
    fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let mut files = self.files.lock().expect("image mutex poisoned");
        if files.contains_key(filename) {
            return Err(UploadError::Storage(format!("{filename} already stored")));
        }
        files.insert(filename.to_string(), bytes.to_vec());
        Ok(filename.to_string())
    }

    fn load(&self, filename: &str) -> Result<Option<Vec<u8>>, UploadError> {
        Ok(self
            .files
            .lock()
            .expect("image mutex poisoned")
            .get(filename)
            .cloned())
    }

    fn remove(&self, filename: &str) -> Result<(), UploadError> {
        self.files
            .lock()
            .expect("image mutex poisoned")
            .remove(filename);
        Ok(())
    }
}

pub(super) struct OfflineImages;

impl ImageStore for OfflineImages {
    fn store(&self, _filename: &str, _bytes: &[u8]) -> Result<String, UploadError> {
        Err(UploadError::Storage("disk full".to_string()))
    }

    fn load(&self, _filename: &str) -> Result<Option<Vec<u8>>, UploadError> {
        Err(UploadError::Storage("disk full".to_string()))
    }

    fn remove(&self, _filename: &str) -> Result<(), UploadError> {
        Err(UploadError::Storage("disk full".to_string()))
    }
}

pub(super) type TestService = MarketplaceService<PlainHasher, MemoryImages>;

pub(super) fn build_service() -> (Arc<TestService>, Arc<MemoryImages>) {
    let images = Arc::new(MemoryImages::default());
    let service = Arc::new(MarketplaceService::new(
        Arc::new(PlainHasher),
        images.clone(),
    ));
    (service, images)
}

pub(super) fn registration(email: &str, role: Role) -> Registration {
    Registration {
        first_name: "Morgan".to_string(),
        last_name: "Lee".to_string(),
        email: email.to_string(),
        phone_number: "5550142".to_string(),
        password: "open-sesame".to_string(),
        confirm_password: "open-sesame".to_string(),
        role,
    }
}

pub(super) fn listing(place: &str, area: u32, bedrooms: u32, bathrooms: u32) -> ListingSubmission {
    ListingSubmission {
        place: place.to_string(),
        area,
        bedrooms,
        bathrooms,
        hospitals: "2".to_string(),
        colleges: "1".to_string(),
        image: None,
    }
}

/// Upload with arbitrary base64 `content`.
pub(super) fn upload(filename: &str, content: &str) -> ImageUpload {
    ImageUpload {
        filename: filename.to_string(),
        content: content.to_string(),
    }
}

/// Upload whose base64 content decodes to the bytes `PNG`.
pub(super) fn png_upload(filename: &str) -> ImageUpload {
    ImageUpload {
        filename: filename.to_string(),
        content: "UE5H".to_string(),
    }
}

/// Register `email` with `role` and return an authenticated session for it.
pub(super) fn signed_in<H, I>(
    service: &MarketplaceService<H, I>,
    email: &str,
    role: Role,
) -> SessionState
where
    H: PasswordHasher + 'static,
    I: ImageStore + 'static,
{
    service
        .register(registration(email, role))
        .expect("registration succeeds");
    let outcome = service
        .login(email, "open-sesame")
        .expect("login succeeds");
    service.session(Some(&outcome.token))
}

pub(super) fn json_request(
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

/// Turn a `Set-Cookie` response header into a `Cookie` request header value.
pub(super) fn session_cookie(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie set")
        .to_str()
        .expect("ascii cookie");
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
