use std::future::Future;
use std::pin::Pin;

use actix_web::{dev, web, FromRequest, HttpRequest};

use secrecy::{ExposeSecret, Secret};

use crate::error::Error;

pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// The shared secret that grants administrative access.
/// NOTE: Must be registered with the application at startup
#[derive(Clone)]
pub struct AdminKey(Secret<String>);

impl From<Secret<String>> for AdminKey {
    fn from(value: Secret<String>) -> Self {
        Self(value)
    }
}

/// Request guard for administrative endpoints: present only when the
/// request carried the configured shared secret
#[derive(Debug)]
pub struct Administrator;

impl FromRequest for Administrator {
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let expected: &AdminKey = req
                .app_data::<web::Data<AdminKey>>()
                .expect("AdminKey not registered for application");

            let supplied = req
                .headers()
                .get(ADMIN_KEY_HEADER)
                .and_then(|value| value.to_str().ok())
                .ok_or(Error::Unauthorized)?;

            if supplied != expected.0.expose_secret() {
                return Err(Error::Unauthorized);
            }

            Ok(Administrator)
        })
    }
}
