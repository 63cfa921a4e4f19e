// src/utils/mod.rs
use crate::models::{Claims, ServiceError, User};
use actix_web::http::header;
use actix_web::{dev::ServiceRequest, HttpMessage, HttpRequest};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::debug;

pub mod event_storage;
pub mod invitation_storage;
pub mod slug;
pub mod store;
pub mod team_storage;
pub mod thread_storage;
pub mod user_storage;

pub use store::{Store, Table};

// Pull the authenticated user id out of the request, set by the auth middleware
pub fn get_user_id_from_request(req: &HttpRequest) -> Result<String, ServiceError> {
    match req.extensions().get::<Claims>() {
        Some(claims) => Ok(claims.sub.clone()),
        None => {
            debug!("Request without valid credentials: {}", req.path());
            Err(ServiceError::Unauthorized)
        }
    }
}

// Same as above for endpoints where signing in is optional
pub fn optional_user_id(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<Claims>().map(|claims| claims.sub.clone())
}

// JWT utility functions
pub mod jwt {
    use super::*;

    pub fn generate_token(user: &User, secret: &str, ttl_days: i64) -> Result<String, ServiceError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(Duration::days(ttl_days))
            .ok_or(ServiceError::InternalServerError)?
            .timestamp() as usize;

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            exp: expiration,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
        .map_err(|_| ServiceError::InternalServerError)
    }

    pub fn decode_token(token: &str, secret: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| ServiceError::Unauthorized)
    }

    pub fn extract_token_from_header(auth_header: &str) -> Result<String, ServiceError> {
        match auth_header.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(ServiceError::Unauthorized),
        }
    }
}

// Password utility functions
pub mod password {
    use super::*;

    pub fn hash_password(password: &str, cost: u32) -> Result<String, ServiceError> {
        hash(password, cost).map_err(|_| ServiceError::InternalServerError)
    }

    pub fn verify_password(password: &str, hash: &str) -> Result<bool, ServiceError> {
        verify(password, hash).map_err(|_| ServiceError::InternalServerError)
    }
}

// Input validation shared by the services
pub mod validation {
    use super::*;
    use lazy_static::lazy_static;
    use regex::Regex;

    lazy_static! {
        static ref EMAIL: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex");
        static ref HEX_COLOR: Regex = Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid colour regex");
    }

    pub fn normalize_email(email: &str) -> Result<String, ServiceError> {
        let email = email.trim().to_lowercase();
        if EMAIL.is_match(&email) {
            Ok(email)
        } else {
            Err(ServiceError::BadRequest(format!("Invalid email address: {}", email)))
        }
    }

    pub fn validate_color(color: &str) -> Result<String, ServiceError> {
        let color = color.trim();
        if HEX_COLOR.is_match(color) {
            Ok(color.to_lowercase())
        } else {
            Err(ServiceError::bad_request("Colour must look like #1a2b3c"))
        }
    }

    // Trimmed, non-empty and at most `max_chars` long
    pub fn required_text(field: &str, value: &str, max_chars: usize) -> Result<String, ServiceError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ServiceError::BadRequest(format!("{} is required", field)));
        }
        if value.chars().count() > max_chars {
            return Err(ServiceError::BadRequest(format!(
                "{} must be at most {} characters",
                field, max_chars
            )));
        }
        Ok(value.to_string())
    }

    // Blank strings clear an optional field
    pub fn optional_text(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

// Middleware for JWT authentication.
//
// A valid bearer token attaches its claims to the request; a missing header
// passes through so public endpoints keep working; a malformed or expired
// token is rejected outright.
pub mod auth_middleware {
    use super::*;
    use actix_web::dev::{forward_ready, Service, ServiceResponse, Transform};
    use actix_web::Error;
    use futures::future::{ok, Ready};
    use std::future::Future;
    use std::pin::Pin;
    use std::rc::Rc;

    pub struct Authentication {
        secret: Rc<String>,
    }

    impl Authentication {
        pub fn new(secret: &str) -> Self {
            Self {
                secret: Rc::new(secret.to_string()),
            }
        }
    }

    impl<S, B> Transform<S, ServiceRequest> for Authentication
    where
        S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
        S::Future: 'static,
        B: 'static,
    {
        type Response = ServiceResponse<B>;
        type Error = Error;
        type Transform = AuthenticationMiddleware<S>;
        type InitError = ();
        type Future = Ready<Result<Self::Transform, Self::InitError>>;

        fn new_transform(&self, service: S) -> Self::Future {
            ok(AuthenticationMiddleware {
                service,
                secret: Rc::clone(&self.secret),
            })
        }
    }

    pub struct AuthenticationMiddleware<S> {
        service: S,
        secret: Rc<String>,
    }

    impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
    where
        S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
        S::Future: 'static,
        B: 'static,
    {
        type Response = ServiceResponse<B>;
        type Error = Error;
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

        forward_ready!(service);

        fn call(&self, req: ServiceRequest) -> Self::Future {
            let claims = req.headers().get(header::AUTHORIZATION).map(|value| {
                value
                    .to_str()
                    .map_err(|_| ServiceError::Unauthorized)
                    .and_then(jwt::extract_token_from_header)
                    .and_then(|token| jwt::decode_token(&token, &self.secret))
            });

            match claims {
                None => Box::pin(self.service.call(req)),
                Some(Ok(claims)) => {
                    req.extensions_mut().insert(claims);
                    Box::pin(self.service.call(req))
                }
                Some(Err(err)) => {
                    let err: Error = err.into();
                    Box::pin(async move { Err::<ServiceResponse<B>, Error>(err) })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: uuid::Uuid::new_v4().to_string(),
            email: "ada@example.com".to_string(),
            password_hash: String::new(),
            name: None,
            bio: None,
            image_storage_id: None,
            current_team_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn tokens_round_trip_with_the_same_secret() {
        let user = sample_user();
        let token = jwt::generate_token(&user, "secret-one", 1).unwrap();
        let claims = jwt::decode_token(&token, "secret-one").unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let token = jwt::generate_token(&sample_user(), "secret-one", 1).unwrap();
        assert!(matches!(
            jwt::decode_token(&token, "secret-two"),
            Err(ServiceError::Unauthorized)
        ));
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(jwt::extract_token_from_header("Bearer abc").unwrap(), "abc");
        assert!(jwt::extract_token_from_header("Basic abc").is_err());
        assert!(jwt::extract_token_from_header("Bearer ").is_err());
    }

    #[test]
    fn emails_are_normalized_and_checked() {
        assert_eq!(
            validation::normalize_email("  Ada@Example.COM ").unwrap(),
            "ada@example.com"
        );
        assert!(validation::normalize_email("not-an-email").is_err());
    }

    #[test]
    fn colours_must_be_hex_triplets() {
        assert_eq!(validation::validate_color("#A1B2C3").unwrap(), "#a1b2c3");
        assert!(validation::validate_color("red").is_err());
    }

    #[test]
    fn required_text_enforces_bounds() {
        assert_eq!(validation::required_text("Name", "  Crew ", 10).unwrap(), "Crew");
        assert!(validation::required_text("Name", "   ", 10).is_err());
        assert!(validation::required_text("Name", "abcdefghijk", 10).is_err());
    }
}
