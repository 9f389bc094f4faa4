use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use sha2::{Digest, Sha256};

use crate::ForgeAPIState;

/// Request guard for catalog-mutating routes. The `Authorization` header is
/// hashed and compared against the configured token hash, so the plaintext
/// token never lives in config files.
pub struct AuthorizationToken;

pub fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthorizationToken {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let state = match request.rocket().state::<ForgeAPIState>() {
            Some(state) => state,
            None => return Outcome::Error((Status::InternalServerError, ())),
        };
        match request.headers().get_one("Authorization") {
            Some(token) if sha256_hex(token) == state.config.admin_token_hash => {
                Outcome::Success(AuthorizationToken)
            }
            _ => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::sha256_hex;

    #[test]
    fn hashes_to_lowercase_hex() {
        let hash = sha256_hex("letmein");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
