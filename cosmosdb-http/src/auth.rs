//! Master-key request signing.
//!
//! Every request carries an `Authorization` header derived from the HTTP method,
//! the addressed resource and the request timestamp:
//!
//! ```text
//! payload   = lower(method) \n lower(resource type) \n resource id \n lower(date) \n \n
//! signature = base64(HMAC-SHA256(base64-decoded key, payload))
//! header    = urlencode("type=master&ver=1.0&sig=" + signature)
//! ```

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use cosmosdb_core::{
    error::{CosmosError, CosmosResult},
    link::resource_type_and_id,
};

const TOKEN_TYPE: &str = "master";
const TOKEN_VERSION: &str = "1.0";

/// A decoded account master key.
#[derive(Clone, PartialEq, Eq)]
pub struct MasterKey(Vec<u8>);

impl MasterKey {
    /// Decodes a base64 master key.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidConfiguration`] if the key is not valid base64.
    pub fn parse(key: &str) -> CosmosResult<Self> {
        let bytes = STANDARD
            .decode(key.trim())
            .map_err(|e| CosmosError::InvalidConfiguration(format!("invalid key: {}", e)))?;

        if bytes.is_empty() {
            return Err(CosmosError::InvalidConfiguration("invalid key: empty".into()));
        }

        Ok(MasterKey(bytes))
    }

    /// Returns the base64 HMAC-SHA256 of `data` under this key.
    pub fn sign(&self, data: &[u8]) -> CosmosResult<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.0)
            .map_err(|e| CosmosError::InvalidConfiguration(format!("invalid key: {}", e)))?;
        mac.update(data);

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

/// Builds the canonical payload that is signed for a request.
pub fn string_to_sign(method: &str, resource_link: &str, date: &str) -> String {
    let (resource_type, resource_id) = resource_type_and_id(resource_link);

    format!(
        "{}\n{}\n{}\n{}\n\n",
        method.to_lowercase(),
        resource_type.to_lowercase(),
        resource_id,
        date.to_lowercase(),
    )
}

/// Computes the request signature for `method` on `resource_link` at `date`.
pub fn sign(key: &MasterKey, method: &str, resource_link: &str, date: &str) -> CosmosResult<String> {
    key.sign(string_to_sign(method, resource_link, date).as_bytes())
}

/// Computes the percent-encoded `Authorization` header value.
pub fn authorization(
    key: &MasterKey,
    method: &str,
    resource_link: &str,
    date: &str,
) -> CosmosResult<String> {
    let signature = sign(key, method, resource_link, date)?;
    let token = format!("type={}&ver={}&sig={}", TOKEN_TYPE, TOKEN_VERSION, signature);

    Ok(url::form_urlencoded::byte_serialize(token.as_bytes()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str =
        "C2y6yDjf5/R+ob0N8A7Cgv30VRDJIWEHLM+4QDU5DE2nQ9nDuVTqobD4b8mGGyPMbIZnqyMsEcaGQy67XIw/Jw==";

    #[test]
    fn test_parse_key() {
        assert!(MasterKey::parse(TEST_KEY).is_ok());
        assert!(matches!(MasterKey::parse("not base64!"), Err(CosmosError::InvalidConfiguration(_))));
        assert!(matches!(MasterKey::parse(""), Err(CosmosError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_string_to_sign() {
        assert_eq!(
            string_to_sign("GET", "dbs/d1/colls/c1", "Thu, 27 Apr 2017 00:51:12 GMT"),
            "get\ncolls\ndbs/d1/colls/c1\nthu, 27 apr 2017 00:51:12 gmt\n\n",
        );
        assert_eq!(
            string_to_sign("POST", "dbs/d1/colls/c1/docs", "Tue, 01 Nov 1994 08:12:31 GMT"),
            "post\ndocs\ndbs/d1/colls/c1\ntue, 01 nov 1994 08:12:31 gmt\n\n",
        );
    }

    #[test]
    fn test_known_answer_signature() {
        let key = MasterKey::parse(TEST_KEY).unwrap();

        assert_eq!(
            sign(&key, "GET", "dbs/d1/colls/c1", "Thu, 27 Apr 2017 00:51:12 GMT").unwrap(),
            "qVDqLKg1feZBkAZZZqqh7uqbsuwLtdFMGj0j94lo148=",
        );
        assert_eq!(
            sign(&key, "POST", "dbs/d1/colls/c1/docs", "Tue, 01 Nov 1994 08:12:31 GMT").unwrap(),
            "XPvZO8Moga1dB35sXfJiKI6dkVmPakrRfw6rv2yKv8w=",
        );
    }

    #[test]
    fn test_authorization_is_url_encoded() {
        let key = MasterKey::parse(TEST_KEY).unwrap();

        assert_eq!(
            authorization(&key, "GET", "dbs/d1/colls/c1", "Thu, 27 Apr 2017 00:51:12 GMT").unwrap(),
            "type%3Dmaster%26ver%3D1.0%26sig%3DqVDqLKg1feZBkAZZZqqh7uqbsuwLtdFMGj0j94lo148%3D",
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let key = MasterKey::parse(TEST_KEY).unwrap();
        assert_eq!(format!("{:?}", key), "MasterKey(..)");
    }
}
