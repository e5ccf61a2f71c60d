use sha2::{Digest, Sha256};

const HASH_ID_LEN: usize = 10;

/// Derives the opaque public identifier of an event from its numeric id.
#[derive(Debug, Clone)]
pub struct HashIds {
    salt: String,
}

impl HashIds {
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    pub fn encode(&self, id: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(b":");
        hasher.update(id.to_string().as_bytes());
        let mut hex = hex::encode(hasher.finalize());
        hex.truncate(HASH_ID_LEN);
        hex
    }
}
