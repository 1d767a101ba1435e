use sha2::{Digest, Sha256};

pub fn hash_norm(norm: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(norm.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_sha256() {
        let h = hash_norm("personality");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_norm("personality"));
        assert_ne!(h, hash_norm("persona"));
    }
}
