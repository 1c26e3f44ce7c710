//! Known-answer test vectors
//!
//! These pin the deterministic derivations (nonce, salt, address seed,
//! address) to literal expected values, so an accidental change to a domain
//! separator, field ordering, or encoding shows up as a regression rather
//! than a silent address migration that would strand users' funds.

#[cfg(test)]
mod derivation_vectors {
    use crate::address;
    use crate::nonce::{self, Randomness};
    use crate::salt;
    use crate::token::IdentityToken;

    /// Fixture token: iss=https://accounts.example.com, sub=1234567890,
    /// aud=zklogin-demo, exp=1916239022, nonce bound to the vector-1 inputs.
    const FIXTURE_JWT: &str = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.eyJpc3MiOiJodHRwczovL2FjY291bnRzLmV4YW1wbGUuY29tIiwic3ViIjoiMTIzNDU2Nzg5MCIsImF1ZCI6InprbG9naW4tZGVtbyIsImV4cCI6MTkxNjIzOTAyMiwibm9uY2UiOiI3YnFpUTlsNFJiOHM4T3dEc2FhcHFiVXkwbGMifQ.c2ln";

    /// Vector 1: nonce binding for a fixed key, epoch, and randomness.
    #[test]
    fn test_vector_1_nonce_binding() {
        let public = [0x11u8; 32];
        let randomness = Randomness::from_bytes([0x22; 16]);

        let bound = nonce::bind(&public, 100, &randomness);
        assert_eq!(bound.as_str(), "7bqiQ9l4Rb8s8OwDsaapqbUy0lc");

        // Epoch is part of the binding.
        let shifted = nonce::bind(&public, 101, &randomness);
        assert_eq!(shifted.as_str(), "V1rk7oUdcUH9vqXwkrZKGDJj8J8");
    }

    /// Vector 2: salt derivation for two fixed subjects.
    #[test]
    fn test_vector_2_salt_derivation() {
        assert_eq!(
            salt::derive("1234567890").as_str(),
            "064263775821694746482238298645842157028"
        );
        assert_eq!(
            salt::derive("another-subject").as_str(),
            "027785546309692954709278403264841718107"
        );
    }

    /// Vector 3: address seed for fixed (salt, sub, aud).
    #[test]
    fn test_vector_3_address_seed() {
        let user_salt = salt::derive("1234567890");
        let seed = address::derive_address_seed(&user_salt, "1234567890", "zklogin-demo");
        assert_eq!(
            hex::encode(seed),
            "bc124f5d525f5f21d039300b5c31e1d4ff598135391bf4bab358c0b28d035dc8"
        );
    }

    /// Vector 4: full address derivation from the fixture token.
    #[test]
    fn test_vector_4_address() {
        let token = IdentityToken::parse(FIXTURE_JWT).unwrap();
        let user_salt = salt::derive("1234567890");
        let derived = address::derive(&token, &user_salt);
        assert_eq!(
            derived.to_hex(),
            "0x5ebb5b15fb6eddd8c16fe5def525196a23a2a278977ca01111803e1a264180c1"
        );
    }

    /// Vector 5: the fixture token's nonce claim is exactly the vector-1
    /// nonce, so a session restored with those inputs accepts this token.
    #[test]
    fn test_vector_5_token_nonce_claim() {
        let token = IdentityToken::parse(FIXTURE_JWT).unwrap();
        assert_eq!(
            token.claims().nonce.as_deref(),
            Some("7bqiQ9l4Rb8s8OwDsaapqbUy0lc")
        );
    }
}
