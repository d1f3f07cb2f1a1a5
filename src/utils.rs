use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::{rngs::ThreadRng, CryptoRng, RngCore};

pub fn generate_nonce() -> String {
    STANDARD.encode(get_random_values::<_, 16>(&mut ThreadRng::default()))
}

pub fn get_random_values<R, const LEN: usize>(rng: &mut R) -> [u8; LEN]
where
    R: RngCore + CryptoRng,
{
    let mut bytes = [0u8; LEN];
    rng.fill_bytes(&mut bytes);
    bytes
}
