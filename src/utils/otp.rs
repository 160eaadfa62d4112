use rand::Rng;

/// Four-digit ride code, uniform over 1000..=9999.
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(1000..=9999).to_string()
}
