pub mod aes_gcm_cipher;
pub mod configured_key_provider;
