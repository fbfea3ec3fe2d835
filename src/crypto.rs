use {
    crate::HashAlgorithm,
    hmac::{Hmac, Mac},
    md5::{Digest, Md5},
    sha2::{Sha256, Sha384, Sha512},
};

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// Compute the keyed-hash digest of `message` under `key` using the selected algorithm,
/// returning the raw digest bytes.
pub(crate) fn hmac_digest(algorithm: HashAlgorithm, key: &[u8], message: &[u8]) -> Vec<u8> {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        HashAlgorithm::Sha384 => {
            let mut mac = HmacSha384::new_from_slice(key).expect("HMAC accepts keys of any length");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        HashAlgorithm::Sha512 => {
            let mut mac = HmacSha512::new_from_slice(key).expect("HMAC accepts keys of any length");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// Compute the MD5 content digest of `value`, rendered as lower-case hexadecimal.
#[inline(always)]
pub(crate) fn md5_hex(value: &[u8]) -> String {
    hex::encode(Md5::digest(value))
}
