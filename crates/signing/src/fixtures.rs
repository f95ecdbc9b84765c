//! Builders for signed test indexes

use crate::verify::SIGNATURE_MARKER;
use flate2::write::GzEncoder;
use flate2::Compression;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha1::{Digest, Sha1};
use std::io::Write;
use std::path::Path;

/// Gzip `data` into a single stream starting with the signer's header
#[must_use]
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("write to memory");
    encoder.finish().expect("finish gzip stream")
}

/// Throwaway RSA signer producing indexes in the signed layout
pub struct TestSigner {
    key: RsaPrivateKey,
    key_id: String,
}

impl TestSigner {
    #[must_use]
    pub fn generate(key_id: &str) -> Self {
        let mut rng = rand::thread_rng();
        let key = RsaPrivateKey::new(&mut rng, 1024).expect("generate RSA key");
        Self {
            key,
            key_id: key_id.to_string(),
        }
    }

    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    #[must_use]
    pub fn public_key_pem(&self) -> String {
        self.key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .expect("encode public key")
    }

    /// Write the public key into `dir` under the signer's key id
    ///
    /// # Errors
    ///
    /// Returns an error if the key file cannot be written.
    pub fn install(&self, dir: &Path) -> std::io::Result<()> {
        std::fs::write(dir.join(&self.key_id), self.public_key_pem())
    }

    /// PKCS#1 v1.5 signature over the SHA-1 digest of `data`
    #[must_use]
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        let digest = Sha1::digest(data);
        self.key
            .sign(Pkcs1v15Sign::new::<Sha1>(), &digest)
            .expect("sign digest")
    }

    /// Gzipped tar holding one signature entry for `signed`
    #[must_use]
    pub fn signature_segment(&self, signed: &[u8], mtime: u64) -> Vec<u8> {
        let signature = self.sign(signed);

        let mut header = tar::Header::new_gnu();
        header
            .set_path(format!("{SIGNATURE_MARKER}{}", self.key_id))
            .expect("entry name");
        header.set_size(signature.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(mtime);
        header.set_cksum();

        let mut builder = tar::Builder::new(Vec::new());
        builder
            .append(&header, signature.as_slice())
            .expect("append signature entry");
        gzip(&builder.into_inner().expect("finish tar"))
    }

    /// Signature segment followed by `content`, as a mirror serves it
    #[must_use]
    pub fn signed_index(&self, content: &[u8], mtime: u64) -> Vec<u8> {
        let mut blob = self.signature_segment(content, mtime);
        blob.extend_from_slice(content);
        blob
    }
}
