//! HMAC interface.

use crate::HashAlgorithm;

/// HMAC trait.
///
/// Used for the TLS 1.3 Finished construction that produces PSK binders,
/// and for the legacy TLS PRFs.
pub trait Hmac: Send {
    /// Update the HMAC state with more data.
    fn update(&mut self, data: &[u8]);

    /// Finalize the HMAC and return the tag.
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// Verify an HMAC tag in constant time.
    ///
    /// A tag of the wrong length never matches.
    fn verify(self: Box<Self>, tag: &[u8]) -> bool {
        use subtle::ConstantTimeEq;
        let computed = self.finalize();
        computed.ct_eq(tag).into()
    }

    /// Get the output size in bytes for this HMAC.
    fn output_size(&self) -> usize;

    /// Get the hash algorithm used by this HMAC.
    fn algorithm(&self) -> HashAlgorithm;
}
