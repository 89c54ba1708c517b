//! Random number generation from the operating system.

use hsauth_crypto::{Error, Random, Result};
use rand::rngs::OsRng;
use rand::RngCore;

/// Random number generator reading from [`OsRng`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl Random for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|_| Error::RandomGenerationFailed)
    }
}
