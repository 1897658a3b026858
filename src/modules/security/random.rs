use rand::rngs::OsRng;
use rand::RngCore;

/// Cryptographically secure random source. Assumed always available.
pub trait RandomSource: Send + Sync {
    fn fill(&self, buffer: &mut [u8]);

    fn next_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill(&mut bytes);
        u64::from_le_bytes(bytes)
    }
}

/// Random source backed by the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buffer: &mut [u8]) {
        OsRng.fill_bytes(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_generation() {
        let first = OsRandom.next_u64();
        let second = OsRandom.next_u64();
        assert_ne!(first, second);

        let mut buffer = [0u8; 32];
        OsRandom.fill(&mut buffer);
        assert_ne!(buffer, [0u8; 32]);
    }
}
