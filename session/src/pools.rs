//! The fixed-size pools the real-time path draws packets, byte buffers,
//! and sample buffers from (§3 "Pools"). Thin named wrappers around
//! `rtcast_util::pool::Pool` so call sites read as "acquire a packet
//! buffer" rather than a bare generic.

use rtcast_util::pool::Pool;

/// Raw datagram-sized byte buffers, reused by the network thread between
/// recv calls.
pub type DatagramBufferPool = Pool<Vec<u8>>;

/// PCM sample-buffer backing storage, reused across frames on the
/// pipeline thread.
pub type SampleBufferPool = Pool<Vec<u8>>;

pub struct PoolSet {
    pub datagram_buffers: DatagramBufferPool,
    pub sample_buffers: SampleBufferPool,
}

impl PoolSet {
    /// `datagram_len` should be at least the network MTU; `sample_buf_len`
    /// at least one frame's worth of interleaved PCM bytes.
    pub fn new(capacity: usize, datagram_len: usize, sample_buf_len: usize) -> Self {
        PoolSet {
            datagram_buffers: Pool::new(capacity, move || vec![0u8; datagram_len]),
            sample_buffers: Pool::new(capacity, move || vec![0u8; sample_buf_len]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_set_primes_both_pools_to_capacity() {
        let pools = PoolSet::new(4, 1500, 4096);
        assert_eq!(pools.datagram_buffers.capacity(), 4);
        assert_eq!(pools.sample_buffers.capacity(), 4);
    }
}
