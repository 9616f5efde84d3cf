//! Integration tests for the request and response framing types.
//!
//! These tests drive [`ResponseBuffer`] the way the receive loop does (read
//! into the free tail, then advance) with many different read sizes, and
//! check that the fill level never passes capacity.

use cellfetch_core::{decode_command, DeviceCommand, HttpRequest, ResponseBuffer, ResponseError};

/// Small deterministic generator so the read sizes vary between cases
/// without pulling in a randomness crate.
struct Lcg(u64);

impl Lcg {
    fn next_in(&mut self, lo: usize, hi: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        lo + (self.0 >> 33) as usize % (hi - lo + 1)
    }
}

/// Feeds `total` bytes in reads of varying size, stopping at the first error
/// the way the receive loop does.  Returns the buffer and the first error.
fn feed(total: usize, capacity: usize, seed: u64) -> (ResponseBuffer, Option<ResponseError>) {
    let mut rng = Lcg(seed);
    let mut buf = ResponseBuffer::with_capacity(capacity);
    let mut sent = 0usize;

    loop {
        if let Err(e) = buf.ensure_room() {
            return (buf, Some(e));
        }
        if sent == total {
            // Peer closed.
            return (buf, None);
        }
        let want = rng.next_in(1, 700).min(total - sent);
        let n = want.min(buf.unfilled_mut().len());
        for (i, b) in buf.unfilled_mut()[..n].iter_mut().enumerate() {
            *b = ((sent + i) % 251) as u8;
        }
        buf.advance(n).expect("n never exceeds the free tail");
        sent += n;
    }
}

#[test]
fn test_any_response_shorter_than_capacity_is_received_whole() {
    for (seed, total) in [(1u64, 0usize), (2, 1), (3, 100), (4, 4095), (5, 8191)] {
        // Act
        let (buf, err) = feed(total, 8192, seed);

        // Assert
        assert_eq!(err, None, "total={total}");
        assert_eq!(buf.len(), total);
        for (i, b) in buf.as_bytes().iter().enumerate() {
            assert_eq!(*b, (i % 251) as u8, "byte {i} out of order");
        }
    }
}

#[test]
fn test_response_at_or_above_capacity_is_truncated_not_overflowed() {
    for (seed, total) in [(6u64, 8192usize), (7, 8193), (8, 20_000)] {
        let (buf, err) = feed(total, 8192, seed);

        assert_eq!(err, Some(ResponseError::Truncated { capacity: 8192 }), "total={total}");
        assert_eq!(buf.len(), 8192, "fill level must stop at capacity");
    }
}

#[test]
fn test_request_rendered_for_default_host_decodes_nothing() {
    // The request itself is not a device command.
    let req = HttpRequest::get("139.162.251.115:42512");
    assert_eq!(decode_command(req.as_bytes()), DeviceCommand::Unknown);
}
