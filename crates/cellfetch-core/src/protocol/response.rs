//! Fixed-capacity accumulation buffer for the HTTP response.
//!
//! # How the receive loop uses it
//!
//! The response is read until the server closes its side of the connection.
//! Each `recv` call writes into [`ResponseBuffer::unfilled_mut`], the free
//! tail of the buffer, and the caller then reports how many bytes arrived
//! with [`ResponseBuffer::advance`].
//!
//! The buffer never grows.  Once every byte of capacity is used and the peer
//! still has not closed, the response cannot be held and the receive loop
//! must stop with [`ResponseError::Truncated`].  A response of exactly
//! `capacity` bytes is therefore reported as truncated too: there is no room
//! left to observe the close.

use thiserror::Error;

/// Receive buffer size used when nothing else is configured.
pub const DEFAULT_RECEIVE_CAPACITY: usize = 8192;

/// Errors produced while accumulating a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    /// The buffer filled up before the peer closed the connection.
    #[error("response truncated: buffer of {capacity} bytes filled before peer closed")]
    Truncated { capacity: usize },

    /// `advance` was called with more bytes than the free tail holds.
    #[error("advance by {requested} bytes exceeds the {remaining} bytes remaining")]
    Overrun { requested: usize, remaining: usize },
}

/// A bounded byte buffer that tracks how much of it has been filled.
#[derive(Debug, Clone)]
pub struct ResponseBuffer {
    storage: Vec<u8>,
    filled: usize,
}

impl ResponseBuffer {
    /// Creates an empty buffer holding at most `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: vec![0u8; capacity],
            filled: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Number of bytes received so far.
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn remaining(&self) -> usize {
        self.capacity() - self.filled
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.capacity()
    }

    /// The free tail of the buffer, where the next read should land.
    pub fn unfilled_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.filled..]
    }

    /// Marks `n` more bytes of the free tail as filled.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::Overrun`] if `n` exceeds [`remaining`](Self::remaining).
    pub fn advance(&mut self, n: usize) -> Result<(), ResponseError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(ResponseError::Overrun {
                requested: n,
                remaining,
            });
        }
        self.filled += n;
        Ok(())
    }

    /// Returns [`ResponseError::Truncated`] if no space is left for the
    /// peer's close to be observed.
    pub fn ensure_room(&self) -> Result<(), ResponseError> {
        if self.is_full() {
            return Err(ResponseError::Truncated {
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    /// The bytes received so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage[..self.filled]
    }

    /// Consumes the buffer, returning only the received bytes.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.storage.truncate(self.filled);
        self.storage
    }
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RECEIVE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity_is_8192() {
        assert_eq!(ResponseBuffer::default().capacity(), 8192);
    }

    #[test]
    fn test_advance_accumulates_across_reads() {
        // Arrange
        let mut buf = ResponseBuffer::with_capacity(16);

        // Act – two reads of 3 and 4 bytes
        buf.unfilled_mut()[..3].copy_from_slice(b"abc");
        buf.advance(3).unwrap();
        buf.unfilled_mut()[..4].copy_from_slice(b"defg");
        buf.advance(4).unwrap();

        // Assert
        assert_eq!(buf.as_bytes(), b"abcdefg");
        assert_eq!(buf.remaining(), 9);
    }

    #[test]
    fn test_unfilled_tail_shrinks_as_buffer_fills() {
        let mut buf = ResponseBuffer::with_capacity(10);
        buf.advance(6).unwrap();
        assert_eq!(buf.unfilled_mut().len(), 4);
    }

    #[test]
    fn test_advance_past_capacity_is_rejected() {
        // Arrange
        let mut buf = ResponseBuffer::with_capacity(4);
        buf.advance(3).unwrap();

        // Act
        let result = buf.advance(2);

        // Assert
        assert_eq!(
            result,
            Err(ResponseError::Overrun {
                requested: 2,
                remaining: 1
            })
        );
        assert_eq!(buf.len(), 3, "failed advance must not change the fill level");
    }

    #[test]
    fn test_ensure_room_reports_truncation_when_full() {
        let mut buf = ResponseBuffer::with_capacity(4);
        buf.advance(4).unwrap();
        assert_eq!(
            buf.ensure_room(),
            Err(ResponseError::Truncated { capacity: 4 })
        );
    }

    #[test]
    fn test_into_bytes_drops_unfilled_tail() {
        let mut buf = ResponseBuffer::with_capacity(32);
        buf.unfilled_mut()[..2].copy_from_slice(b"ok");
        buf.advance(2).unwrap();
        assert_eq!(buf.into_bytes(), b"ok".to_vec());
    }
}
