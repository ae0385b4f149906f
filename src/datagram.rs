//! Datagram payload type.
//!
//! A [`Datagram`] is one application-level message: an immutable byte
//! sequence backed by `bytes::Bytes`, so cloning is a reference-count bump
//! and the payload can cross the handler boundary without further copies.
//!
//! # Example
//!
//! ```
//! use framelink::Datagram;
//!
//! let dg = Datagram::copy_from_slice(b"hello");
//! assert_eq!(dg.len(), 5);
//! assert_eq!(dg.as_slice(), b"hello");
//!
//! let shared = dg.clone(); // cheap, zero-copy
//! assert_eq!(shared, dg);
//! ```

use bytes::Bytes;

/// An immutable, reference-counted message payload.
///
/// Construction copies the supplied bytes exactly once; every clone after
/// that shares the same backing storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    data: Bytes,
}

impl Datagram {
    /// Create a datagram by copying the given bytes.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self {
            data: Bytes::copy_from_slice(data),
        }
    }

    /// Get the payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get a clone of the payload as `Bytes` (cheap, zero-copy).
    #[inline]
    pub fn as_bytes(&self) -> Bytes {
        self.data.clone()
    }
}

impl From<Vec<u8>> for Datagram {
    fn from(data: Vec<u8>) -> Self {
        Self {
            data: Bytes::from(data),
        }
    }
}

impl AsRef<[u8]> for Datagram {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
