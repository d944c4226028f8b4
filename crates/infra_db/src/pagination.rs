//! Cursor pagination
//!
//! A [`Cursor`] is an offset into the ordered live rows of a table. Clients
//! only ever see it as an opaque page token: the URL-safe base64 encoding of
//! a nine byte binary form. A version byte and the offset as a big-endian
//! `u32` are followed by a four byte BLAKE3 tag over those five bytes, so a
//! token that was edited in transit fails to decode instead of landing on a
//! different offset.
//!
//! Listing asks the store for `limit + 1` rows. When the extra row arrives
//! there is another page and its cursor is `offset + limit`; otherwise the
//! page is the last one. No row counts are ever taken.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;

const CURSOR_VERSION: u8 = 0x01;
const BODY_LEN: usize = 5;
const TAG_LEN: usize = 4;
const CURSOR_LEN: usize = BODY_LEN + TAG_LEN;
const TAG_CONTEXT: &str = "monopoly-db page token v1";

fn integrity_tag(body: &[u8]) -> [u8; TAG_LEN] {
    let mut hasher = blake3::Hasher::new_derive_key(TAG_CONTEXT);
    hasher.update(body);
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&hasher.finalize().as_bytes()[..TAG_LEN]);
    tag
}

/// Position within a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Cursor {
    pub offset: u32,
}

impl Cursor {
    pub fn new(offset: u32) -> Self {
        Self { offset }
    }

    pub fn to_bytes(&self) -> [u8; CURSOR_LEN] {
        let mut bytes = [0u8; CURSOR_LEN];
        bytes[0] = CURSOR_VERSION;
        bytes[1..BODY_LEN].copy_from_slice(&self.offset.to_be_bytes());
        let tag = integrity_tag(&bytes[..BODY_LEN]);
        bytes[BODY_LEN..].copy_from_slice(&tag);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatabaseError> {
        if bytes.len() != CURSOR_LEN {
            return Err(DatabaseError::TokenDecode(format!(
                "expected {} bytes, got {}",
                CURSOR_LEN,
                bytes.len()
            )));
        }
        if bytes[0] != CURSOR_VERSION {
            return Err(DatabaseError::TokenDecode(format!(
                "unknown cursor version {}",
                bytes[0]
            )));
        }
        if integrity_tag(&bytes[..BODY_LEN])[..] != bytes[BODY_LEN..] {
            return Err(DatabaseError::TokenDecode(
                "integrity check failed".to_string(),
            ));
        }
        let mut offset = [0u8; 4];
        offset.copy_from_slice(&bytes[1..BODY_LEN]);
        Ok(Self {
            offset: u32::from_be_bytes(offset),
        })
    }

    /// Encodes the cursor as an opaque page token
    pub fn encode_token(&self) -> String {
        URL_SAFE.encode(self.to_bytes())
    }

    /// Decodes a page token produced by [`Cursor::encode_token`]
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::TokenDecode` for malformed base64, a wrong
    /// length, an unknown version byte or a tag that does not match.
    pub fn decode_token(token: &str) -> Result<Self, DatabaseError> {
        let bytes = URL_SAFE
            .decode(token)
            .map_err(|e| DatabaseError::TokenDecode(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

/// A page request: where to start and how many rows to return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    cursor: Option<Cursor>,
    limit: u32,
}

impl Pagination {
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidPagination` when `limit` is zero.
    pub fn new(cursor: Option<Cursor>, limit: u32) -> Result<Self, DatabaseError> {
        if limit == 0 {
            return Err(DatabaseError::InvalidPagination(
                "limit must be at least 1".to_string(),
            ));
        }
        Ok(Self { cursor, limit })
    }

    pub fn first_page(limit: u32) -> Result<Self, DatabaseError> {
        Self::new(None, limit)
    }

    /// Continues a listing from a cursor returned by a previous call
    pub fn after(cursor: Cursor, limit: u32) -> Result<Self, DatabaseError> {
        Self::new(Some(cursor), limit)
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u32 {
        self.cursor.map_or(0, |c| c.offset)
    }

    /// Rows to request from the store: one more than the page size
    pub fn fetch_limit(&self) -> u64 {
        u64::from(self.limit) + 1
    }

    /// Cursor of the page following this one
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidPagination` if the next offset does
    /// not fit in a `u32`.
    pub fn next_cursor(&self) -> Result<Cursor, DatabaseError> {
        self.offset()
            .checked_add(self.limit)
            .map(Cursor::new)
            .ok_or_else(|| {
                DatabaseError::InvalidPagination(format!(
                    "offset {} + limit {} overflows",
                    self.offset(),
                    self.limit
                ))
            })
    }
}

/// Raw paging parameters as received from a transport
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub page_token: Option<String>,
    pub page_size: Option<String>,
}

impl PageRequest {
    /// Parses transport parameters into a [`Pagination`]
    ///
    /// An absent or empty token starts at the first page. The page size is
    /// required, must be numeric and is clamped to `max_page_size`.
    pub fn parse(
        page_token: Option<&str>,
        page_size: Option<&str>,
        max_page_size: u32,
    ) -> Result<Pagination, DatabaseError> {
        let cursor = match page_token {
            Some(token) if !token.is_empty() => Some(Cursor::decode_token(token)?),
            _ => None,
        };

        let raw = page_size.ok_or_else(|| {
            DatabaseError::InvalidPagination("page_size is required".to_string())
        })?;
        let size: u32 = raw.trim().parse().map_err(|_| {
            DatabaseError::InvalidPagination(format!("page_size '{}' is not a number", raw))
        })?;

        Pagination::new(cursor, size.min(max_page_size))
    }

    /// Parses a request deserialized from query parameters
    pub fn into_pagination(self, max_page_size: u32) -> Result<Pagination, DatabaseError> {
        Self::parse(
            self.page_token.as_deref(),
            self.page_size.as_deref(),
            max_page_size,
        )
    }
}

/// One page of a listing with the token for the next one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next: Option<Cursor>) -> Self {
        Self {
            items,
            next_page_token: next.map(|c| c.encode_token()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_form() {
        let cursor = Cursor::new(258);
        let bytes = cursor.to_bytes();
        assert_eq!(bytes.len(), 9);
        assert_eq!(bytes[..5], [0x01, 0, 0, 1, 2]);
        assert_eq!(bytes[5..], integrity_tag(&bytes[..5]));
        assert_eq!(Cursor::from_bytes(&bytes).unwrap(), cursor);
    }

    #[test]
    fn test_token_round_trip() {
        let cursor = Cursor::new(2);
        let token = cursor.encode_token();
        assert_eq!(token.len(), 12);
        assert!(!token.contains('='));
        assert_eq!(Cursor::decode_token(&token).unwrap(), cursor);
    }

    #[test]
    fn test_token_rejections() {
        assert!(matches!(
            Cursor::decode_token("not base64!"),
            Err(DatabaseError::TokenDecode(_))
        ));
        // five bytes without a tag
        assert!(matches!(
            Cursor::decode_token("AQAAAAI="),
            Err(DatabaseError::TokenDecode(_))
        ));

        let mut bytes = Cursor::new(2).to_bytes();
        bytes[0] = 0x02;
        assert!(matches!(
            Cursor::decode_token(&URL_SAFE.encode(bytes)),
            Err(DatabaseError::TokenDecode(_))
        ));
    }

    #[test]
    fn test_flipped_bytes_rejected() {
        for offset in [0, 2, 258, u32::MAX] {
            let bytes = Cursor::new(offset).to_bytes();
            for i in 0..bytes.len() {
                for mask in [0x01u8, 0x80, 0xff] {
                    let mut tampered = bytes;
                    tampered[i] ^= mask;
                    let token = URL_SAFE.encode(tampered);
                    assert!(
                        matches!(
                            Cursor::decode_token(&token),
                            Err(DatabaseError::TokenDecode(_))
                        ),
                        "byte {} ^ {:#04x} of offset {} decoded",
                        i,
                        mask,
                        offset
                    );
                }
            }
        }
    }

    #[test]
    fn test_edited_token_characters_rejected() {
        let token = Cursor::new(2).encode_token();
        for i in 0..token.len() {
            for replacement in ['A', 'B', 'z', '-', '_'] {
                let mut edited: Vec<char> = token.chars().collect();
                if edited[i] == replacement {
                    continue;
                }
                edited[i] = replacement;
                let edited: String = edited.into_iter().collect();
                assert!(
                    matches!(
                        Cursor::decode_token(&edited),
                        Err(DatabaseError::TokenDecode(_))
                    ),
                    "{} decoded after editing position {}",
                    edited,
                    i
                );
            }
        }
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(matches!(
            Pagination::first_page(0),
            Err(DatabaseError::InvalidPagination(_))
        ));
    }

    #[test]
    fn test_next_cursor() {
        let page = Pagination::after(Cursor::new(4), 2).unwrap();
        assert_eq!(page.offset(), 4);
        assert_eq!(page.fetch_limit(), 3);
        assert_eq!(page.next_cursor().unwrap(), Cursor::new(6));
    }

    #[test]
    fn test_next_cursor_overflow() {
        let page = Pagination::after(Cursor::new(u32::MAX - 1), 2).unwrap();
        assert!(matches!(
            page.next_cursor(),
            Err(DatabaseError::InvalidPagination(_))
        ));
    }

    #[test]
    fn test_page_request_parse() {
        let token = Cursor::new(10).encode_token();
        let page = PageRequest::parse(Some(&token), Some("500"), 100).unwrap();
        assert_eq!(page.offset(), 10);
        assert_eq!(page.limit(), 100);

        let first = PageRequest::parse(Some(""), Some("5"), 100).unwrap();
        assert_eq!(first.cursor(), None);

        assert!(PageRequest::parse(None, None, 100).is_err());
        assert!(PageRequest::parse(None, Some("ten"), 100).is_err());
        assert!(PageRequest::parse(None, Some("0"), 100).is_err());
    }

    #[test]
    fn test_page_request_from_query() {
        let token = Cursor::new(4).encode_token();
        let request = PageRequest {
            page_token: Some(token),
            page_size: Some(" 3 ".to_string()),
        };
        let page = request.into_pagination(100).unwrap();
        assert_eq!(page.offset(), 4);
        assert_eq!(page.limit(), 3);

        assert!(matches!(
            PageRequest::default().into_pagination(100),
            Err(DatabaseError::InvalidPagination(_))
        ));
    }

    #[test]
    fn test_page_carries_token() {
        let page = Page::new(vec![1, 2], Some(Cursor::new(2)));
        let expected = Cursor::new(2).encode_token();
        assert_eq!(page.next_page_token.as_deref(), Some(expected.as_str()));
        assert!(Page::<i32>::new(vec![], None).next_page_token.is_none());
    }
}
