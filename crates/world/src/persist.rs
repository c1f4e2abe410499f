//! Textual save contract shared by the map and its tiles.
//!
//! The map format nests four delimiter tiers. Tile payloads are forbidden
//! from containing any of them so a saved map can always be split back
//! apart without escaping.

pub const FIELD_DELIMITER: char = '|';
pub const SECTION_DELIMITER: char = '#';
pub const COLUMN_DELIMITER: char = ';';
pub const LIST_DELIMITER: char = ',';

pub const RESERVED_DELIMITERS: [char; 4] = [
    FIELD_DELIMITER,
    SECTION_DELIMITER,
    COLUMN_DELIMITER,
    LIST_DELIMITER,
];

pub trait Persistable {
    type Error;

    fn serialize(&self) -> String;

    /// Replaces `self` with the value described by `data`. On error the
    /// receiver is left untouched.
    fn apply_serialized_data(&mut self, data: &str) -> Result<(), Self::Error>;
}

pub fn is_reserved_delimiter(ch: char) -> bool {
    RESERVED_DELIMITERS.contains(&ch)
}
