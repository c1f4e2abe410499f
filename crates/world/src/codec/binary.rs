use sha2::{Digest, Sha256};

use crate::geometry::GridSize;
use crate::grid::TileGrid;
use crate::persist::Persistable;
use crate::tile::Tile;

use super::{invalid_pack, MapFormatError, MAP_TYPE_TAG};

const MAGIC: &[u8; 4] = b"TGMP";
pub const MAP_PACK_FORMAT_VERSION: u16 = 1;

/// Length-prefixed encoding of the same schema as the text format:
///
/// ```text
/// magic | version u16 | tag (u16 len + utf8) | width u32 | height u32
/// | payload_len u32 | sha256(payload) | payload
/// ```
///
/// The payload holds tile payloads column by column, each `u16` length
/// prefixed. All integers are little-endian.
pub fn encode_grid_binary(grid: &TileGrid) -> Result<Vec<u8>, MapFormatError> {
    let size = grid.size();
    let payload = encode_payload(grid)?;
    let payload_len = u32::try_from(payload.len())
        .map_err(|_| invalid_pack("payload too large for u32 length"))?;

    let mut bytes = Vec::<u8>::with_capacity(payload.len() + 64);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&MAP_PACK_FORMAT_VERSION.to_le_bytes());
    write_string(&mut bytes, MAP_TYPE_TAG)?;
    bytes.extend_from_slice(&size.width.to_le_bytes());
    bytes.extend_from_slice(&size.height.to_le_bytes());
    bytes.extend_from_slice(&payload_len.to_le_bytes());
    bytes.extend_from_slice(&sha256_bytes(&payload));
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

pub fn decode_grid_binary(bytes: &[u8]) -> Result<TileGrid, MapFormatError> {
    let mut cursor = 0usize;

    let magic = read_exact(bytes, &mut cursor, MAGIC.len())?;
    if magic != MAGIC {
        return Err(invalid_pack("invalid magic"));
    }
    let version = read_u16(bytes, &mut cursor)?;
    if version != MAP_PACK_FORMAT_VERSION {
        return Err(MapFormatError::UnsupportedVersion { version });
    }
    let tag = read_string(bytes, &mut cursor)?;
    if tag != MAP_TYPE_TAG {
        return Err(MapFormatError::UnknownTypeTag { tag });
    }
    let width = read_u32(bytes, &mut cursor)?;
    let height = read_u32(bytes, &mut cursor)?;
    if width == 0 || height == 0 {
        return Err(MapFormatError::ZeroDimension { width, height });
    }
    let payload_len = read_u32(bytes, &mut cursor)? as usize;
    let expected_hash = read_exact(bytes, &mut cursor, 32)?;
    let payload = read_exact(bytes, &mut cursor, payload_len)?;
    if cursor != bytes.len() {
        return Err(invalid_pack("unexpected trailing bytes"));
    }
    if expected_hash != sha256_bytes(payload) {
        return Err(invalid_pack("payload hash mismatch"));
    }

    decode_payload(payload, GridSize { width, height })
}

fn encode_payload(grid: &TileGrid) -> Result<Vec<u8>, MapFormatError> {
    let width = grid.tile_count_x() as usize;
    let height = grid.tile_count_y() as usize;
    let tiles = grid.tiles();
    let mut payload = Vec::<u8>::new();
    for x in 0..width {
        for y in 0..height {
            write_string(&mut payload, &tiles[y * width + x].serialize())?;
        }
    }
    Ok(payload)
}

fn decode_payload(payload: &[u8], size: GridSize) -> Result<TileGrid, MapFormatError> {
    let width = size.width as usize;
    let height = size.height as usize;
    // Every tile needs at least a length prefix and one byte.
    if payload.len() / 3 < size.cell_count() {
        return Err(invalid_pack("payload too short for declared dimensions"));
    }

    let mut cursor = 0usize;
    let mut tiles = vec![Tile::default(); size.cell_count()];
    for x in 0..width {
        for y in 0..height {
            let raw = read_string(payload, &mut cursor)?;
            tiles[y * width + x]
                .apply_serialized_data(&raw)
                .map_err(|source| MapFormatError::Tile { x, y, source })?;
        }
    }
    if cursor != payload.len() {
        return Err(invalid_pack("payload length mismatch"));
    }
    Ok(TileGrid::from_tiles(size, tiles)?)
}

fn write_string(target: &mut Vec<u8>, value: &str) -> Result<(), MapFormatError> {
    let bytes = value.as_bytes();
    let len = u16::try_from(bytes.len()).map_err(|_| invalid_pack("string too long for u16 length"))?;
    target.extend_from_slice(&len.to_le_bytes());
    target.extend_from_slice(bytes);
    Ok(())
}

fn read_string(bytes: &[u8], cursor: &mut usize) -> Result<String, MapFormatError> {
    let len = read_u16(bytes, cursor)? as usize;
    let raw = read_exact(bytes, cursor, len)?;
    std::str::from_utf8(raw)
        .map(ToString::to_string)
        .map_err(|_| invalid_pack("invalid UTF-8 string"))
}

fn read_u16(bytes: &[u8], cursor: &mut usize) -> Result<u16, MapFormatError> {
    let raw = read_exact(bytes, cursor, 2)?;
    Ok(u16::from_le_bytes([raw[0], raw[1]]))
}

fn read_u32(bytes: &[u8], cursor: &mut usize) -> Result<u32, MapFormatError> {
    let raw = read_exact(bytes, cursor, 4)?;
    Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn read_exact<'a>(
    bytes: &'a [u8],
    cursor: &mut usize,
    len: usize,
) -> Result<&'a [u8], MapFormatError> {
    let end = cursor.saturating_add(len);
    if end > bytes.len() {
        return Err(invalid_pack("unexpected end of data"));
    }
    let out = &bytes[*cursor..end];
    *cursor = end;
    Ok(out)
}

fn sha256_bytes(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}
