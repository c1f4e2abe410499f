use std::fmt::Write as _;

use crate::geometry::GridSize;
use crate::grid::TileGrid;
use crate::persist::{
    Persistable, COLUMN_DELIMITER, FIELD_DELIMITER, LIST_DELIMITER, SECTION_DELIMITER,
};
use crate::tile::Tile;

use super::{MapFormatError, MAP_TYPE_TAG};

const HEADER_FIELDS: usize = 3;

/// `GameMap|<w>|<h>|#` followed by one `;`-terminated segment per column,
/// each holding that column's tiles top to bottom, `,`-terminated.
pub fn serialize_grid(grid: &TileGrid) -> String {
    let size = grid.size();
    let width = size.width as usize;
    let height = size.height as usize;
    let tiles = grid.tiles();

    let mut out = String::with_capacity(16 + tiles.len() * 12);
    let _ = write!(
        out,
        "{MAP_TYPE_TAG}{FIELD_DELIMITER}{}{FIELD_DELIMITER}{}{FIELD_DELIMITER}{SECTION_DELIMITER}",
        size.width, size.height
    );
    for x in 0..width {
        for y in 0..height {
            out.push_str(&tiles[y * width + x].serialize());
            out.push(LIST_DELIMITER);
        }
        out.push(COLUMN_DELIMITER);
    }
    out
}

/// Parses the whole string before building anything, so a malformed save
/// never produces a partial grid.
pub fn deserialize_grid(data: &str) -> Result<TileGrid, MapFormatError> {
    let (header, body) =
        data.split_once(SECTION_DELIMITER)
            .ok_or(MapFormatError::MissingSection {
                delimiter: SECTION_DELIMITER,
            })?;
    let size = parse_header(header)?;

    let columns = split_terminated(body, COLUMN_DELIMITER, "tile section")?;
    if columns.len() != size.width as usize {
        return Err(MapFormatError::ColumnCount {
            expected: size.width as usize,
            actual: columns.len(),
        });
    }

    let height = size.height as usize;
    let mut parsed_columns = Vec::<Vec<Tile>>::with_capacity(columns.len());
    for (x, column) in columns.into_iter().enumerate() {
        let payloads = split_terminated(column, LIST_DELIMITER, "tile column")?;
        if payloads.len() != height {
            return Err(MapFormatError::TileCount {
                column: x,
                expected: height,
                actual: payloads.len(),
            });
        }
        let tiles = payloads
            .into_iter()
            .enumerate()
            .map(|(y, payload)| {
                let mut tile = Tile::default();
                tile.apply_serialized_data(payload)
                    .map_err(|source| MapFormatError::Tile { x, y, source })?;
                Ok(tile)
            })
            .collect::<Result<Vec<_>, MapFormatError>>()?;
        parsed_columns.push(tiles);
    }

    let mut tiles = Vec::with_capacity(size.cell_count());
    let mut columns = parsed_columns
        .into_iter()
        .map(Vec::into_iter)
        .collect::<Vec<_>>();
    for _ in 0..height {
        tiles.extend(columns.iter_mut().filter_map(Iterator::next));
    }
    Ok(TileGrid::from_tiles(size, tiles)?)
}

fn parse_header(header: &str) -> Result<GridSize, MapFormatError> {
    let fields = header
        .strip_suffix(FIELD_DELIMITER)
        .ok_or(MapFormatError::MissingTerminator {
            segment: "map header",
            delimiter: FIELD_DELIMITER,
        })?
        .split(FIELD_DELIMITER)
        .collect::<Vec<_>>();
    if fields.len() != HEADER_FIELDS {
        return Err(MapFormatError::HeaderFieldCount {
            expected: HEADER_FIELDS,
            actual: fields.len(),
        });
    }
    if fields[0] != MAP_TYPE_TAG {
        return Err(MapFormatError::UnknownTypeTag {
            tag: fields[0].to_string(),
        });
    }

    let width = parse_dimension("width", fields[1])?;
    let height = parse_dimension("height", fields[2])?;
    if width == 0 || height == 0 {
        return Err(MapFormatError::ZeroDimension { width, height });
    }
    Ok(GridSize { width, height })
}

fn parse_dimension(field: &'static str, value: &str) -> Result<u32, MapFormatError> {
    value
        .parse::<u32>()
        .map_err(|_| MapFormatError::InvalidDimension {
            field,
            value: value.to_string(),
        })
}

/// Splits `a,b,c,` into `[a, b, c]`. The trailing terminator is required.
fn split_terminated<'a>(
    raw: &'a str,
    delimiter: char,
    segment: &'static str,
) -> Result<Vec<&'a str>, MapFormatError> {
    let inner = raw
        .strip_suffix(delimiter)
        .ok_or(MapFormatError::MissingTerminator { segment, delimiter })?;
    Ok(inner.split(delimiter).collect())
}
