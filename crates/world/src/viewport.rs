use crate::config::WorldContext;
use crate::geometry::{GridPosition, GridSize, PixelPosition, PixelSize};

/// Half-open grid rectangle `[start, end)` of tiles that may be on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportWindow {
    pub start: GridPosition,
    pub end: GridPosition,
}

impl ViewportWindow {
    pub fn is_empty(&self) -> bool {
        self.start.x >= self.end.x || self.start.y >= self.end.y
    }

    pub fn width(&self) -> u32 {
        (self.end.x - self.start.x).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.end.y - self.start.y).max(0) as u32
    }

    pub fn tile_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn contains(&self, position: GridPosition) -> bool {
        position.x >= self.start.x
            && position.x < self.end.x
            && position.y >= self.start.y
            && position.y < self.end.y
    }

    /// Cells row by row, left to right.
    pub fn positions(&self) -> impl Iterator<Item = GridPosition> {
        let ViewportWindow { start, end } = *self;
        (start.y..end.y).flat_map(move |y| (start.x..end.x).map(move |x| GridPosition { x, y }))
    }
}

/// Grid window under a camera, padded by the context's safety margin and
/// clamped so that `0 <= start <= end <= tile count` on both axes.
pub fn visible_window(
    camera_position: PixelPosition,
    camera_size: PixelSize,
    grid_size: GridSize,
    context: &WorldContext,
) -> ViewportWindow {
    let tile_size_px = context.tile_size_px.max(1);
    let margin = i64::from(context.viewport_margin_tiles);

    let (start_x, end_x) = axis_range(
        camera_position.x,
        camera_size.width,
        grid_size.width,
        tile_size_px,
        margin,
    );
    let (start_y, end_y) = axis_range(
        camera_position.y,
        camera_size.height,
        grid_size.height,
        tile_size_px,
        margin,
    );

    ViewportWindow {
        start: GridPosition {
            x: start_x,
            y: start_y,
        },
        end: GridPosition { x: end_x, y: end_y },
    }
}

fn axis_range(
    camera_px: f32,
    view_px: u32,
    tile_count: u32,
    tile_size_px: u32,
    margin: i64,
) -> (i32, i32) {
    let first_cell = if camera_px.is_finite() {
        (f64::from(camera_px) / f64::from(tile_size_px)).floor() as i64
    } else {
        0
    };
    let view_cells = i64::from(view_px / tile_size_px);
    let limit = i64::from(tile_count).min(i64::from(i32::MAX));

    let start = first_cell.saturating_sub(margin).clamp(0, limit);
    let end = first_cell
        .saturating_add(view_cells)
        .saturating_add(margin)
        .clamp(start, limit);
    (start as i32, end as i32)
}
