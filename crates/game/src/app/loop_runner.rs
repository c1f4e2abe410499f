use std::process::ExitCode;

use tracing::{debug, error, info};
use world::{
    save_map, Action, AudioSink, Camera, Camera2D, MapFileFormat, PixelPosition, PixelSize,
    TileGrid, ViewportWindow,
};

use super::bootstrap::AppWiring;

/// Per-frame draw tally for the tiles inside the viewport window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FrameStats {
    pub(crate) visited: usize,
    pub(crate) sprites: usize,
    pub(crate) placeholders: usize,
}

struct LoggingAudio;

impl AudioSink for LoggingAudio {
    fn play_sound(&mut self, sound_name: &str) {
        debug!(sound = sound_name, "audio_play_requested");
    }
}

pub(crate) fn run(mut app: AppWiring) -> ExitCode {
    let context = app.config.world;
    let map_px = app.map.pixel_size(&context);
    let dt = app.config.frame_dt_seconds();
    let metrics_interval = app.config.metrics_log_interval_frames.max(1);
    let mut velocity = PixelPosition::new(
        app.config.camera_speed_px_per_frame,
        app.config.camera_speed_px_per_frame * 0.5,
    );
    let mut audio = LoggingAudio;
    let mut action: Option<Action> = None;
    let mut totals = FrameStats::default();

    for frame in 0..app.config.frames {
        velocity = pan_camera(&mut app.camera, velocity, map_px);

        let cast_interval = app.config.cast_interval_frames;
        if cast_interval > 0 && frame % cast_interval == 0 {
            let can_start = action
                .as_ref()
                .map_or(true, |current| current.is_done() || current.is_interruptible());
            if can_start {
                action = Some(Action::cast());
            }
        }
        if let Some(current) = action.as_mut() {
            current.play_sound(&mut audio);
            current.update(dt);
            if current.is_done() {
                action = None;
            }
        }

        let window = app.map.visible_window(&app.camera, &context);
        let stats = draw_visible_tiles(&app.map, window);
        totals.visited += stats.visited;
        totals.sprites += stats.sprites;
        totals.placeholders += stats.placeholders;

        if frame % metrics_interval == 0 {
            info!(
                frame,
                camera_x = app.camera.position().x,
                camera_y = app.camera.position().y,
                window_start_x = window.start.x,
                window_start_y = window.start.y,
                window_end_x = window.end.x,
                window_end_y = window.end.y,
                visited = stats.visited,
                sprites = stats.sprites,
                placeholders = stats.placeholders,
                animation = action.as_ref().map_or("idle", Action::animation_name),
                "frame_metrics"
            );
        }
    }

    let sample = app.map.random_position(&context, &mut app.rng);
    info!(
        frames = app.config.frames,
        tiles_visited = totals.visited,
        sprites_drawn = totals.sprites,
        placeholders_drawn = totals.placeholders,
        sample_x = sample.x,
        sample_y = sample.y,
        sample_cell = ?context.pixel_to_grid(sample),
        "run_complete"
    );

    if let Some(path) = &app.save_path {
        if let Err(err) = save_map(path, &app.map, MapFileFormat::from_path(path)) {
            error!(error = %err, "map_save_failed");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

/// Moves the camera by `velocity`, bouncing off the map edges. Returns the
/// velocity to use next frame.
pub(crate) fn pan_camera(
    camera: &mut Camera2D,
    velocity: PixelPosition,
    map_px: PixelSize,
) -> PixelPosition {
    let mut next = velocity;
    let before = camera.position;
    camera.position.x += velocity.x;
    camera.position.y += velocity.y;
    camera.clamp_within(map_px);

    if camera.position.x != before.x + velocity.x {
        next.x = -velocity.x;
    }
    if camera.position.y != before.y + velocity.y {
        next.y = -velocity.y;
    }
    next
}

/// Visits only the cells inside `window`. Tiles without a resolved sprite
/// count as placeholders.
pub(crate) fn draw_visible_tiles(map: &TileGrid, window: ViewportWindow) -> FrameStats {
    let mut stats = FrameStats::default();
    for position in window.positions() {
        let Some(tile) = map.tile(position) else {
            continue;
        };
        stats.visited += 1;
        if tile.graphics().is_some() {
            stats.sprites += 1;
        } else {
            stats.placeholders += 1;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use world::{
        GridPosition, GridSize, Sprite, SpriteLibrary, Tile, WorldContext, DEFAULT_TILE_KEY,
    };

    use super::*;

    #[test]
    fn draw_counts_only_window_cells() {
        let sprites = SpriteLibrary::new()
            .with_sprite(DEFAULT_TILE_KEY, Sprite::solid(1, 1, [0, 255, 0, 255]))
            .expect("sprite");
        let mut map = TileGrid::new(GridSize::new(10, 10), &sprites).expect("map");
        map.set_tile(GridPosition::new(1, 1), Tile::unresolved("tile/void").expect("tile"))
            .expect("set");

        let context = WorldContext::new(32).expect("context");
        let camera = Camera2D::new(PixelPosition::new(40.0, 40.0), PixelSize::new(64, 64));
        let window = map.visible_window(&camera, &context);
        let stats = draw_visible_tiles(&map, window);
        assert_eq!(
            stats,
            FrameStats {
                visited: 25,
                sprites: 24,
                placeholders: 1
            }
        );
    }

    #[test]
    fn empty_window_draws_nothing() {
        let map = TileGrid::new(GridSize::new(4, 4), &SpriteLibrary::new()).expect("map");
        let context = WorldContext::new(32).expect("context");
        let camera = Camera2D::new(PixelPosition::new(-5000.0, 0.0), PixelSize::new(64, 64));
        let window = map.visible_window(&camera, &context);
        assert!(window.is_empty());
        assert_eq!(draw_visible_tiles(&map, window), FrameStats::default());
    }

    #[test]
    fn pan_camera_bounces_off_map_edges() {
        let map_px = PixelSize::new(200, 200);
        let mut camera = Camera2D::new(PixelPosition::new(95.0, 0.0), PixelSize::new(100, 100));
        let next = pan_camera(&mut camera, PixelPosition::new(10.0, -4.0), map_px);
        assert_eq!(camera.position, PixelPosition::new(100.0, 0.0));
        assert_eq!(next, PixelPosition::new(-10.0, 4.0));

        let next = pan_camera(&mut camera, next, map_px);
        assert_eq!(camera.position, PixelPosition::new(90.0, 4.0));
        assert_eq!(next, PixelPosition::new(-10.0, 4.0));
    }
}
