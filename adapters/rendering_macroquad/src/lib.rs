#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Snake Duel.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature. Consumers that need sound playback can opt back
//! in by enabling `macroquad/audio` in their own `Cargo.toml` dependency
//! specification.

use anyhow::Result;
use glam::Vec2;
use macroquad::input::{is_key_pressed, KeyCode};
use snake_duel_core::{CellCoord, Direction, Phase};
use snake_duel_rendering::{Color, FrameInput, Presentation, RenderingBackend, Scene};
use std::time::Duration;

/// Height in pixels reserved above the board for the score line.
const HUD_HEIGHT: f32 = 48.0;

/// Steering direction bound to an edge-triggered key, if any.
///
/// Arrow keys and WASD both steer, matching the browser convention of
/// supporting either hand position.
#[must_use]
fn direction_for(key: KeyCode) -> Option<Direction> {
    match key {
        KeyCode::Up | KeyCode::W => Some(Direction::North),
        KeyCode::Down | KeyCode::S => Some(Direction::South),
        KeyCode::Left | KeyCode::A => Some(Direction::West),
        KeyCode::Right | KeyCode::D => Some(Direction::East),
        _ => None,
    }
}

const STEER_KEYS: [KeyCode; 8] = [
    KeyCode::Up,
    KeyCode::Down,
    KeyCode::Left,
    KeyCode::Right,
    KeyCode::W,
    KeyCode::S,
    KeyCode::A,
    KeyCode::D,
];

/// Snapshot of edge-triggered keyboard input observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardState {
    quit_requested: bool,
    input: FrameInput,
}

impl KeyboardState {
    fn poll() -> Self {
        let quit_requested = is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q);
        let steer = STEER_KEYS
            .iter()
            .copied()
            .find(|key| is_key_pressed(*key))
            .and_then(direction_for);

        Self {
            quit_requested,
            input: FrameInput {
                steer,
                start_agent_only: is_key_pressed(KeyCode::Key1),
                start_player_vs_agent: is_key_pressed(KeyCode::Key2),
                restart: is_key_pressed(KeyCode::R) || is_key_pressed(KeyCode::Enter),
                return_to_menu: is_key_pressed(KeyCode::M),
            },
        }
    }
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
}

impl FpsCounter {
    /// Records a rendered frame and returns the average once a second passed.
    fn record_frame(&mut self, frame: Duration) -> Option<f32> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let per_second = if seconds <= f32::EPSILON {
            None
        } else {
            Some(self.frames as f32 / seconds)
        };
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        per_second
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Clone, Copy, Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the
    /// display refresh rate or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend prints frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 640,
            window_height: 688,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();

            loop {
                let keyboard = KeyboardState::poll();
                if keyboard.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);

                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));

                update_scene(frame_dt, keyboard.input, &mut scene);

                let metrics = SceneMetrics::from_scene(&scene, screen_width, screen_height);

                match scene.phase {
                    Phase::Idle => draw_menu(&scene, screen_width, screen_height),
                    Phase::Running => {
                        draw_board(&scene, &metrics);
                        draw_hud(&scene, &metrics);
                    }
                    Phase::Over => {
                        draw_board(&scene, &metrics);
                        draw_hud(&scene, &metrics);
                        draw_game_over_overlay(&scene, screen_width, screen_height);
                    }
                }

                if show_fps {
                    if let Some(per_second) = fps_counter.record_frame(frame_dt) {
                        println!("FPS: {per_second:.2}");
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Screen-space placement of the board computed once per frame.
#[derive(Clone, Copy, Debug)]
struct SceneMetrics {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
    cell_step: f32,
}

impl SceneMetrics {
    fn from_scene(scene: &Scene, screen_width: f32, screen_height: f32) -> Self {
        let world_width = scene.board.width();
        let world_height = scene.board.height();
        let available_height = (screen_height - HUD_HEIGHT).max(0.0);

        let scale = if world_width <= f32::EPSILON || world_height <= f32::EPSILON {
            1.0
        } else {
            (screen_width / world_width).min(available_height / world_height)
        };

        let scaled_width = world_width * scale;
        let scaled_height = world_height * scale;
        let offset_x = ((screen_width - scaled_width) * 0.5).max(0.0);
        let offset_y = HUD_HEIGHT + ((available_height - scaled_height) * 0.5).max(0.0);

        Self {
            scale,
            offset_x,
            offset_y,
            cell_step: scene.board.cell_size * scale,
        }
    }

    fn cell_origin(&self, scene: &Scene, cell: CellCoord) -> Vec2 {
        let origin = scene.board.cell_origin(cell);
        Vec2::new(
            self.offset_x + origin.x * self.scale,
            self.offset_y + origin.y * self.scale,
        )
    }
}

fn draw_menu(scene: &Scene, screen_width: f32, screen_height: f32) {
    let title_color = to_macroquad_color(Color::from_rgb_u8(230, 230, 230));
    let body_color = to_macroquad_color(scene.board.line_color.lighten(0.5));

    let center_x = screen_width * 0.5;
    draw_centered_text("Snake Duel", center_x, screen_height * 0.3, 48.0, title_color);
    draw_centered_text(
        "[1] Watch the agent",
        center_x,
        screen_height * 0.45,
        28.0,
        body_color,
    );
    draw_centered_text(
        "[2] Play against the agent",
        center_x,
        screen_height * 0.52,
        28.0,
        body_color,
    );
    draw_centered_text(
        "Arrows or WASD steer, Esc quits",
        center_x,
        screen_height * 0.64,
        22.0,
        body_color,
    );
}

fn draw_board(scene: &Scene, metrics: &SceneMetrics) {
    let line_color = to_macroquad_color(scene.board.line_color);
    let step = metrics.cell_step;
    let width = scene.board.width() * metrics.scale;
    let height = scene.board.height() * metrics.scale;

    for column in 0..=scene.board.columns {
        let x = metrics.offset_x + column as f32 * step;
        macroquad::shapes::draw_line(x, metrics.offset_y, x, metrics.offset_y + height, 1.0, line_color);
    }
    for row in 0..=scene.board.rows {
        let y = metrics.offset_y + row as f32 * step;
        macroquad::shapes::draw_line(metrics.offset_x, y, metrics.offset_x + width, y, 1.0, line_color);
    }

    let obstacle_color = to_macroquad_color(scene.obstacle_color);
    for cell in &scene.obstacles {
        let origin = metrics.cell_origin(scene, *cell);
        macroquad::shapes::draw_rectangle(origin.x, origin.y, step, step, obstacle_color);
    }

    if let Some(cell) = scene.food {
        let origin = metrics.cell_origin(scene, cell);
        macroquad::shapes::draw_circle(
            origin.x + step * 0.5,
            origin.y + step * 0.5,
            step * 0.4,
            to_macroquad_color(scene.food_color),
        );
    }

    for snake in &scene.snakes {
        let body_color = to_macroquad_color(snake.body_color);
        let head_color = to_macroquad_color(snake.head_color);
        for (index, cell) in snake.cells.iter().enumerate() {
            let origin = metrics.cell_origin(scene, *cell);
            let color = if index == 0 { head_color } else { body_color };
            let inset = step * 0.05;
            macroquad::shapes::draw_rectangle(
                origin.x + inset,
                origin.y + inset,
                step - inset * 2.0,
                step - inset * 2.0,
                color,
            );
        }
    }
}

fn draw_hud(scene: &Scene, metrics: &SceneMetrics) {
    let text_color = to_macroquad_color(Color::from_rgb_u8(230, 230, 230));
    let label = match scene.mode {
        snake_duel_core::GameMode::AgentOnly => {
            format!("Agent: {}", scene.scoreboard.agent)
        }
        snake_duel_core::GameMode::PlayerVsAgent => {
            format!(
                "You: {}   Agent: {}",
                scene.scoreboard.player, scene.scoreboard.agent
            )
        }
    };
    macroquad::text::draw_text(&label, metrics.offset_x, HUD_HEIGHT * 0.65, 28.0, text_color);
}

fn draw_game_over_overlay(scene: &Scene, screen_width: f32, screen_height: f32) {
    let shade = to_macroquad_color(Color::new(0.0, 0.0, 0.0, 0.6));
    macroquad::shapes::draw_rectangle(0.0, 0.0, screen_width, screen_height, shade);

    let text_color = to_macroquad_color(Color::from_rgb_u8(240, 240, 240));
    let center_x = screen_width * 0.5;
    if let Some(outcome) = &scene.outcome {
        draw_centered_text(
            &outcome.headline,
            center_x,
            screen_height * 0.45,
            36.0,
            text_color,
        );
    }
    draw_centered_text(
        "[R] Play again   [M] Menu",
        center_x,
        screen_height * 0.58,
        24.0,
        text_color,
    );
}

fn draw_centered_text(
    text: &str,
    center_x: f32,
    baseline_y: f32,
    font_size: f32,
    color: macroquad::color::Color,
) {
    let dimensions = macroquad::text::measure_text(text, None, font_size as u16, 1.0);
    macroquad::text::draw_text(
        text,
        center_x - dimensions.width * 0.5,
        baseline_y,
        font_size,
        color,
    );
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
