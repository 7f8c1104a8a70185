#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Snake Duel adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use snake_duel_core::{CellCoord, Direction, GameMode, GameOverCause, Phase, SnakeId};
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Steering direction requested by the player on this frame.
    pub steer: Option<Direction>,
    /// Whether the adapter detected a request to start an agent-only game.
    pub start_agent_only: bool,
    /// Whether the adapter detected a request to start a player game.
    pub start_player_vs_agent: bool,
    /// Whether the adapter detected a restart request after a game ended.
    pub restart: bool,
    /// Whether the adapter detected a request to return to the menu.
    pub return_to_menu: bool,
}

/// Board geometry and styling used when presenting the play area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardPresentation {
    /// Number of cell columns laid out on the board.
    pub columns: u32,
    /// Number of cell rows laid out on the board.
    pub rows: u32,
    /// Edge length of a single square cell in world units.
    pub cell_size: f32,
    /// Color used for the grid lines and outer border.
    pub line_color: Color,
}

impl BoardPresentation {
    /// Creates a new board presentation, validating the cell size.
    pub fn new(
        columns: u32,
        rows: u32,
        cell_size: f32,
        line_color: Color,
    ) -> Result<Self, RenderingError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(RenderingError::InvalidCellSize { cell_size });
        }

        Ok(Self {
            columns,
            rows,
            cell_size,
            line_color,
        })
    }

    /// Width of the play area in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_size
    }

    /// Height of the play area in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }

    /// Center of the given cell in world units, origin at the top left.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            (cell.column() as f32 + 0.5) * self.cell_size,
            (cell.row() as f32 + 0.5) * self.cell_size,
        )
    }

    /// Top-left corner of the given cell in world units.
    #[must_use]
    pub fn cell_origin(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            cell.column() as f32 * self.cell_size,
            cell.row() as f32 * self.cell_size,
        )
    }
}

/// Snake visible within the play area, positioned using cell coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct SnakePresentation {
    /// Identity of the presented snake.
    pub id: SnakeId,
    /// Body cells ordered head-first.
    pub cells: Vec<CellCoord>,
    /// Fill color used for the body segments.
    pub body_color: Color,
    /// Fill color used for the head segment.
    pub head_color: Color,
}

impl SnakePresentation {
    /// Creates a snake presentation, deriving the head color from the body.
    #[must_use]
    pub fn new(id: SnakeId, cells: Vec<CellCoord>, body_color: Color) -> Self {
        Self {
            id,
            cells,
            body_color,
            head_color: body_color.lighten(0.35),
        }
    }
}

/// Current scores shown alongside the play area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Scoreboard {
    /// Food cells consumed by the player snake.
    pub player: u32,
    /// Food cells consumed by the agent snake.
    pub agent: u32,
}

/// One-shot presentation cues derived from phase transitions.
///
/// Backends use cues to trigger transition effects exactly once rather
/// than re-deriving edges from the phase every frame; frames without a
/// transition carry no cue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionCue {
    /// The menu became the active surface.
    MenuEntered,
    /// A game session started.
    GameStarted,
    /// The running session ended.
    GameOver,
}

/// Terminal outcome shown on the game-over overlay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutcomePresentation {
    /// Collision or bounds violation that ended the session.
    pub cause: GameOverCause,
    /// Banner text summarizing the outcome.
    pub headline: String,
}

/// Scene description combining the board, both snakes and the session state.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Board geometry that composes the play area.
    pub board: BoardPresentation,
    /// Snakes currently visible within the play area.
    pub snakes: Vec<SnakePresentation>,
    /// Obstacle cells drawn as solid blocks.
    pub obstacles: Vec<CellCoord>,
    /// Color used for obstacle cells.
    pub obstacle_color: Color,
    /// Food cell, absent between consumption and the next placement.
    pub food: Option<CellCoord>,
    /// Color used for the food cell.
    pub food_color: Color,
    /// Mode of the presented session.
    pub mode: GameMode,
    /// Phase of the game loop driving which surface is shown.
    pub phase: Phase,
    /// Scores shown alongside the play area.
    pub scoreboard: Scoreboard,
    /// Cue raised by a phase transition on this frame, if any.
    pub cue: Option<SessionCue>,
    /// Outcome details, present once the session has ended.
    pub outcome: Option<OutcomePresentation>,
}

impl Scene {
    /// Creates a scene showing the menu surface for the given board.
    #[must_use]
    pub fn menu(board: BoardPresentation) -> Self {
        Self {
            board,
            snakes: Vec::new(),
            obstacles: Vec::new(),
            obstacle_color: Color::from_rgb_u8(96, 96, 96),
            food: None,
            food_color: Color::from_rgb_u8(220, 60, 60),
            mode: GameMode::AgentOnly,
            phase: Phase::Idle,
            scoreboard: Scoreboard::default(),
            cue: Some(SessionCue::MenuEntered),
            outcome: None,
        }
    }
}

/// Banner text for a finished session.
///
/// Player-versus-agent outcomes are decided by comparing final scores, so
/// the snake that crashed can still win on food eaten; equal scores are a
/// draw. Agent-only sessions report the crash.
#[must_use]
pub fn outcome_headline(mode: GameMode, scores: Scoreboard) -> String {
    match mode {
        GameMode::AgentOnly => format!("The agent crashed with {} food eaten.", scores.agent),
        GameMode::PlayerVsAgent => {
            if scores.player > scores.agent {
                "Game over. You win!".to_owned()
            } else if scores.agent > scores.player {
                "Game over. The agent wins!".to_owned()
            } else {
                "Game over. It's a tie!".to_owned()
            }
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Snake Duel scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// per-frame input captured by the adapter, and may mutate the scene
    /// before it is rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Cell sizes must be positive and finite to produce a drawable board.
    InvalidCellSize {
        /// Provided cell size that failed validation.
        cell_size: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize { cell_size } => {
                write!(f, "cell_size must be positive (received {cell_size})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> BoardPresentation {
        BoardPresentation::new(20, 20, 24.0, Color::from_rgb_u8(40, 40, 40))
            .expect("positive cell_size should succeed")
    }

    #[test]
    fn board_creation_rejects_non_positive_cell_size() {
        let error = BoardPresentation::new(20, 20, 0.0, Color::from_rgb_u8(0, 0, 0))
            .expect_err("zero cell_size must be rejected");

        assert!(matches!(
            error,
            RenderingError::InvalidCellSize { cell_size } if cell_size == 0.0
        ));
    }

    #[test]
    fn cell_center_lands_in_the_middle_of_the_cell() {
        let board = board();

        assert_eq!(
            board.cell_center(CellCoord::new(0, 0)),
            Vec2::new(12.0, 12.0)
        );
        assert_eq!(
            board.cell_center(CellCoord::new(3, 1)),
            Vec2::new(3.0 * 24.0 + 12.0, 24.0 + 12.0)
        );
    }

    #[test]
    fn lighten_moves_channels_towards_white_and_clamps() {
        let color = Color::from_rgb_u8(0, 128, 255);
        let lightened = color.lighten(2.0);

        assert_eq!(lightened, Color::new(1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn snake_presentation_derives_a_lighter_head() {
        let body = Color::from_rgb_u8(40, 160, 60);
        let snake = SnakePresentation::new(SnakeId::Player, Vec::new(), body);

        assert!(snake.head_color.red > snake.body_color.red);
        assert!(snake.head_color.green > snake.body_color.green);
    }

    #[test]
    fn versus_headline_is_decided_by_score() {
        let winning = outcome_headline(
            GameMode::PlayerVsAgent,
            Scoreboard {
                player: 5,
                agent: 2,
            },
        );
        assert_eq!(winning, "Game over. You win!");

        // Crashing first does not matter; the trailing score loses.
        let losing = outcome_headline(
            GameMode::PlayerVsAgent,
            Scoreboard {
                player: 2,
                agent: 5,
            },
        );
        assert_eq!(losing, "Game over. The agent wins!");
    }

    #[test]
    fn equal_scores_declare_a_tie() {
        let headline = outcome_headline(
            GameMode::PlayerVsAgent,
            Scoreboard {
                player: 3,
                agent: 3,
            },
        );

        assert_eq!(headline, "Game over. It's a tie!");
    }

    #[test]
    fn agent_only_headline_reports_the_score() {
        let headline = outcome_headline(
            GameMode::AgentOnly,
            Scoreboard {
                player: 0,
                agent: 7,
            },
        );

        assert_eq!(headline, "The agent crashed with 7 food eaten.");
    }
}
