//! Chess primitives for the recorder: moves, the rules facade, the move log,
//! replay reconstruction and the saved-game record.

pub mod game;
pub mod game_data;
pub mod move_log;
pub mod moves;
pub mod pgn;
pub mod replay;

pub use game::{DrawReason, GameFacade, GameStatus, IllegalMove, Side, STARTING_FEN};
pub use game_data::{format_duration, NewSavedGame, SavedGame, SavedGameSummary};
pub use move_log::{MoveLog, MoveLogSealed};
pub use moves::{ParseMoveError, RecordedMove};
pub use replay::{reconstruct, ReconstructionError, ReplayCursor};

pub use shakmaty::{Role, Square};
