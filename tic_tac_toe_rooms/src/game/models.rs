use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::BTreeMap, fmt, str::FromStr};
use thiserror::Error;
use tracing::debug;

/// Number of cells on the board, indexed row-major from 0.
pub const BOARD_CELLS: usize = 9;

pub const MAX_PLAYERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    pub fn other(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Symbol::X => 'X',
            Symbol::O => 'O',
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Taken(Symbol),
}

impl Cell {
    fn as_char(self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::Taken(symbol) => symbol.as_char(),
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            ' ' => Some(Cell::Empty),
            'X' => Some(Cell::Taken(Symbol::X)),
            'O' => Some(Cell::Taken(Symbol::O)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardParseError {
    #[error("board must have {BOARD_CELLS} cells, found {0}")]
    Length(usize),
    #[error("invalid cell {found:?} at position {index}")]
    Cell { index: usize, found: char },
}

/// The 3x3 grid. Persisted as a 9-character string, space for an empty cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    cells: [Cell; BOARD_CELLS],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, position: usize) -> Option<Cell> {
        self.cells.get(position).copied()
    }

    pub fn cells(&self) -> &[Cell; BOARD_CELLS] {
        &self.cells
    }

    pub fn is_free(&self, position: usize) -> bool {
        matches!(self.get(position), Some(Cell::Empty))
    }

    pub fn free_positions(&self) -> Vec<usize> {
        (0..BOARD_CELLS).filter(|&p| self.is_free(p)).collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&cell| cell != Cell::Empty)
    }

    // Callers validate the position and that the cell is free.
    pub(crate) fn place(&mut self, position: usize, symbol: Symbol) {
        debug_assert!(self.is_free(position));
        self.cells[position] = Cell::Taken(symbol);
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.cells
            .iter()
            .try_for_each(|cell| write!(f, "{}", cell.as_char()))
    }
}

impl FromStr for Board {
    type Err = BoardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let count = s.chars().count();
        if count != BOARD_CELLS {
            return Err(BoardParseError::Length(count));
        }

        let mut board = Board::new();
        for (index, found) in s.chars().enumerate() {
            board.cells[index] =
                Cell::from_char(found).ok_or(BoardParseError::Cell { index, found })?;
        }
        Ok(board)
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub nickname: String,
    #[serde(default = "first_turn")]
    pub symbol: Symbol,
}

impl Player {
    pub fn new(nickname: impl Into<String>, symbol: Symbol) -> Self {
        Self {
            nickname: nickname.into(),
            symbol,
        }
    }
}

/// Running totals for one nickname within a room. Never reset with the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player: Player,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub draws: u32,
}

impl PlayerStats {
    pub fn new(player: Player) -> Self {
        Self {
            player,
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }
}

/// Where a room sits in its match cycle, derived from the seated players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Empty,
    WaitingForOpponent,
    InProgress,
}

/// Full snapshot of one room; the unit of persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub room_id: String,
    #[serde(default)]
    pub board: Board,
    #[serde(default = "first_turn")]
    pub turn: Symbol,
    #[serde(default)]
    pub players: BTreeMap<String, Player>,
    #[serde(default)]
    pub players_stats: BTreeMap<String, PlayerStats>,
}

fn first_turn() -> Symbol {
    Symbol::X
}

impl GameState {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            board: Board::new(),
            turn: first_turn(),
            players: BTreeMap::new(),
            players_stats: BTreeMap::new(),
        }
    }

    /// Clears the board and the seats for the next match, keeping stats.
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.turn = first_turn();
        self.players.clear();

        debug!(
            room_id = %self.room_id,
            stats = self.players_stats.len(),
            "Room reset for next match"
        );
    }

    pub fn phase(&self) -> Phase {
        match self.players.len() {
            0 => Phase::Empty,
            1 => Phase::WaitingForOpponent,
            _ => Phase::InProgress,
        }
    }

    pub fn holder_of(&self, symbol: Symbol) -> Option<&Player> {
        self.players.values().find(|p| p.symbol == symbol)
    }

    pub fn to_snapshot(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a stored snapshot and rejects one that breaks the room invariants.
    pub fn from_snapshot(raw: &str) -> Result<Self, SnapshotError> {
        let state: GameState = serde_json::from_str(raw)?;
        state.validate()?;
        Ok(state)
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.players.len() > MAX_PLAYERS {
            return Err(SnapshotError::TooManyPlayers(self.players.len()));
        }
        for (key, player) in &self.players {
            if *key != player.nickname {
                return Err(SnapshotError::KeyMismatch {
                    key: key.clone(),
                    nickname: player.nickname.clone(),
                });
            }
            if !self.players_stats.contains_key(key) {
                return Err(SnapshotError::MissingStats(key.clone()));
            }
        }
        if let [a, b] = self.players.values().collect::<Vec<_>>()[..] {
            if a.symbol == b.symbol {
                return Err(SnapshotError::SharedSymbol(a.symbol));
            }
        }
        for (key, stats) in &self.players_stats {
            if *key != stats.player.nickname {
                return Err(SnapshotError::KeyMismatch {
                    key: key.clone(),
                    nickname: stats.player.nickname.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0} players seated, at most {MAX_PLAYERS} allowed")]
    TooManyPlayers(usize),
    #[error("both seated players hold {0}")]
    SharedSymbol(Symbol),
    #[error("entry {key:?} belongs to {nickname:?}")]
    KeyMismatch { key: String, nickname: String },
    #[error("seated player {0:?} has no stats")]
    MissingStats(String),
}

/// A move request. The position is signed so out-of-range values reach validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Play {
    pub nickname: String,
    pub position: i64,
}

impl Play {
    pub fn new(nickname: impl Into<String>, position: i64) -> Self {
        Self {
            nickname: nickname.into(),
            position,
        }
    }
}
