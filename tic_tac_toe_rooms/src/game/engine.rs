use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::error::GameError;
use super::models::{
    Board, GameState, Play, Player, PlayerStats, Symbol, BOARD_CELLS, MAX_PLAYERS,
};
use super::rules::{ThreeInARow, WinRule};

/// Result of evaluating the board after a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GameStatus {
    Win {
        #[serde(skip_serializing_if = "Option::is_none")]
        winner: Option<String>,
        symbol: Symbol,
    },
    Draw,
    Ongoing {
        next_turn: Symbol,
    },
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameStatus::Ongoing { .. })
    }
}

/// Snapshot after a move, with the status it produced and the board as it
/// stood before any terminal reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: GameState,
    pub status: GameStatus,
    pub board: Board,
}

/// Stateless rule engine. Every operation consumes a snapshot and hands back
/// the next one.
#[derive(Debug, Clone, Default)]
pub struct Engine<R = ThreeInARow> {
    rule: R,
}

impl Engine<ThreeInARow> {
    pub fn new() -> Self {
        Self { rule: ThreeInARow }
    }
}

impl<R: WinRule> Engine<R> {
    pub fn with_rule(rule: R) -> Self {
        Self { rule }
    }

    pub fn create_room(&self, room_id: impl Into<String>) -> GameState {
        GameState::new(room_id)
    }

    pub fn add_player(&self, mut state: GameState, player: Player) -> Result<GameState, GameError> {
        if player.nickname.trim().is_empty() {
            return Err(GameError::InvalidNickname);
        }
        if state.players.contains_key(&player.nickname) {
            return Err(GameError::DuplicatePlayer(player.nickname));
        }
        if state.players.len() >= MAX_PLAYERS {
            return Err(GameError::RoomFull);
        }
        if state.holder_of(player.symbol).is_some() {
            return Err(GameError::SymbolTaken(player.symbol));
        }

        state
            .players_stats
            .entry(player.nickname.clone())
            .or_insert_with(|| PlayerStats::new(player.clone()));

        debug!(
            room_id = %state.room_id,
            nickname = %player.nickname,
            symbol = %player.symbol,
            "Player seated"
        );
        state.players.insert(player.nickname.clone(), player);
        Ok(state)
    }

    pub fn remove_player(&self, mut state: GameState, nickname: &str) -> Result<GameState, GameError> {
        if state.players.remove(nickname).is_none() {
            return Err(GameError::PlayerNotFound(nickname.to_string()));
        }
        debug!(room_id = %state.room_id, nickname, "Player left");
        Ok(state)
    }

    pub fn apply_move(&self, mut state: GameState, play: &Play) -> Result<Transition, GameError> {
        let position = usize::try_from(play.position)
            .ok()
            .filter(|&p| p < BOARD_CELLS)
            .ok_or(GameError::InvalidPosition(play.position))?;

        let symbol = state
            .players
            .get(&play.nickname)
            .map(|p| p.symbol)
            .ok_or_else(|| GameError::PlayerNotFound(play.nickname.clone()))?;

        if symbol != state.turn {
            return Err(GameError::OutOfTurn {
                nickname: play.nickname.clone(),
                turn: state.turn,
            });
        }

        if !state.board.is_free(position) {
            return Err(GameError::CellOccupied {
                position,
                free_positions: state.board.free_positions(),
            });
        }

        state.board.place(position, symbol);
        state.turn = symbol.other();
        debug!(
            room_id = %state.room_id,
            nickname = %play.nickname,
            position,
            board = %state.board,
            "Move applied"
        );

        let board = state.board.clone();
        let status = self.check_status(&mut state);
        Ok(Transition {
            state,
            status,
            board,
        })
    }

    /// Scores a finished match and resets the room; leaves an ongoing one alone.
    pub fn check_status(&self, state: &mut GameState) -> GameStatus {
        let status = if let Some(symbol) = self.rule.winner(&state.board) {
            let winner = state.holder_of(symbol).map(|p| p.nickname.clone());
            if let Some(winner) = &winner {
                for player in state.players.values() {
                    let stats = stats_for(&mut state.players_stats, player);
                    if player.nickname == *winner {
                        stats.wins += 1;
                    } else {
                        stats.losses += 1;
                    }
                }
            }
            info!(room_id = %state.room_id, ?winner, %symbol, "Match won");
            GameStatus::Win { winner, symbol }
        } else if state.board.is_full() {
            for player in state.players.values() {
                stats_for(&mut state.players_stats, player).draws += 1;
            }
            info!(room_id = %state.room_id, "Match drawn");
            GameStatus::Draw
        } else {
            GameStatus::Ongoing {
                next_turn: state.turn,
            }
        };

        if status.is_terminal() {
            state.reset();
        }
        status
    }
}

fn stats_for<'a>(
    stats: &'a mut BTreeMap<String, PlayerStats>,
    player: &Player,
) -> &'a mut PlayerStats {
    stats
        .entry(player.nickname.clone())
        .or_insert_with(|| PlayerStats::new(player.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::models::Cell;

    fn seated() -> GameState {
        let engine = Engine::new();
        let state = engine.create_room("r1");
        let state = engine
            .add_player(state, Player::new("alice", Symbol::X))
            .unwrap();
        engine
            .add_player(state, Player::new("bob", Symbol::O))
            .unwrap()
    }

    fn play_all(mut state: GameState, moves: &[(&str, i64)]) -> Transition {
        let engine = Engine::new();
        let (last, rest) = moves.split_last().unwrap();
        for (nickname, position) in rest {
            state = engine
                .apply_move(state, &Play::new(*nickname, *position))
                .unwrap()
                .state;
        }
        engine
            .apply_move(state, &Play::new(last.0, last.1))
            .unwrap()
    }

    #[test]
    fn create_room_is_blank() {
        let state = Engine::new().create_room("r1");
        assert_eq!(state.room_id, "r1");
        assert_eq!(state.board, Board::new());
        assert_eq!(state.turn, Symbol::X);
        assert!(state.players.is_empty());
        assert!(state.players_stats.is_empty());
    }

    #[test]
    fn join_seeds_zeroed_stats() {
        let state = seated();
        assert_eq!(state.players.len(), 2);
        assert_eq!(
            state.players_stats["alice"],
            PlayerStats::new(Player::new("alice", Symbol::X))
        );
    }

    #[test]
    fn third_player_is_rejected_as_room_full() {
        let err = Engine::new()
            .add_player(seated(), Player::new("carol", Symbol::X))
            .unwrap_err();
        assert_eq!(err, GameError::RoomFull);
    }

    #[test]
    fn taken_symbol_is_rejected() {
        let engine = Engine::new();
        let state = engine
            .add_player(engine.create_room("r1"), Player::new("alice", Symbol::X))
            .unwrap();
        let err = engine
            .add_player(state, Player::new("bob", Symbol::X))
            .unwrap_err();
        assert_eq!(err, GameError::SymbolTaken(Symbol::X));
    }

    #[test]
    fn rejoining_seated_nickname_is_duplicate() {
        let engine = Engine::new();
        let state = engine
            .add_player(engine.create_room("r1"), Player::new("alice", Symbol::X))
            .unwrap();
        let err = engine
            .add_player(state, Player::new("alice", Symbol::O))
            .unwrap_err();
        assert_eq!(err, GameError::DuplicatePlayer("alice".into()));
    }

    #[test]
    fn blank_nickname_is_rejected() {
        let engine = Engine::new();
        let err = engine
            .add_player(engine.create_room("r1"), Player::new("  ", Symbol::X))
            .unwrap_err();
        assert_eq!(err, GameError::InvalidNickname);
    }

    #[test]
    fn leave_keeps_stats() {
        let engine = Engine::new();
        let state = engine.remove_player(seated(), "bob").unwrap();
        assert!(!state.players.contains_key("bob"));
        assert!(state.players_stats.contains_key("bob"));
        assert_eq!(
            engine.remove_player(state, "bob").unwrap_err(),
            GameError::PlayerNotFound("bob".into())
        );
    }

    #[test]
    fn move_writes_symbol_and_flips_turn() {
        let engine = Engine::new();
        for position in 0..BOARD_CELLS as i64 {
            let t = engine
                .apply_move(seated(), &Play::new("alice", position))
                .unwrap();
            assert_eq!(
                t.state.board.get(position as usize),
                Some(Cell::Taken(Symbol::X))
            );
            assert_eq!(t.state.turn, Symbol::O);
            assert_eq!(
                t.status,
                GameStatus::Ongoing {
                    next_turn: Symbol::O
                }
            );
        }
    }

    #[test]
    fn same_cell_twice_is_occupied() {
        let engine = Engine::new();
        let state = engine
            .apply_move(seated(), &Play::new("alice", 4))
            .unwrap()
            .state;
        let err = engine
            .apply_move(state, &Play::new("bob", 4))
            .unwrap_err();
        assert_eq!(
            err,
            GameError::CellOccupied {
                position: 4,
                free_positions: vec![0, 1, 2, 3, 5, 6, 7, 8],
            }
        );
    }

    #[test]
    fn out_of_turn_after_own_move() {
        let engine = Engine::new();
        let state = engine
            .apply_move(seated(), &Play::new("alice", 0))
            .unwrap()
            .state;
        let err = engine
            .apply_move(state, &Play::new("alice", 1))
            .unwrap_err();
        assert_eq!(
            err,
            GameError::OutOfTurn {
                nickname: "alice".into(),
                turn: Symbol::O
            }
        );
    }

    #[test]
    fn validation_order() {
        let engine = Engine::new();
        assert_eq!(
            engine
                .apply_move(seated(), &Play::new("nobody", 9))
                .unwrap_err(),
            GameError::InvalidPosition(9)
        );
        assert_eq!(
            engine
                .apply_move(seated(), &Play::new("nobody", -1))
                .unwrap_err(),
            GameError::InvalidPosition(-1)
        );
        assert_eq!(
            engine
                .apply_move(seated(), &Play::new("nobody", 0))
                .unwrap_err(),
            GameError::PlayerNotFound("nobody".into())
        );
        let state = engine
            .apply_move(seated(), &Play::new("alice", 0))
            .unwrap()
            .state;
        // Out of turn wins over the occupied cell.
        assert!(matches!(
            engine.apply_move(state, &Play::new("alice", 0)),
            Err(GameError::OutOfTurn { .. })
        ));
    }

    #[test]
    fn win_scores_and_resets() {
        let t = play_all(
            seated(),
            &[("alice", 0), ("bob", 3), ("alice", 1), ("bob", 4), ("alice", 2)],
        );
        assert_eq!(t.board.to_string(), "XXXOO    ");
        assert_eq!(
            t.status,
            GameStatus::Win {
                winner: Some("alice".into()),
                symbol: Symbol::X
            }
        );
        assert_eq!(t.state.players_stats["alice"].wins, 1);
        assert_eq!(t.state.players_stats["alice"].losses, 0);
        assert_eq!(t.state.players_stats["bob"].losses, 1);
        assert_eq!(t.state.players_stats["bob"].wins, 0);
        assert_eq!(t.state.board, Board::new());
        assert_eq!(t.state.turn, Symbol::X);
        assert!(t.state.players.is_empty());
    }

    #[test]
    fn o_can_win_on_a_column() {
        let t = play_all(
            seated(),
            &[
                ("alice", 0),
                ("bob", 2),
                ("alice", 1),
                ("bob", 5),
                ("alice", 3),
                ("bob", 8),
            ],
        );
        assert_eq!(t.board.to_string(), "XXOX O  O");
        assert_eq!(
            t.status,
            GameStatus::Win {
                winner: Some("bob".into()),
                symbol: Symbol::O
            }
        );
        assert_eq!(t.state.players_stats["bob"].wins, 1);
        assert_eq!(t.state.players_stats["alice"].losses, 1);
    }

    #[test]
    fn full_board_is_a_draw() {
        // X O X
        // X O O
        // O X X
        let t = play_all(
            seated(),
            &[
                ("alice", 0),
                ("bob", 1),
                ("alice", 2),
                ("bob", 4),
                ("alice", 3),
                ("bob", 5),
                ("alice", 7),
                ("bob", 6),
                ("alice", 8),
            ],
        );
        assert_eq!(t.board.to_string(), "XOXXOOOXX");
        assert_eq!(t.status, GameStatus::Draw);
        for nickname in ["alice", "bob"] {
            let stats = &t.state.players_stats[nickname];
            assert_eq!((stats.wins, stats.losses, stats.draws), (0, 0, 1));
        }
        assert!(t.state.players.is_empty());
        assert_eq!(t.state.board, Board::new());
    }

    #[test]
    fn stats_accumulate_across_matches() {
        let engine = Engine::new();
        let first = play_all(
            seated(),
            &[("alice", 0), ("bob", 3), ("alice", 1), ("bob", 4), ("alice", 2)],
        );
        let state = engine
            .add_player(first.state, Player::new("alice", Symbol::O))
            .unwrap();
        let state = engine
            .add_player(state, Player::new("bob", Symbol::X))
            .unwrap();
        // Rejoining keeps the running totals.
        assert_eq!(state.players_stats["alice"].wins, 1);
        assert_eq!(state.players_stats["bob"].losses, 1);

        let second = play_all(
            state,
            &[("bob", 0), ("alice", 3), ("bob", 1), ("alice", 4), ("bob", 2)],
        );
        assert_eq!(second.state.players_stats["alice"].wins, 1);
        assert_eq!(second.state.players_stats["alice"].losses, 1);
        assert_eq!(second.state.players_stats["bob"].wins, 1);
        assert_eq!(second.state.players_stats["bob"].losses, 1);
    }

    #[test]
    fn check_status_leaves_ongoing_match_untouched() {
        let engine = Engine::new();
        let mut state = engine
            .apply_move(seated(), &Play::new("alice", 4))
            .unwrap()
            .state;
        let before = state.clone();
        assert_eq!(
            engine.check_status(&mut state),
            GameStatus::Ongoing {
                next_turn: Symbol::O
            }
        );
        assert_eq!(state, before);
    }

    #[test]
    fn win_is_credited_by_player_nickname() {
        let mut state = GameState::new("r1");
        state.board = "XX OO    ".parse().unwrap();
        state
            .players
            .insert("alice".into(), Player::new("mallory", Symbol::X));
        state
            .players
            .insert("carl".into(), Player::new("carl", Symbol::O));

        let t = Engine::new()
            .apply_move(state, &Play::new("alice", 2))
            .unwrap();
        assert_eq!(
            t.status,
            GameStatus::Win {
                winner: Some("mallory".into()),
                symbol: Symbol::X
            }
        );
        let mallory = &t.state.players_stats["mallory"];
        assert_eq!((mallory.wins, mallory.losses), (1, 0));
        let carl = &t.state.players_stats["carl"];
        assert_eq!((carl.wins, carl.losses), (0, 1));
    }

    struct NeverWins;

    impl WinRule for NeverWins {
        fn winner(&self, _: &Board) -> Option<Symbol> {
            None
        }
    }

    #[test]
    fn rule_is_pluggable() {
        let engine = Engine::with_rule(NeverWins);
        let mut state = seated();
        for (nickname, position) in [("alice", 0), ("bob", 3), ("alice", 1), ("bob", 4)] {
            state = engine
                .apply_move(state, &Play::new(nickname, position))
                .unwrap()
                .state;
        }
        let t = engine.apply_move(state, &Play::new("alice", 2)).unwrap();
        assert_eq!(
            t.status,
            GameStatus::Ongoing {
                next_turn: Symbol::O
            }
        );
    }
}
