use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    selector::{AxisSelection, AXIS_LEN},
    MembershipValidator, RarityClassifier, UsageTracker,
};
use crate::{
    db::GridStore,
    error::GameError,
    models::{AnswerKey, Category, CellPosition, GridCell, User},
};

pub const GRID_SIZE: usize = AXIS_LEN;

/// One play session's board: its axis labels, the nine cells, and which cell
/// (if any) is currently open for an answer
#[derive(Debug)]
pub struct GridState {
    game_id: Uuid,
    rows: [Category; GRID_SIZE],
    columns: [Category; GRID_SIZE],
    cells: [[GridCell; GRID_SIZE]; GRID_SIZE],
    active_cell: Option<CellPosition>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl GridState {
    /// Build an empty board. All six categories must be distinct.
    pub fn new(selection: AxisSelection) -> Result<Self, GameError> {
        let mut seen = HashSet::with_capacity(GRID_SIZE * 2);
        for category in selection.rows.iter().chain(selection.columns.iter()) {
            if !seen.insert(category.id) {
                return Err(GameError::DuplicateCategory(category.id));
            }
        }

        let now = Utc::now();
        Ok(Self {
            game_id: Uuid::new_v4(),
            rows: selection.rows,
            columns: selection.columns,
            cells: Default::default(),
            active_cell: None,
            created_at: now,
            last_activity: now,
        })
    }

    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    pub fn row_categories(&self) -> &[Category; GRID_SIZE] {
        &self.rows
    }

    pub fn column_categories(&self) -> &[Category; GRID_SIZE] {
        &self.columns
    }

    pub fn active_cell(&self) -> Option<CellPosition> {
        self.active_cell
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    fn check_bounds(row: usize, col: usize) -> Result<(), GameError> {
        if row >= GRID_SIZE || col >= GRID_SIZE {
            return Err(GameError::CellOutOfBounds { row, col });
        }
        Ok(())
    }

    pub fn current_cell(&self, row: usize, col: usize) -> Result<&GridCell, GameError> {
        Self::check_bounds(row, col)?;
        Ok(&self.cells[row][col])
    }

    /// Cells in row-major order with their positions
    pub fn cells(&self) -> impl Iterator<Item = (CellPosition, &GridCell)> {
        self.cells.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(move |(col, cell)| (CellPosition { row, col }, cell))
        })
    }

    /// Open a cell for answering. Any previously open cell is closed.
    /// Empty and incorrect cells can be opened; correct ones are locked.
    pub fn select_cell(&mut self, row: usize, col: usize) -> Result<(), GameError> {
        Self::check_bounds(row, col)?;
        if self.cells[row][col].is_locked() {
            return Err(GameError::CellLocked { row, col });
        }

        self.active_cell = Some(CellPosition { row, col });
        self.last_activity = Utc::now();
        Ok(())
    }

    /// Close the open cell without answering
    pub fn close_selection(&mut self) {
        self.active_cell = None;
        self.last_activity = Utc::now();
    }

    /// Answer the open cell with `user`.
    ///
    /// The cell is written once, after every lookup has finished, so a
    /// submission either lands completely or leaves the cell untouched.
    /// Store failures never fail the submission: an unverifiable answer is
    /// incorrect, a failed usage write is skipped, and a failed statistics
    /// read yields a common rarity.
    pub async fn submit_answer(
        &mut self,
        store: &dyn GridStore,
        user: User,
    ) -> Result<GridCell, GameError> {
        let CellPosition { row, col } = self.active_cell.ok_or(GameError::NoActiveCell)?;
        if self.cells[row][col].is_locked() {
            self.active_cell = None;
            return Err(GameError::CellLocked { row, col });
        }

        let key = AnswerKey::new(user.id, self.rows[row].id, self.columns[col].id);
        let correct = MembershipValidator::new(store)
            .is_valid_answer(key.user_id, key.row_category_id, key.column_category_id)
            .await;

        let cell = if correct {
            match UsageTracker::new(store).record_correct_answer(key).await {
                Ok(count) => tracing::debug!("Answer {:?} now used {} times", key, count),
                Err(e) => tracing::warn!("Failed to record answer usage, skipping: {}", e),
            }
            let rarity = RarityClassifier::new(store).classify(key).await;
            GridCell::Correct { user, rarity }
        } else {
            GridCell::Incorrect { user }
        };

        tracing::info!(
            "Game {}: cell ({}, {}) answered with {} -> {:?}",
            self.game_id,
            row,
            col,
            cell.user().map(User::display_name).unwrap_or_default(),
            cell.is_correct()
        );

        self.cells[row][col] = cell.clone();
        self.active_cell = None;
        self.last_activity = Utc::now();
        Ok(cell)
    }

    pub fn correct_count(&self) -> usize {
        self.cells().filter(|(_, cell)| cell.is_locked()).count()
    }

    /// Every cell holds a correct answer
    pub fn is_complete(&self) -> bool {
        self.correct_count() == GRID_SIZE * GRID_SIZE
    }
}
