//! Saved position and settings persistence port trait.

use crate::domain::error::PosCheckError;
use crate::domain::saved_position::{NewPosition, SavedPosition};
use crate::domain::validation::PositionInput;

pub trait PositionStorePort {
    /// Last-used form values; `None` when nothing has been stored yet.
    fn load_settings(&self) -> Result<Option<PositionInput>, PosCheckError>;

    fn save_settings(&self, settings: &PositionInput) -> Result<(), PosCheckError>;

    /// All saved positions in insertion order.
    fn list_positions(&self) -> Result<Vec<SavedPosition>, PosCheckError>;

    fn add_position(&self, position: NewPosition) -> Result<SavedPosition, PosCheckError>;

    /// Returns `false` when no position had that id.
    fn delete_position(&self, id: u64) -> Result<bool, PosCheckError>;

    fn get_position(&self, id: u64) -> Result<Option<SavedPosition>, PosCheckError> {
        Ok(self.list_positions()?.into_iter().find(|p| p.id == id))
    }
}
