use crate::{error::PermissionError, jwt::SessionData, schema::Uuid};

/// Object-level actions that need more than a valid session. Reads are
/// open to everyone and never come through here.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ActionType {
    ManageOwnRecipes,
}

impl ActionType {
    pub fn authenticate(self, session: Option<&SessionData>, owner_id: Uuid) -> bool {
        match self {
            ActionType::ManageOwnRecipes => {
                session.is_some_and(|session| session.user_id == owner_id)
            }
        }
    }
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType, owner_id: Uuid) -> Result<(), potion::Error> {
        if !action.authenticate(Some(self), owner_id) {
            return Err(
                PermissionError::new("You don't have permission to perform this action").into(),
            );
        }
        Ok(())
    }
}
