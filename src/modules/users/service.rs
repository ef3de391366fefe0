use inkwell_auth::Role;
use inkwell_core::{AppError, PaginationMeta, PaginationParams};
use inkwell_models::{
    PaginatedUsersResponse, UpdateUserDto, User, UserChanges, UserId, UserProfile,
};
use tracing::{info, instrument};

use crate::state::AppState;

pub struct UserService;

impl UserService {
    #[instrument(skip(state))]
    pub async fn list_users(
        state: &AppState,
        params: PaginationParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let (data, total) = state
            .storage
            .users
            .list(params.offset(), params.limit())
            .await?;

        Ok(PaginatedUsersResponse {
            data,
            meta: PaginationMeta::new(&params, total),
        })
    }

    /// Deactivated accounts are only visible to admins.
    #[instrument(skip(state, viewer))]
    pub async fn get_profile(
        state: &AppState,
        id: UserId,
        viewer: Option<&User>,
    ) -> Result<UserProfile, AppError> {
        let user = state
            .storage
            .users
            .find_by_id(id)
            .await?
            .filter(|user| user.is_active || viewer.is_some_and(User::is_admin))
            .ok_or_else(user_not_found)?;

        Ok(UserProfile::for_viewer(user, viewer))
    }

    #[instrument(skip(state, dto))]
    pub async fn update_user(
        state: &AppState,
        id: UserId,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let mut changes = UserChanges::from(dto);
        changes.username = changes.username.map(|u| u.trim().to_string());

        let user = state
            .storage
            .users
            .update(id, changes)
            .await?
            .ok_or_else(user_not_found)?;

        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    #[instrument(skip(state))]
    pub async fn delete_user(state: &AppState, id: UserId) -> Result<(), AppError> {
        // TODO: remove the cover image files of the posts deleted with the account
        if !state.storage.users.delete(id).await? {
            return Err(user_not_found());
        }

        info!(user_id = %id, "User deleted");
        Ok(())
    }

    #[instrument(skip(state, actor))]
    pub async fn set_status(
        state: &AppState,
        actor: &User,
        id: UserId,
        is_active: bool,
    ) -> Result<User, AppError> {
        if actor.id == id && !is_active {
            return Err(AppError::bad_request("You cannot deactivate your own account"));
        }

        let user = state
            .storage
            .users
            .set_active(id, is_active)
            .await?
            .ok_or_else(user_not_found)?;

        info!(user_id = %user.id, is_active, admin_id = %actor.id, "User status changed");
        Ok(user)
    }

    #[instrument(skip(state, actor))]
    pub async fn set_role(
        state: &AppState,
        actor: &User,
        id: UserId,
        role: Role,
    ) -> Result<User, AppError> {
        if actor.id == id && role != Role::Admin {
            return Err(AppError::bad_request("You cannot remove your own admin role"));
        }

        let user = state
            .storage
            .users
            .set_role(id, role)
            .await?
            .ok_or_else(user_not_found)?;

        info!(user_id = %user.id, role = %role, admin_id = %actor.id, "User role changed");
        Ok(user)
    }
}

fn user_not_found() -> AppError {
    AppError::not_found("User not found")
}
