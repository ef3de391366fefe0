use inkwell_core::AppError;
use inkwell_models::{Category, CategoryId, CreateCategoryDto, UpdateCategoryDto};
use tracing::{info, instrument};

use crate::state::AppState;

pub struct CategoryService;

impl CategoryService {
    #[instrument(skip(state))]
    pub async fn list_categories(state: &AppState) -> Result<Vec<Category>, AppError> {
        Ok(state.storage.categories.list().await?)
    }

    #[instrument(skip(state))]
    pub async fn get_category(state: &AppState, id: CategoryId) -> Result<Category, AppError> {
        state
            .storage
            .categories
            .find_by_id(id)
            .await?
            .ok_or_else(category_not_found)
    }

    #[instrument(skip(state, dto), fields(name = %dto.name))]
    pub async fn create_category(
        state: &AppState,
        mut dto: CreateCategoryDto,
    ) -> Result<Category, AppError> {
        dto.name = dto.name.trim().to_string();
        let category = state.storage.categories.create(dto).await?;

        info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    #[instrument(skip(state, dto))]
    pub async fn update_category(
        state: &AppState,
        id: CategoryId,
        mut dto: UpdateCategoryDto,
    ) -> Result<Category, AppError> {
        dto.name = dto.name.map(|n| n.trim().to_string());
        let category = state
            .storage
            .categories
            .update(id, dto)
            .await?
            .ok_or_else(category_not_found)?;

        info!(category_id = %category.id, "Category updated");
        Ok(category)
    }

    /// Posts in the category are kept and become uncategorized.
    #[instrument(skip(state))]
    pub async fn delete_category(state: &AppState, id: CategoryId) -> Result<(), AppError> {
        if !state.storage.categories.delete(id).await? {
            return Err(category_not_found());
        }

        info!(category_id = %id, "Category deleted");
        Ok(())
    }
}

fn category_not_found() -> AppError {
    AppError::not_found("Category not found")
}
