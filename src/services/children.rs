use crate::{
    db::Store,
    error::AppError,
    models::{
        child::{Child, CreateChildRequest, TokenBalance},
        completion::CompletionSummary,
    },
};

pub struct ChildService;

impl ChildService {
    pub async fn create(store: &dyn Store, req: &CreateChildRequest) -> Result<Child, AppError> {
        req.validate()?;
        Ok(store.create_child(req).await?)
    }

    pub async fn get(store: &dyn Store, id: i64) -> Result<Child, AppError> {
        store
            .get_child(id)
            .await?
            .ok_or_else(|| AppError::not_found("Child not found"))
    }

    pub async fn tokens(store: &dyn Store, id: i64) -> Result<TokenBalance, AppError> {
        let child = Self::get(store, id).await?;
        Ok(TokenBalance::from(&child))
    }

    pub async fn completions(
        store: &dyn Store,
        id: i64,
    ) -> Result<Vec<CompletionSummary>, AppError> {
        let child = Self::get(store, id).await?;
        Ok(store.list_completions(child.id).await?)
    }
}
