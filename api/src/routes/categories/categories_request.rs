use graph_store::model::LocalizedString;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct ListCategoriesParams {
    /// Base language code of the titles to return; defaults to `en`.
    pub language: Option<String>,
    pub parent_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub title: LocalizedString,
    #[serde(default)]
    pub parent: Option<String>,
}
