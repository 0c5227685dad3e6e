use serde::Deserialize;

#[derive(Deserialize)]
pub struct ListPersonsParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
