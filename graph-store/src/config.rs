/// Connection settings for the graph database.
///
/// Built by the caller (the API layer reads them from the environment) and
/// handed to [`crate::GraphClient::connect`]; this crate never touches
/// process state itself.
#[derive(Clone, Debug)]
pub struct GraphConfig {
    /// Bolt URI, e.g. `neo4j://localhost:7687`.
    pub uri: String,
    pub user: String,
    pub password: String,
}
