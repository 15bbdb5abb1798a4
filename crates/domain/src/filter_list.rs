/// One filter list: an identifier plus the raw rule text.
///
/// Whether a line blocks or allowlists is a property of the rule syntax
/// (`@@` prefix), not of the list that carries it.
#[derive(Debug, Clone)]
pub struct FilterList {
    pub id: i64,
    pub data: String,
}

impl FilterList {
    pub fn new(id: i64, data: impl Into<String>) -> Self {
        Self {
            id,
            data: data.into(),
        }
    }
}
