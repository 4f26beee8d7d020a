use serde::Serialize;

/// `{ "data": T }` envelope for single-entity and reorder responses.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        DataResponse { data }
    }
}
