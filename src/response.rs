use serde::Serialize;

/// `{ "success": true, "data": ... }`
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Data<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// `{ "success": true, "count": n, "data": [...] }`
#[derive(Debug, Serialize)]
pub struct List<T> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> List<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

/// `{ "success": true, "token": ... }`
#[derive(Debug, Serialize)]
pub struct TokenIssued {
    pub success: bool,
    pub token: String,
}
