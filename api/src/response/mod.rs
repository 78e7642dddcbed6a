use serde::Serialize;

/// Envelope for every JSON body the API returns.
///
/// ```json
/// { "success": true, "data": { ... }, "message": "Session started" }
/// ```
///
/// Error bodies carry `T::default()` as `data`.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }
}

/// `data` of bodies that carry nothing.
#[derive(Serialize, Default)]
pub struct Empty {}
