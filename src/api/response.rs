use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

fn json_response<T: Serialize>(status: StatusCode, data: T, total_count: Option<usize>) -> Response {
    let json = match serde_json::to_string(&ApiResponse { data }) {
        Ok(json) => json,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(count) = total_count {
        headers.insert("X-Total-Count", HeaderValue::from(count));
    }

    (status, headers, json).into_response()
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        json_response(StatusCode::OK, self.data, None)
    }
}

pub fn with_status<T: Serialize>(status: StatusCode, data: T) -> Response {
    json_response(status, data, None)
}

pub fn with_total_count<T: Serialize>(data: T, count: usize) -> Response {
    json_response(StatusCode::OK, data, Some(count))
}
