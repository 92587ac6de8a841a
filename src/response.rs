//! Success envelopes: `{"data": ...}` for one record, `{"data": [...], "meta": {"count": n}}` for lists.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Serialize)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    pub meta: ListMeta,
}

#[derive(Serialize)]
pub struct ListMeta {
    pub count: usize,
}

pub type Reply<T> = (StatusCode, Json<Envelope<T>>);

pub fn created<T: Serialize>(data: T) -> Reply<T> {
    (StatusCode::CREATED, Json(Envelope { data }))
}

pub fn ok<T: Serialize>(data: T) -> Reply<T> {
    (StatusCode::OK, Json(Envelope { data }))
}

pub fn listed<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<ListEnvelope<T>>) {
    let meta = ListMeta { count: data.len() };
    (StatusCode::OK, Json(ListEnvelope { data, meta }))
}
