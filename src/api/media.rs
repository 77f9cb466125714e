use serde_json::{json, Value};

use super::models::Moodboard;
use super::{ApiRequest, HttpClient};
use crate::error::Result;

impl HttpClient {
    pub async fn moodboards(&self) -> Result<Vec<Moodboard>> {
        self.send(ApiRequest::get("/api/media/moodboard")).await
    }

    pub async fn moodboard(&self, board_id: i64) -> Result<Moodboard> {
        self.send(ApiRequest::get(format!("/api/media/moodboard/{board_id}")))
            .await
    }

    /// Images are data URLs, as produced by the photo picker.
    pub async fn create_moodboard(&self, title: &str, images: &[String], language: &str) -> Result<Moodboard> {
        self.send(ApiRequest::post("/api/media/create-moodboard").json(&json!({
            "title": title,
            "images": images,
            "language": language,
        })))
        .await
    }

    pub async fn extract_colors(&self, image: &str) -> Result<Value> {
        self.call(ApiRequest::post("/api/media/extract-colors").json(&json!({ "image": image })))
            .await
    }

    /// Speech-to-text upload; the audio goes as multipart.
    pub async fn speech_to_text(&self, audio: Vec<u8>, file_name: &str) -> Result<Value> {
        let part = reqwest::multipart::Part::bytes(audio).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        self.call(ApiRequest::post("/api/voice/stt").multipart(form))
            .await
    }
}
