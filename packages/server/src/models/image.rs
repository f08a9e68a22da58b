use serde::Deserialize;

pub use super::plant::PlantImageResponse;

pub const CAPTION_MAX_CHARS: usize = 200;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateImageRequest {
    #[schema(example = "Spathe in bloom")]
    pub caption: String,
}
